use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{format_timestamp, parse_timestamp, DatabaseError};
use crate::models::*;

pub fn insert_job(conn: &Connection, job: &Job) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (id, document_ids, status, created_by, created_at, completed_at, summary, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            job.id,
            serde_json::to_string(&job.document_ids)?,
            job.status.as_str(),
            job.created_by,
            format_timestamp(&job.created_at),
            job.completed_at.as_ref().map(format_timestamp),
            job.summary,
            job.error,
        ],
    )?;
    Ok(())
}

pub fn get_job(conn: &Connection, id: &str) -> Result<Option<Job>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_ids, status, created_by, created_at, completed_at, summary, error
         FROM jobs WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id], |row| {
        Ok(JobRow {
            id: row.get(0)?,
            document_ids: row.get(1)?,
            status: row.get(2)?,
            created_by: row.get(3)?,
            created_at: row.get(4)?,
            completed_at: row.get(5)?,
            summary: row.get(6)?,
            error: row.get(7)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(job_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-set on the job status.
///
/// Returns `false` when the job was no longer in `from`, which is how a
/// cancellation racing a completion is resolved: whichever write lands
/// first wins and the other becomes a no-op.
pub fn transition_job(
    conn: &Connection,
    id: &str,
    from: JobStatus,
    to: JobStatus,
    summary: Option<&str>,
    error: Option<&str>,
) -> Result<bool, DatabaseError> {
    let completed_at: Option<DateTime<Utc>> = to.is_terminal().then(Utc::now);
    let changed = conn.execute(
        "UPDATE jobs SET status = ?3,
             completed_at = COALESCE(?4, completed_at),
             summary = COALESCE(?5, summary),
             error = COALESCE(?6, error)
         WHERE id = ?1 AND status = ?2",
        params![
            id,
            from.as_str(),
            to.as_str(),
            completed_at.as_ref().map(format_timestamp),
            summary,
            error,
        ],
    )?;
    Ok(changed == 1)
}

struct JobRow {
    id: String,
    document_ids: String,
    status: String,
    created_by: String,
    created_at: String,
    completed_at: Option<String>,
    summary: Option<String>,
    error: Option<String>,
}

fn job_from_row(row: JobRow) -> Result<Job, DatabaseError> {
    Ok(Job {
        id: row.id,
        document_ids: serde_json::from_str(&row.document_ids)?,
        status: JobStatus::from_str(&row.status)?,
        created_by: row.created_by,
        created_at: parse_timestamp(&row.created_at)?,
        completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
        summary: row.summary,
        error: row.error,
    })
}
