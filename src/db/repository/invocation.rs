use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{format_timestamp, parse_timestamp, DatabaseError};
use crate::models::*;

pub fn insert_invocation(conn: &Connection, inv: &AgentInvocation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO agent_invocations (id, job_id, agent_kind, document_ids, input_hash,
         started_at, finished_at, outcome, error_detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            inv.id,
            inv.job_id,
            inv.agent_kind.as_str(),
            serde_json::to_string(&inv.document_ids)?,
            inv.input_hash,
            format_timestamp(&inv.started_at),
            inv.finished_at.as_ref().map(format_timestamp),
            inv.outcome.as_str(),
            inv.error_detail,
        ],
    )?;
    Ok(())
}

/// Record how an invocation ended. Only rows still `running` are touched.
pub fn finish_invocation(
    conn: &Connection,
    id: &str,
    outcome: InvocationOutcome,
    input_hash: Option<&str>,
    error_detail: Option<&str>,
    finished_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE agent_invocations
         SET outcome = ?2, input_hash = COALESCE(?3, input_hash), error_detail = ?4, finished_at = ?5
         WHERE id = ?1 AND outcome = 'running'",
        params![
            id,
            outcome.as_str(),
            input_hash,
            error_detail,
            format_timestamp(&finished_at),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "running agent_invocation".into(),
            id: id.into(),
        });
    }
    Ok(())
}

pub fn list_invocations(conn: &Connection, job_id: &str) -> Result<Vec<AgentInvocation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, agent_kind, document_ids, input_hash, started_at, finished_at,
         outcome, error_detail
         FROM agent_invocations WHERE job_id = ?1 ORDER BY started_at, rowid",
    )?;
    let rows = stmt
        .query_map(params![job_id], |row| {
            Ok(InvocationRow {
                id: row.get(0)?,
                job_id: row.get(1)?,
                agent_kind: row.get(2)?,
                document_ids: row.get(3)?,
                input_hash: row.get(4)?,
                started_at: row.get(5)?,
                finished_at: row.get(6)?,
                outcome: row.get(7)?,
                error_detail: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(invocation_from_row).collect()
}

struct InvocationRow {
    id: String,
    job_id: String,
    agent_kind: String,
    document_ids: String,
    input_hash: Option<String>,
    started_at: String,
    finished_at: Option<String>,
    outcome: String,
    error_detail: Option<String>,
}

fn invocation_from_row(row: InvocationRow) -> Result<AgentInvocation, DatabaseError> {
    Ok(AgentInvocation {
        id: row.id,
        job_id: row.job_id,
        agent_kind: AgentKind::from_str(&row.agent_kind)?,
        document_ids: serde_json::from_str(&row.document_ids)?,
        input_hash: row.input_hash,
        started_at: parse_timestamp(&row.started_at)?,
        finished_at: row.finished_at.as_deref().map(parse_timestamp).transpose()?,
        outcome: InvocationOutcome::from_str(&row.outcome)?,
        error_detail: row.error_detail,
    })
}
