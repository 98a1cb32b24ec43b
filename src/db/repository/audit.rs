use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{format_timestamp, parse_timestamp, DatabaseError};
use crate::models::*;

/// Append one entry. Returns the assigned id.
pub fn insert_audit_entry(
    conn: &Connection,
    entry: &NewAuditEntry,
    timestamp: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (job_id, agent_kind, action, input_hash, output_summary, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.job_id,
            entry.agent_kind.map(|k| k.as_str()),
            entry.action.as_str(),
            entry.input_hash,
            entry.output_summary,
            format_timestamp(&timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Timestamp of the most recent entry, if any.
pub fn latest_audit_timestamp(conn: &Connection) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    let raw: Option<String> = conn.query_row(
        "SELECT timestamp FROM audit_log ORDER BY id DESC LIMIT 1",
        [],
        |row| row.get(0),
    ).or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    })?;
    raw.as_deref().map(parse_timestamp).transpose()
}

/// The most recent `limit` entries matching `filter`, returned oldest first.
pub fn list_audit_entries(conn: &Connection, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, job_id, agent_kind, action, input_hash, output_summary, timestamp
         FROM audit_log
         WHERE (?1 IS NULL OR job_id = ?1)
           AND (?2 IS NULL OR agent_kind = ?2)
           AND (?3 IS NULL OR action = ?3)
         ORDER BY id DESC
         LIMIT ?4",
    )?;
    let rows = stmt
        .query_map(
            params![
                filter.job_id,
                filter.agent_kind.map(|k| k.as_str()),
                filter.action.map(|a| a.as_str()),
                filter.effective_limit(),
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .rev()
        .map(|(id, job_id, agent_kind, action, input_hash, output_summary, timestamp)| {
            Ok(AuditEntry {
                id,
                job_id,
                agent_kind: agent_kind.as_deref().map(AgentKind::from_str).transpose()?,
                action: AuditAction::from_str(&action)?,
                input_hash,
                output_summary,
                timestamp: parse_timestamp(&timestamp)?,
            })
        })
        .collect()
}
