use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::{format_timestamp, parse_timestamp, DatabaseError};
use crate::models::*;

const FINDING_COLUMNS: &str = "id, job_id, agent_kind, finding_type, title, description,
     evidence_quote, source_document, section_reference, confidence, severity, citations,
     metadata, review_status, flagged_for_review, reviewed_confidence, review_note,
     created_at, reviewed_at";

/// Insert a batch of findings atomically.
pub fn insert_findings(conn: &Connection, findings: &[Finding]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for f in findings {
        tx.execute(
            &format!(
                "INSERT INTO findings ({FINDING_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ),
            params![
                f.id,
                f.job_id,
                f.agent_kind.as_str(),
                f.finding_type,
                f.title,
                f.description,
                f.evidence_quote,
                f.source_document,
                f.section_reference,
                f.confidence,
                f.severity.as_str(),
                serde_json::to_string(&f.citations)?,
                serde_json::to_string(&f.metadata)?,
                f.review_status.as_str(),
                f.flagged_for_review as i32,
                f.reviewed_confidence,
                f.review_note,
                format_timestamp(&f.created_at),
                f.reviewed_at.as_ref().map(format_timestamp),
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_finding(conn: &Connection, id: &str) -> Result<Option<Finding>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {FINDING_COLUMNS} FROM findings WHERE id = ?1"))?;
    match stmt.query_row(params![id], read_row) {
        Ok(row) => Ok(Some(finding_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Findings matching every set field of `filter`, in insertion order.
pub fn list_findings(conn: &Connection, filter: &FindingFilter) -> Result<Vec<Finding>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FINDING_COLUMNS} FROM findings
         WHERE (?1 IS NULL OR job_id = ?1)
           AND (?2 IS NULL OR agent_kind = ?2)
           AND (?3 IS NULL OR severity = ?3)
           AND (?4 IS NULL OR review_status = ?4)
           AND (?5 IS NULL OR flagged_for_review = ?5)
         ORDER BY created_at, rowid"
    ))?;
    let rows = stmt
        .query_map(
            params![
                filter.job_id,
                filter.agent_kind.map(|k| k.as_str()),
                filter.severity.map(|s| s.as_str()),
                filter.review_status.map(|s| s.as_str()),
                filter.flagged.map(|b| b as i32),
            ],
            read_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(finding_from_row).collect()
}

/// Write the reviewer pass result. `confidence` and the evidence columns
/// are never part of an update.
pub fn apply_review(conn: &Connection, review: &ReviewedFinding, at: DateTime<Utc>) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE findings SET reviewed_confidence = ?2, flagged_for_review = ?3,
             review_status = ?4, review_note = ?5, reviewed_at = ?6
         WHERE id = ?1",
        params![
            review.finding_id,
            review.reviewed_confidence,
            review.flagged_for_review as i32,
            review.review_status.as_str(),
            review.review_note,
            format_timestamp(&at),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "finding".into(),
            id: review.finding_id.clone(),
        });
    }
    Ok(())
}

/// Record a human review decision.
pub fn set_review_status(
    conn: &Connection,
    id: &str,
    status: ReviewStatus,
    note: Option<&str>,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE findings SET review_status = ?2, review_note = COALESCE(?3, review_note), reviewed_at = ?4
         WHERE id = ?1",
        params![id, status.as_str(), note, format_timestamp(&at)],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "finding".into(),
            id: id.into(),
        });
    }
    Ok(())
}

struct FindingRow {
    id: String,
    job_id: String,
    agent_kind: String,
    finding_type: String,
    title: String,
    description: String,
    evidence_quote: String,
    source_document: String,
    section_reference: Option<String>,
    confidence: f64,
    severity: String,
    citations: String,
    metadata: String,
    review_status: String,
    flagged_for_review: i32,
    reviewed_confidence: Option<f64>,
    review_note: Option<String>,
    created_at: String,
    reviewed_at: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FindingRow> {
    Ok(FindingRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        agent_kind: row.get(2)?,
        finding_type: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        evidence_quote: row.get(6)?,
        source_document: row.get(7)?,
        section_reference: row.get(8)?,
        confidence: row.get(9)?,
        severity: row.get(10)?,
        citations: row.get(11)?,
        metadata: row.get(12)?,
        review_status: row.get(13)?,
        flagged_for_review: row.get(14)?,
        reviewed_confidence: row.get(15)?,
        review_note: row.get(16)?,
        created_at: row.get(17)?,
        reviewed_at: row.get(18)?,
    })
}

fn finding_from_row(row: FindingRow) -> Result<Finding, DatabaseError> {
    Ok(Finding {
        id: row.id,
        job_id: row.job_id,
        agent_kind: AgentKind::from_str(&row.agent_kind)?,
        finding_type: row.finding_type,
        title: row.title,
        description: row.description,
        evidence_quote: row.evidence_quote,
        source_document: row.source_document,
        section_reference: row.section_reference,
        confidence: row.confidence,
        severity: Severity::from_str(&row.severity)?,
        citations: serde_json::from_str(&row.citations)?,
        metadata: serde_json::from_str(&row.metadata)?,
        review_status: ReviewStatus::from_str(&row.review_status)?,
        flagged_for_review: row.flagged_for_review != 0,
        reviewed_confidence: row.reviewed_confidence,
        review_note: row.review_note,
        created_at: parse_timestamp(&row.created_at)?,
        reviewed_at: row.reviewed_at.as_deref().map(parse_timestamp).transpose()?,
    })
}
