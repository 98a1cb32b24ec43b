//! Audit Trail writer.
//!
//! Entries are write-once (the schema rejects UPDATE and DELETE on
//! `audit_log`). Timestamps never go backwards: a clock step back is
//! clamped to the latest recorded timestamp.

use chrono::Utc;

use crate::db::repository;
use crate::db::{Database, DatabaseError};
use crate::models::{AuditEntry, AuditFilter, NewAuditEntry};

#[derive(Clone)]
pub struct AuditTrail {
    db: Database,
}

impl AuditTrail {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one entry. Returns its id.
    pub fn record(&self, entry: NewAuditEntry) -> Result<i64, DatabaseError> {
        self.db.with_conn(|conn| {
            let now = Utc::now();
            let timestamp = match repository::latest_audit_timestamp(conn)? {
                Some(latest) if latest > now => latest,
                _ => now,
            };
            let id = repository::insert_audit_entry(conn, &entry, timestamp)?;
            tracing::debug!(
                audit_id = id,
                job_id = entry.job_id.as_deref().unwrap_or("-"),
                action = %entry.action,
                "Audit entry recorded"
            );
            Ok(id)
        })
    }

    pub fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        self.db.with_conn(|conn| repository::list_audit_entries(conn, filter))
    }
}
