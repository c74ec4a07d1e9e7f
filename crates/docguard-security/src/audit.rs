// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Issuance audit trail — append-only SQLite log of every generation-pipeline
// stage outcome.
//
// Schema:
//   issuance_audit(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp     TEXT    NOT NULL,   -- RFC 3339
//     document_id   TEXT    NOT NULL,   -- pipeline run / document UUID
//     document_type TEXT    NOT NULL,   -- catalogue code, e.g. "PASSPORT"
//     stage         TEXT    NOT NULL,   -- e.g. "validating", "signing"
//     document_hash TEXT,               -- SHA-256 hex, once known
//     success       INTEGER NOT NULL,   -- 0 = failure, 1 = success
//     details       TEXT                -- optional free-form context
//   )

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use docguard_core::error::DocguardError;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS issuance_audit (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp     TEXT    NOT NULL,
        document_id   TEXT    NOT NULL,
        document_type TEXT    NOT NULL,
        stage         TEXT    NOT NULL,
        document_hash TEXT,
        success       INTEGER NOT NULL,
        details       TEXT
    );
    CREATE INDEX IF NOT EXISTS issuance_audit_document ON issuance_audit(document_id);";

/// Convert a `rusqlite::Error` into a `DocguardError::Database`.
fn db_err(e: rusqlite::Error) -> DocguardError {
    DocguardError::Database(e.to_string())
}

/// A single stored audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub document_id: String,
    pub document_type: String,
    pub stage: String,
    pub document_hash: Option<String>,
    pub success: bool,
    pub details: Option<String>,
}

/// What the pipeline hands to [`IssuanceAudit::record`].
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    pub document_id: &'a str,
    pub document_type: &'a str,
    pub stage: &'a str,
    pub document_hash: Option<&'a str>,
    pub success: bool,
    pub details: Option<&'a str>,
}

/// Append-only issuance log backed by SQLite.
///
/// The connection sits behind a mutex so one log can be shared by every
/// pipeline task; each call is a single short statement.
pub struct IssuanceAudit {
    conn: Mutex<Connection>,
}

impl IssuanceAudit {
    /// Open (or create) the audit database at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocguardError> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;
        debug!("issuance audit opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, DocguardError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DocguardError> {
        self.conn
            .lock()
            .map_err(|_| DocguardError::Database("issuance audit lock poisoned".into()))
    }

    /// Append one entry.
    #[instrument(skip(self, event), fields(document_id = event.document_id, stage = event.stage, success = event.success))]
    pub fn record(&self, event: AuditEvent<'_>) -> Result<(), DocguardError> {
        let timestamp = Utc::now().to_rfc3339();
        self.lock()?
            .execute(
                "INSERT INTO issuance_audit
                    (timestamp, document_id, document_type, stage, document_hash, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    timestamp,
                    event.document_id,
                    event.document_type,
                    event.stage,
                    event.document_hash,
                    i32::from(event.success),
                    event.details
                ],
            )
            .map_err(db_err)?;
        debug!("audit entry recorded");
        Ok(())
    }

    /// Every entry for one document, in insertion order.
    pub fn entries_for_document(&self, document_id: &str) -> Result<Vec<AuditEntry>, DocguardError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, document_id, document_type, stage, document_hash, success, details
                 FROM issuance_audit
                 WHERE document_id = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![document_id], row_to_entry)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, DocguardError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, document_id, document_type, stage, document_hash, success, details
                 FROM issuance_audit
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit], row_to_entry)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    /// Total number of entries.
    pub fn count(&self) -> Result<u64, DocguardError> {
        self.lock()?
            .query_row("SELECT COUNT(*) FROM issuance_audit", [], |row| row.get(0))
            .map_err(db_err)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        document_id: row.get(2)?,
        document_type: row.get(3)?,
        stage: row.get(4)?,
        document_hash: row.get(5)?,
        success: row.get::<_, i32>(6)? != 0,
        details: row.get(7)?,
    })
}
