// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite verification store.
//
// Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`),
// so string comparison in SQL orders them chronologically. The counter
// increment is one conditional UPDATE; concurrent verifications of the same
// code cannot lose increments even across processes sharing the file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use docguard_core::error::{DocguardError, Result};
use docguard_core::{DocumentType, RecordId, VerificationAttempt, VerificationOutcome, VerificationRecord};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use super::{InsertOutcome, RevokeOutcome, VerificationStore};

const CREATE_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS verification_records (
        id                    TEXT PRIMARY KEY,
        verification_code     TEXT NOT NULL UNIQUE,
        document_hash         TEXT NOT NULL UNIQUE,
        document_type         TEXT NOT NULL,
        document_number       TEXT NOT NULL,
        document_data         TEXT NOT NULL,
        issuing_office        TEXT NOT NULL,
        issuing_officer       TEXT NOT NULL,
        is_active             INTEGER NOT NULL DEFAULT 1,
        verification_count    INTEGER NOT NULL DEFAULT 0,
        issued_at             TEXT NOT NULL,
        expiry_date           TEXT,
        last_verified_at      TEXT,
        revoked_at            TEXT,
        revocation_reason     TEXT,
        hashtags              TEXT NOT NULL DEFAULT '[]',
        ai_authenticity_score REAL
    );
    CREATE TABLE IF NOT EXISTS verification_attempts (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        verification_code TEXT NOT NULL,
        timestamp         TEXT NOT NULL,
        source_ip         TEXT,
        user_agent        TEXT,
        location          TEXT,
        outcome           TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS verification_attempts_code ON verification_attempts(verification_code);";

const RECORD_COLUMNS: &str = "id, verification_code, document_hash, document_type, document_number,
    document_data, issuing_office, issuing_officer, is_active, verification_count, issued_at,
    expiry_date, last_verified_at, revoked_at, revocation_reason, hashtags, ai_authenticity_score";

fn db_err(e: rusqlite::Error) -> DocguardError {
    DocguardError::Database(e.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Verification store backed by one SQLite connection.
///
/// Calls run on the blocking pool; the connection sits behind a mutex so
/// each statement has it to itself.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(db_err)?;
        conn.pragma_update(None, "journal_mode", "WAL").map_err(db_err)?;
        conn.execute_batch(CREATE_TABLES_SQL).map_err(db_err)?;
        info!("verification store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLES_SQL).map_err(db_err)?;
        debug!("in-memory verification store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| DocguardError::Database("verification store lock poisoned".into()))?;
            f(&conn)
        })
        .await
        .map_err(|e| DocguardError::Database(format!("store task failed: {e}")))?
    }
}

fn select_one(conn: &Connection, column: &str, value: &str) -> Result<Option<VerificationRecord>> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM verification_records WHERE {column} = ?1"),
        params![value],
        row_to_record,
    )
    .optional()
    .map_err(db_err)
}

#[async_trait]
impl VerificationStore for SqliteStore {
    #[instrument(skip_all, fields(code = %record.verification_code))]
    async fn create_record(&self, record: &VerificationRecord) -> Result<InsertOutcome> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let data = serde_json::to_string(&record.document_data)?;
            let hashtags = serde_json::to_string(&record.hashtags)?;
            let inserted = conn
                .execute(
                    "INSERT INTO verification_records (
                        id, verification_code, document_hash, document_type, document_number,
                        document_data, issuing_office, issuing_officer, is_active, verification_count,
                        issued_at, expiry_date, last_verified_at, revoked_at, revocation_reason,
                        hashtags, ai_authenticity_score)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                     ON CONFLICT(document_hash) DO NOTHING",
                    params![
                        record.id.to_string(),
                        record.verification_code,
                        record.document_hash,
                        record.document_type.code(),
                        record.document_number,
                        data,
                        record.issuing_office,
                        record.issuing_officer,
                        i32::from(record.is_active),
                        record.verification_count as i64,
                        timestamp(record.issued_at),
                        record.expiry_date.map(timestamp),
                        record.last_verified_at.map(timestamp),
                        record.revoked_at.map(timestamp),
                        record.revocation_reason,
                        hashtags,
                        record.ai_authenticity_score,
                    ],
                )
                .map_err(db_err)?;

            if inserted == 1 {
                debug!("verification record inserted");
                return Ok(InsertOutcome::Inserted);
            }
            select_one(conn, "document_hash", &record.document_hash)?
                .map(InsertOutcome::AlreadyExists)
                .ok_or_else(|| DocguardError::Database("insert ignored but no record holds the hash".into()))
        })
        .await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<VerificationRecord>> {
        let code = code.to_owned();
        self.with_conn(move |conn| select_one(conn, "verification_code", &code)).await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<VerificationRecord>> {
        self.with_conn(move |conn| select_one(conn, "id", &id.to_string())).await
    }

    async fn get_by_hash(&self, document_hash: &str) -> Result<Option<VerificationRecord>> {
        let hash = document_hash.to_owned();
        self.with_conn(move |conn| select_one(conn, "document_hash", &hash)).await
    }

    #[instrument(skip(self), fields(record_id = %id))]
    async fn record_successful_verification(
        &self,
        id: RecordId,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>> {
        self.with_conn(move |conn| {
            let at = timestamp(now);
            let updated = conn
                .execute(
                    "UPDATE verification_records
                     SET verification_count = verification_count + 1, last_verified_at = ?2
                     WHERE id = ?1 AND is_active = 1 AND (expiry_date IS NULL OR expiry_date >= ?2)",
                    params![id.to_string(), at],
                )
                .map_err(db_err)?;
            if updated == 0 {
                return Ok(None);
            }
            select_one(conn, "id", &id.to_string())
        })
        .await
    }

    #[instrument(skip(self, reason), fields(record_id = %id))]
    async fn revoke(&self, id: RecordId, reason: &str, at: DateTime<Utc>) -> Result<RevokeOutcome> {
        let reason = reason.to_owned();
        self.with_conn(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE verification_records
                     SET is_active = 0, revoked_at = ?2, revocation_reason = ?3
                     WHERE id = ?1 AND is_active = 1",
                    params![id.to_string(), timestamp(at), reason],
                )
                .map_err(db_err)?;
            if updated == 1 {
                info!("verification record revoked");
                return Ok(RevokeOutcome::Revoked);
            }
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM verification_records WHERE id = ?1",
                    params![id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?;
            Ok(if exists.is_some() {
                RevokeOutcome::AlreadyRevoked
            } else {
                RevokeOutcome::NotFound
            })
        })
        .await
    }

    async fn set_authenticity_score(&self, id: RecordId, score: f64) -> Result<()> {
        self.with_conn(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE verification_records SET ai_authenticity_score = ?2 WHERE id = ?1",
                    params![id.to_string(), score],
                )
                .map_err(db_err)?;
            if updated == 0 {
                return Err(DocguardError::Database(format!("record {id} not found")));
            }
            Ok(())
        })
        .await
    }

    async fn append_attempt(&self, attempt: &VerificationAttempt) -> Result<()> {
        let attempt = attempt.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO verification_attempts
                    (verification_code, timestamp, source_ip, user_agent, location, outcome)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    attempt.verification_code,
                    timestamp(attempt.timestamp),
                    attempt.source_ip.map(|ip| ip.to_string()),
                    attempt.user_agent,
                    attempt.location,
                    attempt.outcome.as_str(),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })
        .await
    }

    async fn attempts_for_code(&self, code: &str) -> Result<Vec<VerificationAttempt>> {
        let code = code.to_owned();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT verification_code, timestamp, source_ip, user_agent, location, outcome
                     FROM verification_attempts
                     WHERE verification_code = ?1
                     ORDER BY id ASC",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![code], row_to_attempt)
                .map_err(db_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_err)?;
            Ok(rows)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn parse_time(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(column, e))
}

fn parse_optional_time(column: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_time(column, &v)).transpose()
}

/// Column indices follow [`RECORD_COLUMNS`].
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerificationRecord> {
    let id: String = row.get(0)?;
    let document_type: String = row.get(3)?;
    let data: String = row.get(5)?;
    let issued_at: String = row.get(10)?;
    let hashtags: String = row.get(15)?;

    Ok(VerificationRecord {
        id: RecordId(uuid::Uuid::parse_str(&id).map_err(|e| conversion(0, e))?),
        verification_code: row.get(1)?,
        document_hash: row.get(2)?,
        document_type: DocumentType::from_code(&document_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown document type {document_type}").into(),
            )
        })?,
        document_number: row.get(4)?,
        document_data: serde_json::from_str(&data).map_err(|e| conversion(5, e))?,
        issuing_office: row.get(6)?,
        issuing_officer: row.get(7)?,
        is_active: row.get::<_, i32>(8)? != 0,
        verification_count: row.get::<_, i64>(9)? as u64,
        issued_at: parse_time(10, &issued_at)?,
        expiry_date: parse_optional_time(11, row.get(11)?)?,
        last_verified_at: parse_optional_time(12, row.get(12)?)?,
        revoked_at: parse_optional_time(13, row.get(13)?)?,
        revocation_reason: row.get(14)?,
        hashtags: serde_json::from_str(&hashtags).map_err(|e| conversion(15, e))?,
        ai_authenticity_score: row.get(16)?,
    })
}

fn row_to_attempt(row: &rusqlite::Row<'_>) -> rusqlite::Result<VerificationAttempt> {
    let at: String = row.get(1)?;
    let source_ip: Option<String> = row.get(2)?;
    let outcome: String = row.get(5)?;
    Ok(VerificationAttempt {
        verification_code: row.get(0)?,
        timestamp: parse_time(1, &at)?,
        source_ip: source_ip.and_then(|ip| ip.parse().ok()),
        user_agent: row.get(3)?,
        location: row.get(4)?,
        outcome: VerificationOutcome::parse(&outcome).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, format!("unknown outcome {outcome}").into())
        })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_record;
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn record_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut record = sample_record("ABCDEF012345", "h1");
        record.ai_authenticity_score = Some(0.75);
        assert_eq!(store.create_record(&record).await.unwrap(), InsertOutcome::Inserted);

        assert_eq!(store.get_by_code("ABCDEF012345").await.unwrap(), Some(record.clone()));
        assert_eq!(store.get_by_id(record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(store.get_by_hash("h1").await.unwrap(), Some(record));
        assert!(store.get_by_code("000000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_hash() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = sample_record("AAAAAAAAAAAA", "h1");
        store.create_record(&first).await.unwrap();
        match store.create_record(&sample_record("BBBBBBBBBBBB", "h1")).await.unwrap() {
            InsertOutcome::AlreadyExists(existing) => assert_eq!(existing.id, first.id),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(store.create_record(&sample_record("AAAAAAAAAAAA", "h2")).await.is_err());
    }

    #[tokio::test]
    async fn increment_is_conditional() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_record("AAAAAAAAAAAA", "h1");
        store.create_record(&record).await.unwrap();
        let now = Utc::now();

        let updated = store.record_successful_verification(record.id, now).await.unwrap().unwrap();
        assert_eq!(updated.verification_count, 1);
        assert!(updated.last_verified_at.is_some());

        let after_expiry = record.expiry_date.unwrap() + chrono::Duration::microseconds(1);
        assert!(store.record_successful_verification(record.id, after_expiry).await.unwrap().is_none());

        assert_eq!(store.revoke(record.id, "stolen", now).await.unwrap(), RevokeOutcome::Revoked);
        assert_eq!(store.revoke(record.id, "again", now).await.unwrap(), RevokeOutcome::AlreadyRevoked);
        assert_eq!(store.revoke(RecordId::new(), "x", now).await.unwrap(), RevokeOutcome::NotFound);
        assert!(store.record_successful_verification(record.id, now).await.unwrap().is_none());

        let stored = store.get_by_id(record.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.verification_count, 1);
        assert_eq!(stored.revocation_reason.as_deref(), Some("stolen"));
    }

    #[tokio::test]
    async fn attempts_are_appended_in_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        for outcome in [VerificationOutcome::NotFound, VerificationOutcome::Success] {
            store
                .append_attempt(&VerificationAttempt {
                    verification_code: "AAAAAAAAAAAA".into(),
                    timestamp: Utc::now(),
                    source_ip: Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))),
                    user_agent: Some("scanner/1.0".into()),
                    location: None,
                    outcome,
                })
                .await
                .unwrap();
        }
        let attempts = store.attempts_for_code("AAAAAAAAAAAA").await.unwrap();
        assert_eq!(
            attempts.iter().map(|a| a.outcome).collect::<Vec<_>>(),
            vec![VerificationOutcome::NotFound, VerificationOutcome::Success]
        );
        assert_eq!(attempts[0].source_ip, Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))));
        assert!(store.attempts_for_code("BBBBBBBBBBBB").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.db");
        let record = sample_record("AAAAAAAAAAAA", "h1");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_record(&record).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_by_code("AAAAAAAAAAAA").await.unwrap(), Some(record));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_connections_do_not_lose_increments() {
        const CONNECTIONS: usize = 4;
        const PER_CONNECTION: usize = 25;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.db");
        let record = sample_record("CCCCCCCCCCCC", "h1");
        let stores: Vec<Arc<SqliteStore>> = (0..CONNECTIONS)
            .map(|_| Arc::new(SqliteStore::open(&path).unwrap()))
            .collect();
        stores[0].create_record(&record).await.unwrap();

        let mut handles = Vec::new();
        for store in &stores {
            for _ in 0..PER_CONNECTION {
                let store = Arc::clone(store);
                let id = record.id;
                handles.push(tokio::spawn(async move {
                    store.record_successful_verification(id, Utc::now()).await
                }));
            }
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        let stored = stores[1].get_by_code("CCCCCCCCCCCC").await.unwrap().unwrap();
        assert_eq!(stored.verification_count, (CONNECTIONS * PER_CONNECTION) as u64);
    }
}
