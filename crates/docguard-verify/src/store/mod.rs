// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verification store contract.
//
// Records are created once, never deleted, and mutated only by the
// counter increment and the one-way revocation. Both mutations are single
// conditional updates inside the store; the service never reads a value,
// changes it and writes it back.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docguard_core::error::Result;
use docguard_core::{RecordId, VerificationAttempt, VerificationRecord};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result of [`VerificationStore::create_record`].
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same document hash exists; it is returned unchanged.
    AlreadyExists(VerificationRecord),
}

/// Result of [`VerificationStore::revoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    /// Already inactive; nothing was changed.
    AlreadyRevoked,
    NotFound,
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Insert a new record, keyed for idempotency on its document hash.
    async fn create_record(&self, record: &VerificationRecord) -> Result<InsertOutcome>;

    async fn get_by_code(&self, code: &str) -> Result<Option<VerificationRecord>>;

    async fn get_by_id(&self, id: RecordId) -> Result<Option<VerificationRecord>>;

    async fn get_by_hash(&self, document_hash: &str) -> Result<Option<VerificationRecord>>;

    /// Increment the counter and stamp `last_verified_at`, in one step and
    /// only while the record is active and not expired at `now`.
    ///
    /// Returns the updated record, or `None` when the conditions no longer
    /// hold (for example a revocation committed in between).
    async fn record_successful_verification(
        &self,
        id: RecordId,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>>;

    /// Deactivate a record. Terminal: there is no way back to active.
    async fn revoke(&self, id: RecordId, reason: &str, at: DateTime<Utc>) -> Result<RevokeOutcome>;

    /// Store an advisory authenticity score.
    async fn set_authenticity_score(&self, id: RecordId, score: f64) -> Result<()>;

    async fn append_attempt(&self, attempt: &VerificationAttempt) -> Result<()>;

    /// Attempts logged against `code`, oldest first.
    async fn attempts_for_code(&self, code: &str) -> Result<Vec<VerificationAttempt>>;
}
