// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory verification store. Same semantics as the SQLite store, no
// persistence; used by tests and by embedders that keep records elsewhere.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docguard_core::error::{DocguardError, Result};
use docguard_core::{RecordId, VerificationAttempt, VerificationRecord};

use super::{InsertOutcome, RevokeOutcome, VerificationStore};

#[derive(Default)]
struct Inner {
    records: HashMap<RecordId, VerificationRecord>,
    by_code: HashMap<String, RecordId>,
    by_hash: HashMap<String, RecordId>,
    attempts: Vec<VerificationAttempt>,
}

/// Thread-safe in-memory store. Every operation holds one lock for its
/// whole duration, so increments and revocations never interleave.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| DocguardError::Database("memory store lock poisoned".into()))
    }
}

impl Inner {
    fn record(&self, index: &HashMap<String, RecordId>, key: &str) -> Option<VerificationRecord> {
        index.get(key).and_then(|id| self.records.get(id)).cloned()
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn create_record(&self, record: &VerificationRecord) -> Result<InsertOutcome> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.record(&inner.by_hash, &record.document_hash) {
            return Ok(InsertOutcome::AlreadyExists(existing));
        }
        if inner.by_code.contains_key(&record.verification_code) {
            return Err(DocguardError::Database(format!(
                "verification code {} already in use",
                record.verification_code
            )));
        }
        inner.by_code.insert(record.verification_code.clone(), record.id);
        inner.by_hash.insert(record.document_hash.clone(), record.id);
        inner.records.insert(record.id, record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<VerificationRecord>> {
        let inner = self.lock()?;
        Ok(inner.record(&inner.by_code, code))
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<VerificationRecord>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn get_by_hash(&self, document_hash: &str) -> Result<Option<VerificationRecord>> {
        let inner = self.lock()?;
        Ok(inner.record(&inner.by_hash, document_hash))
    }

    async fn record_successful_verification(
        &self,
        id: RecordId,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>> {
        let mut inner = self.lock()?;
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(None);
        };
        if !record.is_active || record.expiry_date.is_some_and(|expiry| expiry < now) {
            return Ok(None);
        }
        record.verification_count += 1;
        record.last_verified_at = Some(now);
        Ok(Some(record.clone()))
    }

    async fn revoke(&self, id: RecordId, reason: &str, at: DateTime<Utc>) -> Result<RevokeOutcome> {
        let mut inner = self.lock()?;
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(RevokeOutcome::NotFound);
        };
        if !record.is_active {
            return Ok(RevokeOutcome::AlreadyRevoked);
        }
        record.is_active = false;
        record.revoked_at = Some(at);
        record.revocation_reason = Some(reason.to_owned());
        Ok(RevokeOutcome::Revoked)
    }

    async fn set_authenticity_score(&self, id: RecordId, score: f64) -> Result<()> {
        let mut inner = self.lock()?;
        match inner.records.get_mut(&id) {
            Some(record) => {
                record.ai_authenticity_score = Some(score);
                Ok(())
            }
            None => Err(DocguardError::Database(format!("record {id} not found"))),
        }
    }

    async fn append_attempt(&self, attempt: &VerificationAttempt) -> Result<()> {
        self.lock()?.attempts.push(attempt.clone());
        Ok(())
    }

    async fn attempts_for_code(&self, code: &str) -> Result<Vec<VerificationAttempt>> {
        Ok(self
            .lock()?
            .attempts
            .iter()
            .filter(|a| a.verification_code == code)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_record;
    use chrono::Duration;

    #[tokio::test]
    async fn insert_is_idempotent_on_hash() {
        let store = MemoryStore::new();
        let record = sample_record("AAAAAAAAAAAA", "h1");
        assert_eq!(store.create_record(&record).await.unwrap(), InsertOutcome::Inserted);

        let again = sample_record("BBBBBBBBBBBB", "h1");
        match store.create_record(&again).await.unwrap() {
            InsertOutcome::AlreadyExists(existing) => assert_eq!(existing.verification_code, "AAAAAAAAAAAA"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(store.get_by_code("BBBBBBBBBBBB").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_code_with_new_hash_is_an_error() {
        let store = MemoryStore::new();
        store.create_record(&sample_record("AAAAAAAAAAAA", "h1")).await.unwrap();
        assert!(store.create_record(&sample_record("AAAAAAAAAAAA", "h2")).await.is_err());
    }

    #[tokio::test]
    async fn increment_respects_expiry_and_revocation() {
        let store = MemoryStore::new();
        let record = sample_record("AAAAAAAAAAAA", "h1");
        store.create_record(&record).await.unwrap();
        let now = Utc::now();

        let updated = store.record_successful_verification(record.id, now).await.unwrap().unwrap();
        assert_eq!(updated.verification_count, 1);
        assert_eq!(updated.last_verified_at, Some(now));

        let past_expiry = record.expiry_date.unwrap() + Duration::seconds(1);
        assert!(store.record_successful_verification(record.id, past_expiry).await.unwrap().is_none());

        assert_eq!(store.revoke(record.id, "lost", now).await.unwrap(), RevokeOutcome::Revoked);
        assert!(store.record_successful_verification(record.id, now).await.unwrap().is_none());
        assert_eq!(store.get_by_id(record.id).await.unwrap().unwrap().verification_count, 1);
    }
}
