// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verification service — registration, public lookup and revocation.
//
// `verify_document` is the public, untrusted-input boundary: it never
// returns an error. Every failure, including an unreachable store, becomes
// a negative `VerificationResult` and (where possible) a logged attempt.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use docguard_core::error::{DocguardError, Result};
use docguard_core::{
    AttemptContext, DocumentType, EngineConfig, RecordId, VerificationAttempt, VerificationOutcome,
    VerificationRecord, VerificationResult,
};
use docguard_security::{CodeGenerator, document_hash, normalise_code, verification_url};
use tracing::{debug, info, instrument, warn};

use crate::store::{InsertOutcome, RevokeOutcome, VerificationStore};

/// Longest raw code kept in the attempt log for unparseable input.
const MAX_LOGGED_CODE_LEN: usize = 64;

const MSG_NOT_FOUND: &str = "no document matches this verification code";
const MSG_INACTIVE: &str = "document has been revoked or expired";
const MSG_TAMPERED: &str = "document data does not match its registered hash";
const MSG_UNAVAILABLE: &str = "verification is temporarily unavailable";

/// External analyzer producing an advisory authenticity score in `0.0..=1.0`.
#[async_trait]
pub trait AuthenticityScorer: Send + Sync {
    async fn score(&self, record: &VerificationRecord) -> Result<f64>;
}

/// What a caller hands to [`VerificationService::register_document`].
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub document_type: DocumentType,
    pub document_number: String,
    /// The document's data as issued; hashed in canonical form.
    pub data: serde_json::Value,
    pub issued_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// Falls back to the configured office when `None`.
    pub issuing_office: Option<String>,
    pub issuing_officer: Option<String>,
}

/// Public identifiers of a registered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub record_id: RecordId,
    pub verification_code: String,
    pub document_hash: String,
    pub verification_url: String,
    /// `false` when an identical document was already registered.
    pub newly_created: bool,
}

/// Owns the verification-record lifecycle on top of a [`VerificationStore`].
///
/// Created once at start-up and shared by reference.
pub struct VerificationService {
    store: Arc<dyn VerificationStore>,
    codes: CodeGenerator,
    base_url: String,
    issuing_office: String,
    issuing_officer: String,
    scorer: Option<Arc<dyn AuthenticityScorer>>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn VerificationStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            codes: CodeGenerator::new(config.hmac_secret.as_bytes()),
            base_url: config.verification_base_url.clone(),
            issuing_office: config.issuing_office.clone(),
            issuing_officer: config.issuing_officer.clone(),
            scorer: None,
        }
    }

    /// Attach an authenticity scorer, consulted after each new registration.
    pub fn with_scorer(mut self, scorer: Arc<dyn AuthenticityScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn store(&self) -> &Arc<dyn VerificationStore> {
        &self.store
    }

    /// Create the verification record for a newly issued document.
    ///
    /// Idempotent on the document hash: registering identical data again
    /// returns the existing record's identifiers.
    #[instrument(skip_all, fields(document_type = %request.document_type))]
    pub async fn register_document(&self, request: RegistrationRequest) -> Result<Registration> {
        let hash = document_hash(&request.data)?;
        let code = self
            .codes
            .code_for(&request.data, request.document_type, request.issued_at)?;
        let issuing_office = request.issuing_office.unwrap_or_else(|| self.issuing_office.clone());
        let record = VerificationRecord {
            id: RecordId::new(),
            verification_code: code,
            document_hash: hash,
            document_type: request.document_type,
            document_number: request.document_number,
            document_data: request.data,
            hashtags: hashtags(request.document_type, request.issued_at, &issuing_office),
            issuing_office,
            issuing_officer: request.issuing_officer.unwrap_or_else(|| self.issuing_officer.clone()),
            is_active: true,
            verification_count: 0,
            issued_at: request.issued_at,
            expiry_date: request.expiry_date,
            last_verified_at: None,
            revoked_at: None,
            revocation_reason: None,
            ai_authenticity_score: None,
        };

        let outcome = self
            .store
            .create_record(&record)
            .await
            .map_err(|e| DocguardError::Registration(e.to_string()))?;

        let (stored, newly_created) = match outcome {
            InsertOutcome::Inserted => {
                info!(code = %record.verification_code, "document registered");
                self.score(&record).await;
                (record, true)
            }
            InsertOutcome::AlreadyExists(existing) => {
                debug!(code = %existing.verification_code, "document already registered");
                (existing, false)
            }
        };

        Ok(Registration {
            record_id: stored.id,
            verification_url: verification_url(&self.base_url, &stored.verification_code),
            verification_code: stored.verification_code,
            document_hash: stored.document_hash,
            newly_created,
        })
    }

    /// Ask the scorer, if any, and store its answer. Failures are logged only.
    async fn score(&self, record: &VerificationRecord) {
        let Some(scorer) = &self.scorer else {
            return;
        };
        match scorer.score(record).await {
            Ok(score) if score.is_finite() => {
                if let Err(e) = self
                    .store
                    .set_authenticity_score(record.id, score.clamp(0.0, 1.0))
                    .await
                {
                    warn!(error = %e, "failed to store authenticity score");
                }
            }
            Ok(score) => warn!(score, "authenticity scorer returned a non-finite score"),
            Err(e) => warn!(error = %e, "authenticity scorer failed"),
        }
    }

    /// Look up a code supplied by the public. Never fails.
    ///
    /// Only a lookup that finds the record active, unexpired and intact
    /// counts as a verification; every lookup is logged.
    #[instrument(skip_all)]
    pub async fn verify_document(&self, code: &str, context: &AttemptContext) -> VerificationResult {
        let now = Utc::now();
        let Some(code) = normalise_code(code) else {
            let logged: String = code.trim().chars().take(MAX_LOGGED_CODE_LEN).collect();
            self.log_attempt(&logged, now, context, VerificationOutcome::NotFound).await;
            return VerificationResult::rejected(VerificationOutcome::NotFound, 0, MSG_NOT_FOUND);
        };

        let (result, outcome) = self.evaluate(&code, now).await;
        self.log_attempt(&code, now, context, outcome).await;
        info!(%code, outcome = outcome.as_str(), count = result.verification_count, "verification lookup");
        result
    }

    async fn evaluate(&self, code: &str, now: DateTime<Utc>) -> (VerificationResult, VerificationOutcome) {
        let rejected = |outcome: VerificationOutcome, count: u64| {
            let message = match outcome {
                VerificationOutcome::NotFound => MSG_NOT_FOUND,
                VerificationOutcome::Tampered => MSG_TAMPERED,
                VerificationOutcome::Unavailable => MSG_UNAVAILABLE,
                _ => MSG_INACTIVE,
            };
            (VerificationResult::rejected(outcome, count, message), outcome)
        };

        let record = match self.store.get_by_code(code).await {
            Ok(Some(record)) => record,
            Ok(None) => return rejected(VerificationOutcome::NotFound, 0),
            Err(e) => {
                warn!(error = %e, "verification store unavailable");
                return rejected(VerificationOutcome::Unavailable, 0);
            }
        };

        if let Some(outcome) = inactive_outcome(&record, now) {
            return rejected(outcome, record.verification_count);
        }

        match document_hash(&record.document_data) {
            Ok(hash) if hash.eq_ignore_ascii_case(&record.document_hash) => {}
            Ok(_) => {
                warn!(%code, "stored document data no longer matches its hash");
                return rejected(VerificationOutcome::Tampered, record.verification_count);
            }
            Err(e) => {
                warn!(error = %e, "could not re-hash stored document data");
                return rejected(VerificationOutcome::Tampered, record.verification_count);
            }
        }

        match self.store.record_successful_verification(record.id, now).await {
            Ok(Some(updated)) => (VerificationResult::accepted(&updated), VerificationOutcome::Success),
            // Revoked or expired between the read and the increment.
            Ok(None) => match self.store.get_by_id(record.id).await {
                Ok(Some(latest)) => {
                    let outcome = inactive_outcome(&latest, now).unwrap_or(VerificationOutcome::Revoked);
                    rejected(outcome, latest.verification_count)
                }
                Ok(None) => rejected(VerificationOutcome::NotFound, 0),
                Err(e) => {
                    warn!(error = %e, "verification store unavailable");
                    rejected(VerificationOutcome::Unavailable, record.verification_count)
                }
            },
            Err(e) => {
                warn!(error = %e, "verification store unavailable");
                rejected(VerificationOutcome::Unavailable, record.verification_count)
            }
        }
    }

    async fn log_attempt(
        &self,
        code: &str,
        at: DateTime<Utc>,
        context: &AttemptContext,
        outcome: VerificationOutcome,
    ) {
        let attempt = VerificationAttempt {
            verification_code: code.to_owned(),
            timestamp: at,
            source_ip: context.ip,
            user_agent: context.user_agent.clone(),
            location: context.location.clone(),
            outcome,
        };
        if let Err(e) = self.store.append_attempt(&attempt).await {
            warn!(error = %e, "failed to log verification attempt");
        }
    }

    /// Revoke a record. Returns `false` only when no such record exists;
    /// revoking an already-revoked record succeeds without changing it.
    #[instrument(skip(self, reason), fields(record_id = %id))]
    pub async fn revoke_document(&self, id: RecordId, reason: &str) -> Result<bool> {
        match self.store.revoke(id, reason, Utc::now()).await? {
            RevokeOutcome::Revoked => {
                info!("document revoked");
                Ok(true)
            }
            RevokeOutcome::AlreadyRevoked => {
                debug!("document already revoked");
                Ok(true)
            }
            RevokeOutcome::NotFound => Ok(false),
        }
    }

    /// The attempt log for a code, oldest first.
    pub async fn verification_history(&self, code: &str) -> Result<Vec<VerificationAttempt>> {
        let code = normalise_code(code).unwrap_or_else(|| code.trim().to_owned());
        self.store.attempts_for_code(&code).await
    }
}

fn inactive_outcome(record: &VerificationRecord, now: DateTime<Utc>) -> Option<VerificationOutcome> {
    if !record.is_active {
        Some(VerificationOutcome::Revoked)
    } else if record.expiry_date.is_some_and(|expiry| expiry < now) {
        Some(VerificationOutcome::Expired)
    } else {
        None
    }
}

/// Advisory labels: type code, issue year, office.
fn hashtags(document_type: DocumentType, issued_at: DateTime<Utc>, office: &str) -> Vec<String> {
    let mut tags = vec![
        format!("#{}", document_type.code()),
        format!("#{}", issued_at.year()),
    ];
    let office: String = office
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !office.is_empty() {
        tags.push(format!("#{office}"));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> EngineConfig {
        EngineConfig {
            hmac_secret: "test-secret".into(),
            verification_base_url: "https://verify.example.gov".into(),
            issuing_office: "Pretoria Central".into(),
            ..Default::default()
        }
    }

    fn service() -> VerificationService {
        VerificationService::new(Arc::new(MemoryStore::new()), &config())
    }

    fn request(data: serde_json::Value) -> RegistrationRequest {
        RegistrationRequest {
            document_type: DocumentType::OrdinaryPassport,
            document_number: "P12345678".into(),
            data,
            issued_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            expiry_date: Some(Utc::now() + Duration::days(3650)),
            issuing_office: None,
            issuing_officer: None,
        }
    }

    fn data() -> serde_json::Value {
        json!({"surname": "ERIKSSON", "givenNames": "ANNA MARIA", "documentNumber": "P12345678"})
    }

    #[tokio::test]
    async fn register_then_verify_counts_each_success() {
        let svc = service();
        let reg = svc.register_document(request(data())).await.unwrap();
        assert!(reg.newly_created);
        assert_eq!(reg.verification_code.len(), 12);
        assert_eq!(
            reg.verification_url,
            format!("https://verify.example.gov/verify/{}", reg.verification_code)
        );

        let ctx = AttemptContext::default();
        let first = svc.verify_document(&reg.verification_code, &ctx).await;
        assert!(first.is_valid);
        assert_eq!(first.verification_count, 1);
        assert_eq!(first.document_number.as_deref(), Some("P12345678"));
        assert_eq!(first.hashtags, vec!["#PASSPORT", "#2026", "#PRETORIACENTRAL"]);

        let second = svc.verify_document(&reg.verification_code.to_lowercase(), &ctx).await;
        assert!(second.is_valid);
        assert_eq!(second.verification_count, 2);
    }

    #[tokio::test]
    async fn registration_is_idempotent_and_order_independent() {
        let svc = service();
        let a = svc.register_document(request(data())).await.unwrap();
        let reordered: serde_json::Value =
            serde_json::from_str(r#"{"documentNumber":"P12345678","givenNames":"ANNA MARIA","surname":"ERIKSSON"}"#)
                .unwrap();
        let b = svc.register_document(request(reordered)).await.unwrap();
        assert!(!b.newly_created);
        assert_eq!(a.record_id, b.record_id);
        assert_eq!(a.document_hash, b.document_hash);
        assert_eq!(a.verification_code, b.verification_code);
    }

    #[tokio::test]
    async fn revoked_document_keeps_its_count() {
        let svc = service();
        let reg = svc.register_document(request(data())).await.unwrap();
        let ctx = AttemptContext::default();
        assert_eq!(svc.verify_document(&reg.verification_code, &ctx).await.verification_count, 1);

        assert!(svc.revoke_document(reg.record_id, "reported stolen").await.unwrap());
        assert!(svc.revoke_document(reg.record_id, "again").await.unwrap());
        assert!(!svc.revoke_document(RecordId::new(), "unknown").await.unwrap());

        let result = svc.verify_document(&reg.verification_code, &ctx).await;
        assert!(!result.is_valid);
        assert_eq!(result.outcome, VerificationOutcome::Revoked);
        assert_eq!(result.verification_count, 1);
        assert_eq!(result.message, MSG_INACTIVE);

        let record = svc.store().get_by_id(reg.record_id).await.unwrap().unwrap();
        assert_eq!(record.verification_count, 1);
        assert_eq!(record.revocation_reason.as_deref(), Some("reported stolen"));
    }

    #[tokio::test]
    async fn expired_document_is_not_counted() {
        let svc = service();
        let mut req = request(data());
        req.expiry_date = Some(Utc::now() - Duration::days(1));
        let reg = svc.register_document(req).await.unwrap();

        let result = svc.verify_document(&reg.verification_code, &AttemptContext::default()).await;
        assert!(!result.is_valid);
        assert_eq!(result.outcome, VerificationOutcome::Expired);
        assert_eq!(result.verification_count, 0);
    }

    #[tokio::test]
    async fn unknown_and_malformed_codes_are_not_found() {
        let svc = service();
        let ctx = AttemptContext {
            user_agent: Some("curl/8".into()),
            ..Default::default()
        };
        for code in ["ABCDEF012345", "", "'; DROP TABLE verification_records; --", "ZZZ"] {
            let result = svc.verify_document(code, &ctx).await;
            assert!(!result.is_valid);
            assert_eq!(result.outcome, VerificationOutcome::NotFound);
            assert_eq!(result.verification_count, 0);
        }
        let history = svc.verification_history("abcdef012345").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_agent.as_deref(), Some("curl/8"));
    }

    #[tokio::test]
    async fn every_lookup_is_logged() {
        let svc = service();
        let reg = svc.register_document(request(data())).await.unwrap();
        let ctx = AttemptContext::default();
        svc.verify_document(&reg.verification_code, &ctx).await;
        svc.revoke_document(reg.record_id, "cancelled").await.unwrap();
        svc.verify_document(&reg.verification_code, &ctx).await;

        let outcomes: Vec<_> = svc
            .verification_history(&reg.verification_code)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.outcome)
            .collect();
        assert_eq!(outcomes, vec![VerificationOutcome::Success, VerificationOutcome::Revoked]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_verifications_lose_no_increments() {
        const K: u64 = 32;
        let svc = Arc::new(VerificationService::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            &config(),
        ));
        let mut req = request(data());
        req.expiry_date = None;
        let reg = svc.register_document(req).await.unwrap();

        let handles: Vec<_> = (0..K)
            .map(|_| {
                let svc = Arc::clone(&svc);
                let code = reg.verification_code.clone();
                tokio::spawn(async move { svc.verify_document(&code, &AttemptContext::default()).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_valid);
        }

        let record = svc.store().get_by_id(reg.record_id).await.unwrap().unwrap();
        assert_eq!(record.verification_count, K);
        assert_eq!(svc.verification_history(&reg.verification_code).await.unwrap().len(), K as usize);
    }

    #[tokio::test]
    async fn tampered_data_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.db");
        let svc = VerificationService::new(Arc::new(SqliteStore::open(&path).unwrap()), &config());
        let reg = svc.register_document(request(data())).await.unwrap();

        let raw = rusqlite::Connection::open(&path).unwrap();
        raw.execute(
            "UPDATE verification_records SET document_data = ?1 WHERE verification_code = ?2",
            rusqlite::params![r#"{"surname":"MALLORY"}"#, reg.verification_code],
        )
        .unwrap();

        let result = svc.verify_document(&reg.verification_code, &AttemptContext::default()).await;
        assert!(!result.is_valid);
        assert_eq!(result.outcome, VerificationOutcome::Tampered);
        assert_eq!(result.verification_count, 0);
    }

    struct FixedScorer(f64, AtomicUsize);

    #[async_trait]
    impl AuthenticityScorer for FixedScorer {
        async fn score(&self, _record: &VerificationRecord) -> Result<f64> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0)
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl AuthenticityScorer for FailingScorer {
        async fn score(&self, _record: &VerificationRecord) -> Result<f64> {
            Err(DocguardError::Database("analyzer offline".into()))
        }
    }

    #[tokio::test]
    async fn scorer_runs_once_per_new_record() {
        let scorer = Arc::new(FixedScorer(1.7, AtomicUsize::new(0)));
        let svc = service().with_scorer(scorer.clone());
        let reg = svc.register_document(request(data())).await.unwrap();
        svc.register_document(request(data())).await.unwrap();

        assert_eq!(scorer.1.load(Ordering::SeqCst), 1);
        let record = svc.store().get_by_id(reg.record_id).await.unwrap().unwrap();
        assert_eq!(record.ai_authenticity_score, Some(1.0));
    }

    #[tokio::test]
    async fn scorer_failure_does_not_block_registration() {
        let svc = service().with_scorer(Arc::new(FailingScorer));
        let reg = svc.register_document(request(data())).await.unwrap();
        let record = svc.store().get_by_id(reg.record_id).await.unwrap().unwrap();
        assert_eq!(record.ai_authenticity_score, None);
        assert!(svc.verify_document(&reg.verification_code, &AttemptContext::default()).await.is_valid);
    }
}
