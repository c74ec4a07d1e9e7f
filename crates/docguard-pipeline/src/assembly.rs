// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly pipeline.
//
// One linear run per request:
//
//   validating -> [identity_check] -> [biometric_check] -> rendering
//              -> signing -> registering -> complete
//
// Any stage may end the run in `failed`. Nothing durable happens before
// registering; the signed buffer is only published once its verification
// record exists.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use docguard_core::error::{DocguardError, Result};
use docguard_core::{
    CheckKind, DocumentId, DocumentProfile, DocumentRequest, DocumentType, EngineConfig, PipelineConfig,
    SecurityFeature, attr,
};
use docguard_document::{ContentInput, FeatureContent, MrzInput, render_pdf, verify_mrz};
use docguard_security::{AuditEvent, IssuanceAudit, document_hash, new_document_number, new_serial};
use docguard_verify::{RegistrationRequest, VerificationService};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::contracts::{ApplicantVerifier, ArtifactStore, CheckOutcome, CheckRequest, DocumentSigner, SigningMetadata};
use crate::pool::RenderPool;
use crate::retry::retry_with_backoff;
use crate::validation::{parse_date, validate};

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    IdentityCheck,
    BiometricCheck,
    Rendering,
    Signing,
    Registering,
    Complete,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::IdentityCheck => "identity_check",
            Self::BiometricCheck => "biometric_check",
            Self::Rendering => "rendering",
            Self::Signing => "signing",
            Self::Registering => "registering",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    fn for_check(check: CheckKind) -> Self {
        match check {
            CheckKind::Identity => Self::IdentityCheck,
            CheckKind::Biometric => Self::BiometricCheck,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run that ended in `failed`, with the stage it failed in.
#[derive(Debug, Error)]
#[error("document generation failed during {stage}: {source}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub source: DocguardError,
}

/// What a completed run hands back.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub document_id: DocumentId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub serial: String,
    pub verification_code: String,
    pub verification_url: String,
    pub document_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// Features in the order they were layered.
    pub security_features: Vec<SecurityFeature>,
    pub mrz_lines: Vec<String>,
    /// Check references returned by the external verifiers.
    pub check_references: Vec<(CheckKind, String)>,
    pub signed_pdf: Vec<u8>,
    /// Where the artifact store put the signed document, if one is configured.
    pub artifact_location: Option<String>,
}

/// Drives one document through every stage.
///
/// Built once at startup and shared; holds no per-request state.
pub struct DocumentPipeline {
    config: PipelineConfig,
    issuing_office: String,
    issuing_state: String,
    verification: Arc<VerificationService>,
    signer: Arc<dyn DocumentSigner>,
    identity: Option<Arc<dyn ApplicantVerifier>>,
    biometric: Option<Arc<dyn ApplicantVerifier>>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
    audit: Option<Arc<IssuanceAudit>>,
    pool: RenderPool,
}

impl DocumentPipeline {
    pub fn new(config: &EngineConfig, verification: Arc<VerificationService>, signer: Arc<dyn DocumentSigner>) -> Self {
        Self {
            config: config.pipeline.clone(),
            issuing_office: config.issuing_office.clone(),
            issuing_state: config.issuing_state.clone(),
            verification,
            signer,
            identity: None,
            biometric: None,
            artifacts: None,
            audit: None,
            pool: RenderPool::new(config.pipeline.render_workers),
        }
    }

    pub fn with_identity_verifier(mut self, verifier: Arc<dyn ApplicantVerifier>) -> Self {
        self.identity = Some(verifier);
        self
    }

    pub fn with_biometric_verifier(mut self, verifier: Arc<dyn ApplicantVerifier>) -> Self {
        self.biometric = Some(verifier);
        self
    }

    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = Some(store);
        self
    }

    pub fn with_audit(mut self, audit: Arc<IssuanceAudit>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn render_pool(&self) -> &RenderPool {
        &self.pool
    }

    /// Run `request` through the pipeline.
    ///
    /// Dropping the returned future before signing starts abandons the run
    /// with no durable effect. Once signing has started the signer call
    /// runs to completion (or its timeout) on its own task and the result
    /// is discarded.
    #[instrument(skip_all, fields(document_type = %request.document_type))]
    pub async fn generate(&self, request: DocumentRequest) -> std::result::Result<GeneratedDocument, PipelineFailure> {
        let profile = request.document_type.profile();
        let issued_at = Utc::now();
        let mut run = Run {
            audit: self.audit.as_deref(),
            document_id: DocumentId::new(),
            profile,
            document_hash: None,
        };

        run.enter(Stage::Validating);
        validate(&request, &self.issuing_state, issued_at.date_naive()).map_err(|e| run.fail(Stage::Validating, e))?;
        run.passed(Stage::Validating, None);

        let mut check_references = Vec::new();
        for check in [CheckKind::Identity, CheckKind::Biometric] {
            if !profile.requires(check) {
                continue;
            }
            let stage = Stage::for_check(check);
            run.enter(stage);
            let outcome = self.run_check(check, &request).await.map_err(|e| run.fail(stage, e))?;
            run.passed(stage, outcome.reference.as_deref());
            if let Some(reference) = outcome.reference {
                check_references.push((check, reference));
            }
        }

        run.enter(Stage::Rendering);
        let draft = self
            .draft(&request, &profile, issued_at)
            .map_err(|e| run.fail(Stage::Rendering, e))?;
        run.document_hash = Some(draft.document_hash.clone());
        let (pdf, security_features) = self
            .render(&request, &draft)
            .await
            .map_err(|e| run.fail(Stage::Rendering, e))?;
        run.passed(Stage::Rendering, None);

        run.enter(Stage::Signing);
        let metadata = SigningMetadata {
            document_id: run.document_id,
            document_type: request.document_type,
            document_number: draft.document_number.clone(),
            issued_at,
            document_hash: draft.document_hash.clone(),
            issuing_office: self.issuing_office.clone(),
        };
        let signed_pdf = self.sign(pdf, metadata).await.map_err(|e| run.fail(Stage::Signing, e))?;
        run.passed(Stage::Signing, None);

        run.enter(Stage::Registering);
        let registration = RegistrationRequest {
            document_type: request.document_type,
            document_number: draft.document_number.clone(),
            data: draft.data,
            issued_at,
            expiry_date: draft.expiry_date,
            issuing_office: Some(self.issuing_office.clone()),
            issuing_officer: None,
        };
        let (verification, registration) = (&self.verification, &registration);
        let registered = retry_with_backoff(&self.config.retry, "register", move || {
            verification.register_document(registration.clone())
        })
        .await
        .map_err(|e| run.fail(Stage::Registering, e))?;
        if registered.document_hash != draft.document_hash {
            return Err(run.fail(
                Stage::Registering,
                DocguardError::IntegrityMismatch {
                    expected: draft.document_hash,
                    actual: registered.document_hash,
                },
            ));
        }

        let artifact_location = match &self.artifacts {
            Some(store) => Some(
                self.publish(store.as_ref(), run.document_id, &signed_pdf)
                    .await
                    .map_err(|e| run.fail(Stage::Registering, e))?,
            ),
            None => None,
        };
        run.passed(Stage::Registering, Some(&registered.verification_code));

        run.enter(Stage::Complete);
        run.passed(Stage::Complete, Some(&registered.verification_code));

        Ok(GeneratedDocument {
            document_id: run.document_id,
            document_type: request.document_type,
            document_number: draft.document_number,
            serial: draft.serial,
            verification_code: registered.verification_code,
            verification_url: registered.verification_url,
            document_hash: registered.document_hash,
            issued_at,
            expiry_date: draft.expiry_date,
            security_features,
            mrz_lines: draft.mrz_lines,
            check_references,
            signed_pdf,
            artifact_location,
        })
    }

    /// Call the verifier for `check`, bounded by the check timeout and
    /// retried while it reports transient failures.
    async fn run_check(&self, check: CheckKind, request: &DocumentRequest) -> Result<CheckOutcome> {
        let verifier = match check {
            CheckKind::Identity => self.identity.as_deref(),
            CheckKind::Biometric => self.biometric.as_deref(),
        }
        .ok_or_else(|| DocguardError::CheckUnavailable {
            check,
            message: "no verifier configured".into(),
            transient: false,
        })?;

        let check_request = CheckRequest {
            document_type: request.document_type,
            id_number: request.personal.id_number.as_deref().unwrap_or_default(),
            personal: &request.personal,
            attributes: &request.attributes,
            photo: request.photo.as_deref(),
        };
        let check_request = &check_request;
        let timeout = self.config.check_timeout();
        let after_ms = self.config.check_timeout_ms;

        let operation = match check {
            CheckKind::Identity => "identity check",
            CheckKind::Biometric => "biometric check",
        };
        let outcome = retry_with_backoff(&self.config.retry, operation, move || async move {
            match tokio::time::timeout(timeout, verifier.verify(check_request)).await {
                Ok(result) => result,
                Err(_) => Err(DocguardError::CheckTimeout { check, after_ms }),
            }
        })
        .await?;

        if !outcome.verified {
            return Err(DocguardError::CheckFailed { check });
        }
        debug!(%check, reference = ?outcome.reference, "check passed");
        Ok(outcome)
    }

    /// Identifiers, validity, document data, hash and MRZ for one run.
    fn draft(&self, request: &DocumentRequest, profile: &DocumentProfile, issued_at: DateTime<Utc>) -> Result<Draft> {
        let (document_number, serial) = match &request.identifiers {
            Some(ids) => (
                ids.document_number.clone(),
                match &ids.serial {
                    Some(serial) => serial.clone(),
                    None => new_serial(profile.serial_prefix)?,
                },
            ),
            None => (new_document_number(profile.number_prefix)?, new_serial(profile.serial_prefix)?),
        };

        let expiry_date = match profile.validity_days {
            Some(days) => Some(issued_at + ChronoDuration::days(i64::from(days))),
            None => match request.attribute(attr::VALID_UNTIL) {
                Some(until) => parse_date(attr::VALID_UNTIL, until)?
                    .and_hms_opt(23, 59, 59)
                    .map(|end_of_day| end_of_day.and_utc()),
                None => None,
            },
        };
        let issuing_state = request
            .attribute(attr::ISSUING_STATE)
            .unwrap_or(self.issuing_state.as_str())
            .to_owned();

        let data = json!({
            "documentType": profile.code,
            "documentNumber": document_number,
            "serial": serial,
            "personal": request.personal,
            "attributes": request.attributes,
            "issuedAt": issued_at.to_rfc3339(),
            "expiryDate": expiry_date.map(|d| d.to_rfc3339()),
            "issuingOffice": self.issuing_office,
            "issuingState": issuing_state,
        });
        let hash = document_hash(&data)?;

        let mrz_lines = match profile.mrz {
            Some(spec) => {
                let personal = &request.personal;
                let input = MrzInput {
                    document_code: spec.document_code.to_owned(),
                    issuing_state,
                    surname: personal.surname.clone(),
                    given_names: personal.given_names.clone(),
                    document_number: document_number.clone(),
                    nationality: personal.nationality.clone(),
                    date_of_birth: personal.date_of_birth,
                    sex: personal.sex,
                    expiry: expiry_date.map(|d| d.date_naive()),
                    optional_data: personal.id_number.clone().unwrap_or_default(),
                };
                let encoding = docguard_document::encode(spec.format, &input)?;
                let failures = verify_mrz(spec.format, &encoding.lines)?;
                if let Some(first) = failures.first() {
                    return Err(DocguardError::Rendering(format!(
                        "MRZ self-check failed for {} ({} mismatches)",
                        first.field,
                        failures.len()
                    )));
                }
                encoding.lines
            }
            None => Vec::new(),
        };

        Ok(Draft {
            document_number,
            serial,
            expiry_date,
            data,
            document_hash: hash,
            mrz_lines,
            issued_at,
        })
    }

    /// Lay out and render the page on the bounded pool.
    async fn render(&self, request: &DocumentRequest, draft: &Draft) -> Result<(Vec<u8>, Vec<SecurityFeature>)> {
        let document_type = request.document_type;
        let fields = display_fields(request, draft);
        let holder_name = format!("{} {}", request.personal.given_names.trim(), request.personal.surname.trim())
            .trim()
            .to_owned();
        let document_number = draft.document_number.clone();
        let serial = draft.serial.clone();
        let document_hash = draft.document_hash.clone();
        let mrz_lines = draft.mrz_lines.clone();
        let photo = request.photo.clone();
        let issued_at = draft.issued_at;

        let rendered = self
            .pool
            .run(move || {
                let content = FeatureContent::prepare(ContentInput {
                    document_type,
                    document_number: &document_number,
                    serial: &serial,
                    holder_name: &holder_name,
                    issued_at,
                    document_hash: &document_hash,
                    mrz_lines,
                    photo: photo.as_deref(),
                })?;
                Ok(render_pdf(&content, &fields))
            })
            .await?;
        Ok((rendered.pdf, rendered.features))
    }

    /// Sign on a detached task so a cancelled caller cannot interrupt the
    /// signer mid-call. The unsigned buffer never leaves this function.
    async fn sign(&self, pdf: Vec<u8>, metadata: SigningMetadata) -> Result<Vec<u8>> {
        let signer = Arc::clone(&self.signer);
        let policy = self.config.retry.clone();
        let level = self.config.signature_level.clone();
        let timeout = self.config.signing_timeout();
        let after_ms = self.config.signing_timeout_ms;

        let task = tokio::spawn(async move {
            let (signer, pdf, metadata, level) = (&signer, &pdf, &metadata, &level);
            retry_with_backoff(&policy, "sign", move || async move {
                match tokio::time::timeout(timeout, signer.sign(pdf, metadata, level)).await {
                    Ok(result) => result,
                    Err(_) => Err(DocguardError::SigningTimeout { after_ms }),
                }
            })
            .await
        });

        let signed = task.await.map_err(|e| DocguardError::Signing {
            message: format!("signing task failed: {e}"),
            transient: false,
        })??;
        if signed.is_empty() {
            return Err(DocguardError::Signing {
                message: "signer returned an empty document".into(),
                transient: false,
            });
        }
        Ok(signed)
    }

    async fn publish(&self, store: &dyn ArtifactStore, document_id: DocumentId, signed: &[u8]) -> Result<String> {
        let location = retry_with_backoff(&self.config.retry, "publish", move || store.publish(document_id, signed)).await?;
        info!(%document_id, location = %location, "signed document published");
        Ok(location)
    }
}

/// Everything derived from the request before rendering.
struct Draft {
    document_number: String,
    serial: String,
    expiry_date: Option<DateTime<Utc>>,
    data: serde_json::Value,
    document_hash: String,
    mrz_lines: Vec<String>,
    issued_at: DateTime<Utc>,
}

/// Label/value pairs printed in the data block.
fn display_fields(request: &DocumentRequest, draft: &Draft) -> Vec<(String, String)> {
    let personal = &request.personal;
    let mut fields = vec![
        ("Surname".to_owned(), personal.surname.trim().to_uppercase()),
        ("Given names".to_owned(), personal.given_names.trim().to_uppercase()),
    ];
    if let Some(dob) = personal.date_of_birth {
        fields.push(("Date of birth".into(), dob.format("%d %b %Y").to_string()));
    }
    if !personal.nationality.trim().is_empty() {
        fields.push(("Nationality".into(), personal.nationality.clone()));
    }
    if let Some(sex) = personal.sex {
        fields.push(("Sex".into(), sex.mrz_char().to_string()));
    }
    if let Some(id_number) = personal.id_number.as_deref().filter(|v| !v.trim().is_empty()) {
        fields.push(("ID number".into(), id_number.to_owned()));
    }
    fields.push(("Document no.".into(), draft.document_number.clone()));
    fields.push(("Date of issue".into(), draft.issued_at.format("%d %b %Y").to_string()));
    if let Some(expiry) = draft.expiry_date {
        fields.push(("Date of expiry".into(), expiry.format("%d %b %Y").to_string()));
    }
    for (key, value) in &request.attributes {
        if !value.trim().is_empty() {
            fields.push((key.clone(), value.clone()));
        }
    }
    fields
}

/// Stage logging and audit for one run.
struct Run<'a> {
    audit: Option<&'a IssuanceAudit>,
    document_id: DocumentId,
    profile: DocumentProfile,
    document_hash: Option<String>,
}

impl Run<'_> {
    fn enter(&self, stage: Stage) {
        info!(
            stage = stage.as_str(),
            document_type = self.profile.code,
            document_id = %self.document_id,
            "pipeline stage started"
        );
    }

    fn passed(&self, stage: Stage, details: Option<&str>) {
        self.record(stage, true, details);
    }

    fn fail(&self, stage: Stage, error: DocguardError) -> PipelineFailure {
        warn!(
            stage = Stage::Failed.as_str(),
            failed_stage = stage.as_str(),
            document_type = self.profile.code,
            document_id = %self.document_id,
            error = %error,
            "document generation failed"
        );
        self.record(stage, false, Some(&error.to_string()));
        PipelineFailure { stage, source: error }
    }

    fn record(&self, stage: Stage, success: bool, details: Option<&str>) {
        let Some(audit) = self.audit else {
            return;
        };
        let document_id = self.document_id.to_string();
        let event = AuditEvent {
            document_id: &document_id,
            document_type: self.profile.code,
            stage: stage.as_str(),
            document_hash: self.document_hash.as_deref(),
            success,
            details,
        };
        if let Err(e) = audit.record(event) {
            warn!(error = %e, stage = stage.as_str(), "failed to write issuance audit entry");
        }
    }
}
