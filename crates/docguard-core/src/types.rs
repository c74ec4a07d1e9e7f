// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: applicant data, generation requests, verification
// records and the append-only attempt log.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalogue::DocumentType;

/// Unique identifier for one generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of a verification record (distinct from its public code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sex marker as printed in the MRZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    /// Printed as `<`.
    Unspecified,
}

impl Sex {
    /// The single MRZ character for this marker.
    pub fn mrz_char(&self) -> char {
        match self {
            Self::Male => 'M',
            Self::Female => 'F',
            Self::Unspecified => '<',
        }
    }
}

/// Applicant data. Treated as immutable once a generation run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalFields {
    pub surname: String,
    pub given_names: String,
    pub date_of_birth: Option<NaiveDate>,
    /// ISO 3166-1 alpha-3.
    pub nationality: String,
    pub sex: Option<Sex>,
    /// National identity / personal number, when the document carries one.
    pub id_number: Option<String>,
}

/// Identifiers a caller may have reserved ahead of generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifiers {
    pub document_number: String,
    pub serial: Option<String>,
}

/// Well-known attribute keys used by the document catalogue.
pub mod attr {
    pub const EMPLOYER: &str = "employer";
    pub const VALID_FROM: &str = "validFrom";
    pub const VALID_UNTIL: &str = "validUntil";
    pub const CATEGORY: &str = "category";
    pub const ISSUING_STATE: &str = "issuingState";
    pub const PLACE_OF_BIRTH: &str = "placeOfBirth";
    pub const SPOUSE_NAME: &str = "spouseName";
    pub const DATE_OF_DEATH: &str = "dateOfDeath";
    pub const DATE_OF_MARRIAGE: &str = "dateOfMarriage";
    pub const DATE_OF_DIVORCE: &str = "dateOfDivorce";
    pub const INSTITUTION: &str = "institution";
    pub const PURPOSE: &str = "purpose";
    pub const FILE_NUMBER: &str = "fileNumber";
    pub const COUNTRY_OF_ORIGIN: &str = "countryOfOrigin";
    pub const DESTINATION: &str = "destination";
}

/// One document generation request. Consumed by the pipeline; only the
/// resulting verification record is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub document_type: DocumentType,
    pub personal: PersonalFields,
    /// Type-specific attributes, keyed by the names in [`attr`].
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub identifiers: Option<Identifiers>,
    /// Encoded portrait (PNG/JPEG), used for the ghost image.
    #[serde(default, skip_serializing)]
    pub photo: Option<Vec<u8>>,
}

impl DocumentRequest {
    pub fn new(document_type: DocumentType, personal: PersonalFields) -> Self {
        Self {
            document_type,
            personal,
            attributes: BTreeMap::new(),
            identifiers: None,
            photo: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    /// Attribute value, treating blank strings as absent.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// External pre-issuance checks a document type may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    Identity,
    Biometric,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Biometric => f.write_str("biometric"),
        }
    }
}

/// Classification of errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip, busy collaborator — safe to retry.
    Transient,
    /// Retrying cannot help.
    Permanent,
}

/// The durable proof that a document was issued.
///
/// Created once at registration. After that only the verification counter
/// (successful lookups) and the one-way revocation fields ever change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: RecordId,
    pub verification_code: String,
    pub document_hash: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_data: serde_json::Value,
    pub issuing_office: String,
    pub issuing_officer: String,
    pub is_active: bool,
    pub verification_count: u64,
    pub issued_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    /// Derived labels; never used for any decision.
    pub hashtags: Vec<String>,
    /// Advisory score from an external analyzer.
    pub ai_authenticity_score: Option<f64>,
}

/// Result of one verification lookup, as recorded in the attempt log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationOutcome {
    Success,
    NotFound,
    Revoked,
    Expired,
    /// Stored data no longer hashes to the registered document hash.
    Tampered,
    /// The store could not be reached.
    Unavailable,
}

impl VerificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not-found",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Tampered => "tampered",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "not-found" => Some(Self::NotFound),
            "revoked" => Some(Self::Revoked),
            "expired" => Some(Self::Expired),
            "tampered" => Some(Self::Tampered),
            "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }
}

/// Caller-supplied context for a verification lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptContext {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub location: Option<String>,
}

/// Append-only log entry, written for every lookup whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationAttempt {
    pub verification_code: String,
    pub timestamp: DateTime<Utc>,
    pub source_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub location: Option<String>,
    pub outcome: VerificationOutcome,
}

/// Public answer to `verify_document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    pub outcome: VerificationOutcome,
    pub verification_count: u64,
    pub message: String,
    pub document_type: Option<DocumentType>,
    pub document_number: Option<String>,
    pub issuing_office: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub hashtags: Vec<String>,
}

impl VerificationResult {
    /// A negative result carrying no record details.
    pub fn rejected(outcome: VerificationOutcome, verification_count: u64, message: &str) -> Self {
        Self {
            is_valid: false,
            outcome,
            verification_count,
            message: message.to_owned(),
            document_type: None,
            document_number: None,
            issuing_office: None,
            issued_at: None,
            expiry_date: None,
            last_verified_at: None,
            hashtags: Vec::new(),
        }
    }

    /// A positive result exposing the record's public fields.
    pub fn accepted(record: &VerificationRecord) -> Self {
        Self {
            is_valid: true,
            outcome: VerificationOutcome::Success,
            verification_count: record.verification_count,
            message: "document is authentic and valid".to_owned(),
            document_type: Some(record.document_type),
            document_number: Some(record.document_number.clone()),
            issuing_office: Some(record.issuing_office.clone()),
            issued_at: Some(record.issued_at),
            expiry_date: record.expiry_date,
            last_verified_at: record.last_verified_at,
            hashtags: record.hashtags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_strings_round_trip() {
        for outcome in [
            VerificationOutcome::Success,
            VerificationOutcome::NotFound,
            VerificationOutcome::Revoked,
            VerificationOutcome::Expired,
            VerificationOutcome::Tampered,
            VerificationOutcome::Unavailable,
        ] {
            assert_eq!(VerificationOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(VerificationOutcome::parse("bogus"), None);
    }

    #[test]
    fn blank_attribute_counts_as_absent() {
        let req = DocumentRequest::new(DocumentType::GeneralWorkVisa, PersonalFields::default())
            .with_attribute(attr::EMPLOYER, "   ");
        assert_eq!(req.attribute(attr::EMPLOYER), None);
    }

    #[test]
    fn sex_markers() {
        assert_eq!(Sex::Male.mrz_char(), 'M');
        assert_eq!(Sex::Female.mrz_char(), 'F');
        assert_eq!(Sex::Unspecified.mrz_char(), '<');
    }

    #[test]
    fn record_serialises_camel_case() {
        let record = VerificationRecord {
            id: RecordId::new(),
            verification_code: "ABCDEF012345".into(),
            document_hash: "00".repeat(32),
            document_type: DocumentType::OrdinaryPassport,
            document_number: "A12345678".into(),
            document_data: serde_json::json!({}),
            issuing_office: "Pretoria".into(),
            issuing_officer: "Officer".into(),
            is_active: true,
            verification_count: 0,
            issued_at: Utc::now(),
            expiry_date: None,
            last_verified_at: None,
            revoked_at: None,
            revocation_reason: None,
            hashtags: Vec::new(),
            ai_authenticity_score: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("verificationCode").is_some());
        assert!(json.get("isActive").is_some());
    }
}
