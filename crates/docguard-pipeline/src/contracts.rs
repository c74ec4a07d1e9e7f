// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contracts for the collaborators the pipeline drives but does not own:
// applicant verifiers, the cryptographic signer and the artifact store.
//
// Implementations report whether a failure is worth retrying through the
// `transient` flag on `CheckUnavailable` / `Signing`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docguard_core::error::Result;
use docguard_core::{DocumentId, DocumentType, PersonalFields};
use serde::Serialize;

/// What an identity or biometric verifier is asked about.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    pub document_type: DocumentType,
    /// National identity number; empty when the request carries none.
    pub id_number: &'a str,
    pub personal: &'a PersonalFields,
    pub attributes: &'a BTreeMap<String, String>,
    /// Encoded portrait, for biometric matching.
    pub photo: Option<&'a [u8]>,
}

/// A verifier's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub verified: bool,
    /// Verifier-side reference for the check, if it issues one.
    pub reference: Option<String>,
}

impl CheckOutcome {
    pub fn passed() -> Self {
        Self {
            verified: true,
            reference: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            verified: false,
            reference: None,
        }
    }
}

/// External identity (population register) or biometric check.
///
/// The pipeline bounds every call with the configured check timeout.
#[async_trait]
pub trait ApplicantVerifier: Send + Sync {
    async fn verify(&self, request: &CheckRequest<'_>) -> Result<CheckOutcome>;
}

/// Metadata handed to the signer alongside the document bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningMetadata {
    pub document_id: DocumentId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub issued_at: DateTime<Utc>,
    pub document_hash: String,
    pub issuing_office: String,
}

/// External signer. Must return the complete signed document or an error;
/// the pipeline discards the unsigned buffer either way.
#[async_trait]
pub trait DocumentSigner: Send + Sync {
    async fn sign(&self, document: &[u8], metadata: &SigningMetadata, level: &str) -> Result<Vec<u8>>;
}

/// Durable home for signed documents. Only ever called after the
/// document's verification record exists.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `document` and return where it can be fetched from.
    async fn publish(&self, document_id: DocumentId, document: &[u8]) -> Result<String>;
}
