// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocGuard.

use thiserror::Error;

use crate::types::CheckKind;

/// Top-level error type for all DocGuard operations.
///
/// Verification lookups never surface these: the public verification
/// boundary folds every failure into a negative `VerificationResult`.
#[derive(Debug, Error)]
pub enum DocguardError {
    // -- Validation --
    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("malformed field `{field}`: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("invalid MRZ character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    // -- External checks --
    #[error("{check} check rejected the applicant")]
    CheckFailed { check: CheckKind },

    #[error("{check} check unavailable: {message}")]
    CheckUnavailable {
        check: CheckKind,
        message: String,
        transient: bool,
    },

    #[error("{check} check timed out after {after_ms} ms")]
    CheckTimeout { check: CheckKind, after_ms: u64 },

    // -- Signing --
    #[error("signing failed: {message}")]
    Signing { message: String, transient: bool },

    #[error("signing timed out after {after_ms} ms")]
    SigningTimeout { after_ms: u64 },

    // -- Rendering / registration / publishing --
    #[error("rendering failed: {0}")]
    Rendering(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("artifact publishing failed: {0}")]
    Publish(String),

    // -- Integrity --
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocguardError {
    /// Shorthand for a single malformed field.
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocguardError>;
