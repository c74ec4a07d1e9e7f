// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verification codes — HMAC-SHA256 over the canonical (data, type, issue
// time) triple, truncated to 12 uppercase hex characters.

use chrono::{DateTime, SecondsFormat, Utc};
use docguard_core::DocumentType;
use docguard_core::error::Result;
use ring::hmac;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::integrity::canonical_bytes;

/// Exact length of a public verification code.
pub const CODE_LEN: usize = 12;

/// What the HMAC covers. Field order is irrelevant: it is canonicalised.
#[derive(Serialize)]
struct CodeInput<'a, T: Serialize> {
    data: &'a T,
    #[serde(rename = "type")]
    document_type: DocumentType,
    timestamp: String,
}

/// Keyed generator for verification codes.
///
/// Construct once at start-up from the configured secret and share it.
pub struct CodeGenerator {
    key: hmac::Key,
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator").finish_non_exhaustive()
    }
}

impl CodeGenerator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Code for a document issued at `issued_at`.
    #[instrument(skip_all, fields(%document_type))]
    pub fn code_for<T: Serialize>(
        &self,
        data: &T,
        document_type: DocumentType,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let input = CodeInput {
            data,
            document_type,
            timestamp: issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let tag = hmac::sign(&self.key, &canonical_bytes(&input)?);
        let mut code = hex::encode_upper(tag.as_ref());
        code.truncate(CODE_LEN);
        debug!("verification code derived");
        Ok(code)
    }
}

/// Trim and uppercase a caller-supplied code; `None` unless the result is
/// exactly [`CODE_LEN`] hex characters.
pub fn normalise_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (code.len() == CODE_LEN && code.chars().all(|c| c.is_ascii_hexdigit())).then_some(code)
}

/// `{base}/verify/{code}`, tolerating a trailing slash on `base`.
pub fn verification_url(base: &str, code: &str) -> String {
    format!("{}/verify/{code}", base.trim_end_matches('/'))
}
