// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocguardError, Result};

/// Environment variable that overrides [`EngineConfig::hmac_secret`].
pub const HMAC_SECRET_ENV: &str = "DOCGUARD_HMAC_SECRET";

/// Process-wide settings, created once at start-up and handed to each
/// component by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for verification URLs (`{base}/verify/{code}`).
    pub verification_base_url: String,
    /// Key for verification-code HMACs. Never logged.
    pub hmac_secret: String,
    /// Office name stamped on records when the caller gives none.
    pub issuing_office: String,
    /// Officer name stamped on records when the caller gives none.
    pub issuing_officer: String,
    /// ISO 3166-1 alpha-3 code printed as the issuing state in the MRZ.
    pub issuing_state: String,
    /// SQLite file for verification records and attempts.
    pub database_path: PathBuf,
    pub pipeline: PipelineConfig,
}

/// Timeouts, retries and worker limits for the assembly pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-call bound on identity / biometric checks.
    pub check_timeout_ms: u64,
    /// Per-call bound on the external signer.
    pub signing_timeout_ms: u64,
    /// Opaque signature level handed to the signer (e.g. "PAdES-B-LT").
    pub signature_level: String,
    /// Maximum concurrent rendering jobs.
    pub render_workers: usize,
    pub retry: RetryPolicy,
}

/// Exponential backoff for transient collaborator failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verification_base_url: "https://verify.example.gov".to_owned(),
            hmac_secret: String::new(),
            issuing_office: "Head Office".to_owned(),
            issuing_officer: "System".to_owned(),
            issuing_state: "ZAF".to_owned(),
            database_path: PathBuf::from("docguard.db"),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: 10_000,
            signing_timeout_ms: 30_000,
            signature_level: "PAdES-B-T".to_owned(),
            render_workers: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl PipelineConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn signing_timeout(&self) -> Duration {
        Duration::from_millis(self.signing_timeout_ms)
    }
}

impl RetryPolicy {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl EngineConfig {
    /// Load a JSON config file, apply the environment override for the
    /// HMAC secret, and validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let mut config: EngineConfig = serde_json::from_str(&data)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Replace the HMAC secret with `DOCGUARD_HMAC_SECRET` when set.
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(HMAC_SECRET_ENV) {
            if !secret.is_empty() {
                self.hmac_secret = secret;
            }
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.hmac_secret.is_empty() {
            return Err(DocguardError::Config(format!(
                "hmac_secret is empty (set it in the config file or {HMAC_SECRET_ENV})"
            )));
        }
        if !(self.verification_base_url.starts_with("https://")
            || self.verification_base_url.starts_with("http://"))
        {
            return Err(DocguardError::Config(format!(
                "verification_base_url must be http(s): {}",
                self.verification_base_url
            )));
        }
        if self.issuing_state.len() != 3 || !self.issuing_state.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DocguardError::Config(format!(
                "issuing_state must be three letters A-Z: {}",
                self.issuing_state
            )));
        }
        if self.pipeline.render_workers == 0 {
            return Err(DocguardError::Config("render_workers must be at least 1".into()));
        }
        if self.pipeline.check_timeout_ms == 0 || self.pipeline.signing_timeout_ms == 0 {
            return Err(DocguardError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> EngineConfig {
        EngineConfig {
            hmac_secret: "test-secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn default_needs_a_secret() {
        assert!(matches!(
            EngineConfig::default().validate(),
            Err(DocguardError::Config(_))
        ));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = EngineConfig {
            verification_base_url: "ftp://verify".into(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn issuing_state_is_an_alpha3_code() {
        let config = EngineConfig {
            issuing_state: "za".into(),
            ..valid()
        };
        assert!(config.validate().is_err());
        assert_eq!(valid().issuing_state, "ZAF");
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = valid();
        config.pipeline.render_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"hmac_secret": "s", "pipeline": {"render_workers": 2}}"#)
                .unwrap();
        assert_eq!(config.pipeline.render_workers, 2);
        assert_eq!(config.pipeline.signing_timeout_ms, 30_000);
        assert_eq!(config.pipeline.retry.max_retries, 3);
    }
}
