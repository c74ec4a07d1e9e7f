// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry engine with exponential backoff + jitter for external collaborators.
//
// Classifies errors into Transient (auto-retry) and Permanent (give up).
// Timeouts are permanent: the per-call budget is already spent.

use std::future::Future;
use std::time::Duration;

use docguard_core::error::{DocguardError, Result};
use docguard_core::{ErrorClass, RetryPolicy};
use tracing::{debug, info, warn};

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry — the error is permanent.
    GiveUp(ErrorClass),
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `DocguardError` into an `ErrorClass` for retry decisions.
pub fn classify_error(err: &DocguardError) -> ErrorClass {
    match err {
        // Collaborators say whether a failure is worth another try
        DocguardError::CheckUnavailable { transient, .. } | DocguardError::Signing { transient, .. } => {
            if *transient {
                ErrorClass::Transient
            } else {
                ErrorClass::Permanent
            }
        }

        // Store unreachable or busy
        DocguardError::Database(_) => ErrorClass::Transient,
        DocguardError::Registration(_) => ErrorClass::Transient,

        // IO errors depend on the kind
        DocguardError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock => ErrorClass::Transient,
            _ => ErrorClass::Permanent,
        },

        // Permanent — bad input, rejected applicant, spent time budget
        DocguardError::MissingFields { .. }
        | DocguardError::MalformedField { .. }
        | DocguardError::InvalidCharacter { .. }
        | DocguardError::CheckFailed { .. }
        | DocguardError::CheckTimeout { .. }
        | DocguardError::SigningTimeout { .. }
        | DocguardError::Rendering(_)
        | DocguardError::Publish(_)
        | DocguardError::IntegrityMismatch { .. }
        | DocguardError::Config(_)
        | DocguardError::Serialization(_) => ErrorClass::Permanent,
    }
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &DocguardError, attempt: u32, policy: &RetryPolicy) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            info!("permanent error — not retrying");
            RetryDecision::GiveUp(ErrorClass::Permanent)
        }
        ErrorClass::Transient => {
            if attempt >= policy.max_retries {
                warn!(attempt, max = policy.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, policy);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Compute exponential backoff delay with jitter.
///
/// delay = min(base * 2^attempt + jitter, max_delay)
/// jitter is a value in [0, base) to prevent thundering herd.
fn compute_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let base_ms = policy.base_delay_ms;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
    let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
    Duration::from_millis(total_ms.min(policy.max_delay_ms))
}

/// Deterministic spread across [0, base) from the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = u64::from(attempt).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}

/// Run `call` until it succeeds, fails permanently, or the policy's retry
/// budget is spent. The last error is returned as-is.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, operation: &'static str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => match should_retry(&e, attempt, policy) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(operation, attempt, error = %e, delay_ms = delay.as_millis() as u64, "transient failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp(_) | RetryDecision::Exhausted => return Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docguard_core::CheckKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn collaborator_flag_decides_class() {
        let transient = DocguardError::Signing {
            message: "HSM busy".into(),
            transient: true,
        };
        let permanent = DocguardError::CheckUnavailable {
            check: CheckKind::Identity,
            message: "bad credentials".into(),
            transient: false,
        };
        assert_eq!(classify_error(&transient), ErrorClass::Transient);
        assert_eq!(classify_error(&permanent), ErrorClass::Permanent);
    }

    #[test]
    fn timeouts_are_not_retried() {
        let err = DocguardError::SigningTimeout { after_ms: 30_000 };
        assert_eq!(
            should_retry(&err, 0, &RetryPolicy::default()),
            RetryDecision::GiveUp(ErrorClass::Permanent)
        );
    }

    #[test]
    fn retry_respects_max() {
        let policy = RetryPolicy {
            max_retries: 3,
            ..Default::default()
        };
        let err = DocguardError::Database("locked".into());
        assert!(matches!(should_retry(&err, 0, &policy), RetryDecision::RetryAfter(_)));
        assert_eq!(should_retry(&err, 3, &policy), RetryDecision::Exhausted);
    }

    #[test]
    fn delay_increases_with_attempts() {
        let policy = RetryPolicy::default();
        let d0 = compute_delay(0, &policy);
        let d1 = compute_delay(1, &policy);
        let d2 = compute_delay(2, &policy);
        assert!(d1 > d0);
        assert!(d2 > d1);
    }

    #[test]
    fn delay_capped_at_max() {
        let policy = RetryPolicy {
            max_delay_ms: 10_000,
            ..Default::default()
        };
        assert!(compute_delay(20, &policy) <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let value = retry_with_backoff(&fast(), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DocguardError::Database("busy".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(&fast(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DocguardError::Rendering("bad page".into()))
        })
        .await;
        assert!(matches!(result, Err(DocguardError::Rendering(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_is_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(&fast(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DocguardError::Database("down".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
