// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocGuard Pipeline — document assembly state machine, the contracts for
// its external collaborators (verifiers, signer, artifact store), retry
// with backoff and the bounded render pool.

pub mod artifacts;
pub mod assembly;
pub mod contracts;
pub mod pool;
pub mod retry;
pub mod validation;

pub use artifacts::DirectoryArtifactStore;
pub use assembly::{DocumentPipeline, GeneratedDocument, PipelineFailure, Stage};
pub use contracts::{ApplicantVerifier, ArtifactStore, CheckOutcome, CheckRequest, DocumentSigner, SigningMetadata};
pub use pool::RenderPool;
pub use retry::{RetryDecision, classify_error, retry_with_backoff};
