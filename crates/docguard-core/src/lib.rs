// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocGuard — Core types, document catalogue and error definitions shared
// across all crates.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod features;
pub mod types;

pub use catalogue::{DocumentProfile, DocumentType, MrzFormat, MrzSpec, PageGeometry, RequiredField};
pub use config::{EngineConfig, PipelineConfig, RetryPolicy};
pub use error::DocguardError;
pub use features::{SecurityFeature, SecurityFeatureMatrix};
pub use types::*;
