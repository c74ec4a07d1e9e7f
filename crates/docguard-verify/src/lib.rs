// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docguard-verify — The authoritative record of issued documents.
//
// Owns the verification-record lifecycle: registration, public lookup,
// one-way revocation and the append-only attempt log.

pub mod service;
pub mod store;

pub use service::{AuthenticityScorer, Registration, RegistrationRequest, VerificationService};
pub use store::{InsertOutcome, MemoryStore, RevokeOutcome, SqliteStore, VerificationStore};
