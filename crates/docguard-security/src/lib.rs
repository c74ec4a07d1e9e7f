// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docguard-security — Integrity primitives for issued documents.
//
// ICAO-9303 and Luhn check digits, RFC 8785 canonical hashing, keyed
// verification codes, CSPRNG-backed serials, and the append-only issuance
// audit trail.

pub mod audit;
pub mod check_digit;
pub mod codes;
pub mod integrity;
pub mod serial;

pub use audit::{AuditEntry, AuditEvent, IssuanceAudit};
pub use check_digit::{check_digit, composite_check_digit, luhn_check_digit, luhn_valid};
pub use codes::{CODE_LEN, CodeGenerator, normalise_code, verification_url};
pub use integrity::{document_hash, hash_bytes, hash_prefix, verify_document_hash};
pub use serial::{generate_serial, new_document_number, new_serial, random_bytes};
