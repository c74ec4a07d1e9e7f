// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for check digits, canonical hashing, verification
// codes, and audit logging in the docguard-security crate.

use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use docguard_core::DocumentType;
use docguard_security::{
    AuditEvent, CodeGenerator, IssuanceAudit, check_digit, composite_check_digit, document_hash,
};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// ICAO check digits over a document number and the full TD3 composite.
fn bench_check_digits(c: &mut Criterion) {
    c.bench_function("check_digit (document number)", |b| {
        b.iter(|| check_digit(black_box("L898902C3")).expect("valid input"));
    });
    c.bench_function("composite_check_digit (TD3)", |b| {
        b.iter(|| {
            composite_check_digit(black_box(&[
                "L898902C36",
                "7408122",
                "1204159",
                "ZE184226B<<<<<1",
            ]))
            .expect("valid input")
        });
    });
}

/// Canonical-JSON hashing at a few record sizes.
///
/// Sizes are attribute counts: a bare identity card up to a certificate
/// carrying a long list of annotations.
fn bench_document_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_hash_jcs");
    for count in [4usize, 32, 256] {
        let mut data = serde_json::Map::new();
        for i in (0..count).rev() {
            data.insert(format!("field{i:04}"), json!(format!("value-{i}")));
        }
        let data = serde_json::Value::Object(data);
        group.bench_function(format!("{count} fields"), |b| {
            b.iter(|| document_hash(black_box(&data)).expect("hash failed"));
        });
    }
    group.finish();
}

/// HMAC verification code derivation.
fn bench_verification_code(c: &mut Criterion) {
    let codes = CodeGenerator::new(b"benchmark-secret");
    let data = json!({"surname": "ERIKSSON", "givenNames": "ANNA MARIA", "number": "L898902C3"});
    let issued = Utc::now();
    c.bench_function("verification_code", |b| {
        b.iter(|| {
            codes
                .code_for(black_box(&data), DocumentType::OrdinaryPassport, issued)
                .expect("code failed")
        });
    });
}

/// Recording an audit entry to an in-memory SQLite database.
fn bench_audit_record(c: &mut Criterion) {
    c.bench_function("audit_record (in-memory SQLite)", |b| {
        // Create the database once outside the hot loop so we measure
        // steady-state insertion, not schema creation.
        let log = IssuanceAudit::open_in_memory().expect("open in-memory audit log");

        b.iter(|| {
            log.record(black_box(AuditEvent {
                document_id: "3f2b8c1e-0000-4000-8000-000000000000",
                document_type: "PASSPORT",
                stage: "rendering",
                document_hash: Some("abcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890"),
                success: true,
                details: Some("benchmark entry"),
            }))
            .expect("record failed");
        });
    });
}

criterion_group!(
    benches,
    bench_check_digits,
    bench_document_hash,
    bench_verification_code,
    bench_audit_record,
);
criterion_main!(benches);
