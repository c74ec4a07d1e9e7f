// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request validation. Runs before any external call; nothing here does I/O.

use chrono::NaiveDate;
use docguard_core::error::{DocguardError, Result};
use docguard_core::{DocumentRequest, attr};
use docguard_document::validate_code39;
use docguard_security::luhn_valid;

/// Attributes that must hold an ISO-8601 calendar date when present.
const DATE_ATTRIBUTES: [&str; 5] = [
    attr::VALID_FROM,
    attr::VALID_UNTIL,
    attr::DATE_OF_DEATH,
    attr::DATE_OF_MARRIAGE,
    attr::DATE_OF_DIVORCE,
];

/// Validate `request` for its document type.
///
/// Missing fields are reported together in one `MissingFields` error;
/// after that the first malformed field wins.
pub fn validate(request: &DocumentRequest, issuing_state: &str, today: NaiveDate) -> Result<()> {
    let missing = request.document_type.profile().missing_fields(request);
    if !missing.is_empty() {
        return Err(DocguardError::MissingFields { fields: missing });
    }

    let personal = &request.personal;
    if !personal.nationality.trim().is_empty() {
        country_code("nationality", &personal.nationality)?;
    }
    let state = request.attribute(attr::ISSUING_STATE).unwrap_or(issuing_state);
    country_code(attr::ISSUING_STATE, state)?;

    if let Some(id_number) = personal.id_number.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        national_id(id_number, &personal.nationality)?;
    }

    if personal.date_of_birth.is_some_and(|dob| dob > today) {
        return Err(DocguardError::malformed("dateOfBirth", "date of birth is in the future"));
    }

    for key in DATE_ATTRIBUTES {
        if let Some(value) = request.attribute(key) {
            parse_date(key, value)?;
        }
    }
    if let (Some(from), Some(until)) = (request.attribute(attr::VALID_FROM), request.attribute(attr::VALID_UNTIL)) {
        if parse_date(attr::VALID_UNTIL, until)? < parse_date(attr::VALID_FROM, from)? {
            return Err(DocguardError::malformed(attr::VALID_UNTIL, "ends before validFrom"));
        }
    }

    if let Some(identifiers) = &request.identifiers {
        let number = &identifiers.document_number;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(DocguardError::malformed("documentNumber", "expected A-Z and 0-9 only"));
        }
        if let Some(serial) = &identifiers.serial {
            validate_code39("serial", serial)?;
        }
    }
    Ok(())
}

/// Parse an ISO-8601 `YYYY-MM-DD` attribute.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| DocguardError::malformed(field, format!("expected YYYY-MM-DD: {e}")))
}

fn country_code(field: &str, value: &str) -> Result<()> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(DocguardError::malformed(field, format!("expected three letters A-Z, got {value:?}")))
    }
}

/// South African identity numbers are 13 digits ending in a Luhn digit.
fn national_id(id_number: &str, nationality: &str) -> Result<()> {
    if nationality != "ZAF" {
        return Ok(());
    }
    if id_number.len() != 13 || !id_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DocguardError::malformed("idNumber", "expected 13 digits"));
    }
    if !luhn_valid(id_number) {
        return Err(DocguardError::malformed("idNumber", "check digit does not match"));
    }
    Ok(())
}
