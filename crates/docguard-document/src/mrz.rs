// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MRZ codec — ICAO-9303 machine-readable zones for TD1, TD2 and TD3.
//
// All three formats are described by one slot table per format. Encoding
// and check-digit verification both walk the same table, so a layout is
// written down exactly once.

use chrono::NaiveDate;
use docguard_core::error::{DocguardError, Result};
use docguard_core::MrzFormat;
use docguard_security::check_digit::check_digit;
use serde::Serialize;
use tracing::{instrument, warn};

/// Filler character.
pub const FILLER: char = '<';

/// What a slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    DocumentCode,
    IssuingState,
    Name,
    DocumentNumber,
    Nationality,
    DateOfBirth,
    Sex,
    Expiry,
    Optional,
    /// TD1 line-2 optional data; always filler here.
    Optional2,
    Composite,
}

impl Source {
    fn field_name(&self) -> &'static str {
        match self {
            Self::DocumentCode => "documentCode",
            Self::IssuingState => "issuingState",
            Self::Name => "name",
            Self::DocumentNumber => "documentNumber",
            Self::Nationality => "nationality",
            Self::DateOfBirth => "dateOfBirth",
            Self::Sex => "sex",
            Self::Expiry => "expiry",
            Self::Optional => "optionalData",
            Self::Optional2 => "optionalData2",
            Self::Composite => "composite",
        }
    }
}

/// One fixed-width field. `checked` appends a check digit right after it;
/// `in_composite` adds the field (and its check digit) to the composite.
#[derive(Debug, Clone, Copy)]
struct Slot {
    source: Source,
    width: usize,
    checked: bool,
    in_composite: bool,
}

const fn slot(source: Source, width: usize) -> Slot {
    Slot {
        source,
        width,
        checked: false,
        in_composite: false,
    }
}

const fn checked(source: Source, width: usize) -> Slot {
    Slot {
        source,
        width,
        checked: true,
        in_composite: true,
    }
}

const fn composite_only(source: Source, width: usize) -> Slot {
    Slot {
        source,
        width,
        checked: false,
        in_composite: true,
    }
}

use Source::*;

const TD1: &[&[Slot]] = &[
    &[
        slot(DocumentCode, 2),
        slot(IssuingState, 3),
        checked(DocumentNumber, 9),
        composite_only(Optional, 15),
    ],
    &[
        checked(DateOfBirth, 6),
        slot(Sex, 1),
        checked(Expiry, 6),
        slot(Nationality, 3),
        composite_only(Optional2, 11),
        slot(Composite, 1),
    ],
    &[slot(Name, 30)],
];

const TD2: &[&[Slot]] = &[
    &[slot(DocumentCode, 2), slot(IssuingState, 3), slot(Name, 31)],
    &[
        checked(DocumentNumber, 9),
        slot(Nationality, 3),
        checked(DateOfBirth, 6),
        slot(Sex, 1),
        checked(Expiry, 6),
        composite_only(Optional, 7),
        slot(Composite, 1),
    ],
];

const TD3: &[&[Slot]] = &[
    &[slot(DocumentCode, 2), slot(IssuingState, 3), slot(Name, 39)],
    &[
        checked(DocumentNumber, 9),
        slot(Nationality, 3),
        checked(DateOfBirth, 6),
        slot(Sex, 1),
        checked(Expiry, 6),
        checked(Optional, 14),
        slot(Composite, 1),
    ],
];

fn layout(format: MrzFormat) -> &'static [&'static [Slot]] {
    match format {
        MrzFormat::Td1 => TD1,
        MrzFormat::Td2 => TD2,
        MrzFormat::Td3 => TD3,
    }
}

/// Fields that go into a machine-readable zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MrzInput {
    /// Two-character document code, e.g. `P<`, `ID`, `V<`.
    pub document_code: String,
    pub issuing_state: String,
    pub surname: String,
    pub given_names: String,
    pub document_number: String,
    pub nationality: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<docguard_core::Sex>,
    pub expiry: Option<NaiveDate>,
    /// Personal number / optional data.
    pub optional_data: String,
}

/// A field that was cut to fit its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTruncation {
    pub field: &'static str,
    pub max_len: usize,
    pub original_len: usize,
}

/// Encoder output: the lines plus every truncation that happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzEncoding {
    pub format: MrzFormat,
    pub lines: Vec<String>,
    pub truncations: Vec<FieldTruncation>,
}

/// A check digit that does not match the field it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDigitFailure {
    pub field: &'static str,
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column of the check digit.
    pub position: usize,
    pub expected: u8,
    pub found: char,
}

// -- Field formatting ----------------------------------------------------------

/// Pad with `<` or truncate to exactly `width`, logging when data is lost.
fn fit(field: &'static str, value: String, width: usize) -> (String, Option<FieldTruncation>) {
    let original_len = value.chars().count();
    if original_len > width {
        warn!(
            target: "docguard::mrz",
            field,
            max_len = width,
            original_len,
            "MRZ field truncated"
        );
        let cut: String = value.chars().take(width).collect();
        return (
            cut,
            Some(FieldTruncation {
                field,
                max_len: width,
                original_len,
            }),
        );
    }
    let mut padded = value;
    padded.extend(std::iter::repeat_n(FILLER, width - original_len));
    (padded, None)
}

/// Uppercase `value` and keep `[A-Z0-9]`; spaces and hyphens become `<`.
fn sanitise(value: &str) -> String {
    value
        .trim()
        .to_uppercase()
        .chars()
        .filter_map(|c| match c {
            'A'..='Z' | '0'..='9' | '<' => Some(c),
            ' ' | '-' => Some(FILLER),
            _ => None,
        })
        .collect()
}

/// Words of a name: uppercased, letters only, split on spaces and hyphens.
fn name_words(value: &str) -> Vec<String> {
    value
        .to_uppercase()
        .split([' ', '-'])
        .map(|w| w.chars().filter(char::is_ascii_uppercase).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect()
}

fn joined_name(surname: &str, given_names: &str) -> String {
    let surname = name_words(surname).join("<");
    let given = name_words(given_names).join("<");
    if given.is_empty() {
        surname
    } else {
        format!("{surname}<<{given}")
    }
}

/// `SURNAME<<GIVEN<NAMES`, padded or truncated to `width`.
///
/// Uppercases, drops everything outside `A-Z`, and turns word boundaries
/// into `<`. Deterministic.
pub fn format_name(surname: &str, given_names: &str, width: usize) -> String {
    fit("name", joined_name(surname, given_names), width).0
}

/// `YYMMDD` for an ISO-8601 date (`YYYY-MM-DD`, optionally followed by a
/// time part). Only the last two year digits survive; no century is
/// inferred when reading them back.
pub fn format_date(iso_date: &str) -> Result<String> {
    let date_part = iso_date.trim().get(..10).unwrap_or(iso_date.trim());
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| DocguardError::malformed("date", format!("{iso_date:?}: {e}")))?;
    Ok(mrz_date(date))
}

fn mrz_date(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

// -- Encoding -------------------------------------------------------------------

fn slot_value(input: &MrzInput, source: Source) -> String {
    match source {
        DocumentCode => sanitise(&input.document_code),
        IssuingState => sanitise(&input.issuing_state),
        Name => joined_name(&input.surname, &input.given_names),
        DocumentNumber => sanitise(&input.document_number),
        Nationality => sanitise(&input.nationality),
        DateOfBirth => input.date_of_birth.map(mrz_date).unwrap_or_default(),
        Sex => input.sex.map(|s| s.mrz_char().to_string()).unwrap_or_default(),
        Expiry => input.expiry.map(mrz_date).unwrap_or_default(),
        Optional => sanitise(&input.optional_data),
        Optional2 | Composite => String::new(),
    }
}

fn digit_char(d: u8) -> char {
    char::from(b'0' + d)
}

/// Encode `input` in `format`.
///
/// Oversized fields are truncated (and reported), never rejected.
#[instrument(skip(input), fields(document_code = %input.document_code))]
pub fn encode(format: MrzFormat, input: &MrzInput) -> Result<MrzEncoding> {
    let mut lines = Vec::with_capacity(format.line_count());
    let mut truncations = Vec::new();
    let mut composite = String::new();

    for slots in layout(format) {
        let mut line = String::with_capacity(format.line_length());
        for slot in *slots {
            if slot.source == Composite {
                line.push(digit_char(check_digit(&composite)?));
                continue;
            }
            let (value, truncated) = fit(slot.source.field_name(), slot_value(input, slot.source), slot.width);
            truncations.extend(truncated);
            line.push_str(&value);
            if slot.in_composite {
                composite.push_str(&value);
            }
            if slot.checked {
                let digit = digit_char(check_digit(&value)?);
                line.push(digit);
                if slot.in_composite {
                    composite.push(digit);
                }
            }
        }
        lines.push(line);
    }

    Ok(MrzEncoding {
        format,
        lines,
        truncations,
    })
}

// -- Verification ---------------------------------------------------------------

/// Re-derive every embedded check digit (composite included) and report the
/// ones that do not match.
///
/// Fails only when the lines have the wrong shape for `format` or contain
/// characters outside `[A-Z0-9<]`.
pub fn verify_mrz(format: MrzFormat, lines: &[impl AsRef<str>]) -> Result<Vec<CheckDigitFailure>> {
    let table = layout(format);
    if lines.len() != table.len() {
        return Err(DocguardError::malformed(
            "mrz",
            format!("expected {} lines, got {}", table.len(), lines.len()),
        ));
    }

    let mut failures = Vec::new();
    let mut composite = String::new();

    for (line_no, (slots, line)) in table.iter().zip(lines).enumerate() {
        let chars: Vec<char> = line.as_ref().chars().collect();
        if chars.len() != format.line_length() {
            return Err(DocguardError::malformed(
                "mrz",
                format!(
                    "line {} has {} characters, expected {}",
                    line_no + 1,
                    chars.len(),
                    format.line_length()
                ),
            ));
        }
        if let Some((position, &character)) = chars
            .iter()
            .enumerate()
            .find(|(_, c)| !matches!(c, 'A'..='Z' | '0'..='9' | '<'))
        {
            return Err(DocguardError::InvalidCharacter {
                character,
                position,
            });
        }

        let mut col = 0;
        for slot in *slots {
            if slot.source == Composite {
                let expected = check_digit(&composite)?;
                record_mismatch(&mut failures, Composite.field_name(), line_no, col, expected, chars[col]);
                col += 1;
                continue;
            }
            let value: String = chars[col..col + slot.width].iter().collect();
            col += slot.width;
            if slot.in_composite {
                composite.push_str(&value);
            }
            if slot.checked {
                let expected = check_digit(&value)?;
                record_mismatch(&mut failures, slot.source.field_name(), line_no, col, expected, chars[col]);
                if slot.in_composite {
                    composite.push(chars[col]);
                }
                col += 1;
            }
        }
    }

    Ok(failures)
}

fn record_mismatch(
    failures: &mut Vec<CheckDigitFailure>,
    field: &'static str,
    line: usize,
    position: usize,
    expected: u8,
    found: char,
) {
    if found != digit_char(expected) {
        failures.push(CheckDigitFailure {
            field,
            line,
            position,
            expected,
            found,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn anna(document_code: &str, document_number: &str, optional: &str) -> MrzInput {
        MrzInput {
            document_code: document_code.into(),
            issuing_state: "UTO".into(),
            surname: "Eriksson".into(),
            given_names: "Anna Maria".into(),
            document_number: document_number.into(),
            nationality: "UTO".into(),
            date_of_birth: date(1974, 8, 12),
            sex: Some(docguard_core::Sex::Female),
            expiry: date(2012, 4, 15),
            optional_data: optional.into(),
        }
    }

    #[test]
    fn td3_matches_icao_specimen() {
        let enc = encode(MrzFormat::Td3, &anna("P<", "L898902C3", "ZE184226B")).unwrap();
        assert_eq!(
            enc.lines,
            vec![
                "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<",
                "L898902C36UTO7408122F1204159ZE184226B<<<<<10",
            ]
        );
        assert!(enc.truncations.is_empty());
    }

    #[test]
    fn td2_matches_icao_specimen() {
        let enc = encode(MrzFormat::Td2, &anna("I<", "D23145890", "")).unwrap();
        assert_eq!(
            enc.lines,
            vec![
                "I<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<",
                "D231458907UTO7408122F1204159<<<<<<<6",
            ]
        );
    }

    #[test]
    fn td1_matches_icao_specimen() {
        let enc = encode(MrzFormat::Td1, &anna("I<", "D23145890", "")).unwrap();
        assert_eq!(
            enc.lines,
            vec![
                "I<UTOD231458907<<<<<<<<<<<<<<<",
                "7408122F1204159UTO<<<<<<<<<<<6",
                "ERIKSSON<<ANNA<MARIA<<<<<<<<<<",
            ]
        );
    }

    #[test]
    fn lines_have_exact_length_and_alphabet() {
        for format in [MrzFormat::Td1, MrzFormat::Td2, MrzFormat::Td3] {
            let mut input = anna("P<", "A1234567", "8001015009087");
            input.surname = "van der Merwe-Smith".into();
            input.given_names = "Thabo Sizwe Johannes Alexander".into();
            let enc = encode(format, &input).unwrap();
            assert_eq!(enc.lines.len(), format.line_count());
            for line in &enc.lines {
                assert_eq!(line.len(), format.line_length(), "{format:?}: {line}");
                assert!(line.chars().all(|c| matches!(c, 'A'..='Z' | '0'..='9' | '<')));
            }
            assert!(verify_mrz(format, &enc.lines).unwrap().is_empty(), "{format:?}");
        }
    }

    #[test]
    fn corrupting_a_field_flags_its_digit_and_the_composite() {
        let enc = encode(MrzFormat::Td3, &anna("P<", "L898902C3", "ZE184226B")).unwrap();
        let mut line2: Vec<char> = enc.lines[1].chars().collect();
        // Birth year 74 -> 75.
        line2[14] = '5';
        let corrupted = vec![enc.lines[0].clone(), line2.into_iter().collect::<String>()];

        let failures = verify_mrz(MrzFormat::Td3, &corrupted).unwrap();
        let fields: Vec<&str> = failures.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["dateOfBirth", "composite"]);
        assert_eq!(failures[0].position, 19);
        assert_eq!(failures[0].found, '2');
    }

    #[test]
    fn corrupting_a_field_outside_the_composite_flags_nothing_else() {
        let enc = encode(MrzFormat::Td3, &anna("P<", "L898902C3", "ZE184226B")).unwrap();
        // Nationality is not covered by any check digit.
        let line2 = enc.lines[1].replacen("UTO", "UTA", 1);
        let failures = verify_mrz(MrzFormat::Td3, &[enc.lines[0].clone(), line2]).unwrap();
        assert!(failures.is_empty());
    }

    #[test]
    fn verify_rejects_wrong_shape_and_alphabet() {
        assert!(matches!(
            verify_mrz(MrzFormat::Td3, &["P<UTO"]),
            Err(DocguardError::MalformedField { .. })
        ));
        let bad = "p".repeat(44);
        assert!(matches!(
            verify_mrz(MrzFormat::Td3, &[bad.as_str(), bad.as_str()]),
            Err(DocguardError::InvalidCharacter { character: 'p', position: 0 })
        ));
    }

    #[test]
    fn long_fields_are_truncated_and_reported() {
        let mut input = anna("P<", "AB12345678901", "");
        input.surname = "Wolfeschlegelsteinhausenbergerdorff".into();
        let enc = encode(MrzFormat::Td2, &input).unwrap();
        let fields: Vec<&str> = enc.truncations.iter().map(|t| t.field).collect();
        assert_eq!(fields, vec!["name", "documentNumber"]);
        assert_eq!(enc.truncations[1].max_len, 9);
        assert_eq!(enc.truncations[1].original_len, 13);
        assert!(enc.lines[1].starts_with("AB1234567"));
        assert!(verify_mrz(MrzFormat::Td2, &enc.lines).unwrap().is_empty());
    }

    #[test]
    fn format_name_examples() {
        let name = format_name("van der Merwe", "Thabo Sizwe", 39);
        assert_eq!(name, "VAN<DER<MERWE<<THABO<SIZWE<<<<<<<<<<<<<");
        assert_eq!(name.len(), 39);
        assert_eq!(format_name("O'Brien", "Seán", 12), "OBRIEN<<SEN<");
        assert_eq!(format_name("Smith-Jones", "", 12), "SMITH<JONES<");
        assert_eq!(format_name("Eriksson", "Anna", 8), "ERIKSSON");
        assert_eq!(
            format_name("van der Merwe", "Thabo Sizwe", 39),
            format_name("van der Merwe", "Thabo Sizwe", 39)
        );
    }

    #[test]
    fn format_date_examples() {
        assert_eq!(format_date("1974-08-12").unwrap(), "740812");
        assert_eq!(format_date("2012-04-05T10:00:00Z").unwrap(), "120405");
        // No century survives: 1912 and 2012 encode identically.
        assert_eq!(format_date("1912-04-05").unwrap(), format_date("2012-04-05").unwrap());
        assert!(format_date("12/04/2012").is_err());
        assert!(format_date("2012-02-30").is_err());
    }

    #[test]
    fn missing_dates_and_sex_are_filler() {
        let mut input = anna("P<", "L898902C3", "");
        input.date_of_birth = None;
        input.sex = None;
        let enc = encode(MrzFormat::Td3, &input).unwrap();
        assert_eq!(&enc.lines[1][13..21], "<<<<<<0<");
        assert!(verify_mrz(MrzFormat::Td3, &enc.lines).unwrap().is_empty());
    }
}
