// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Code 39 linear barcode for serials and document numbers.
//
// Each character is nine elements (five bars, four spaces), three of them
// wide. Wide elements are three modules, narrow ones one; characters are
// separated by a one-module gap and framed by `*` start/stop characters.

use docguard_core::error::{DocguardError, Result};

/// Element widths per character, bar first; `1` marks a wide element.
const PATTERNS: &[(char, &str)] = &[
    ('0', "000110100"),
    ('1', "100100001"),
    ('2', "001100001"),
    ('3', "101100000"),
    ('4', "000110001"),
    ('5', "100110000"),
    ('6', "001110000"),
    ('7', "000100101"),
    ('8', "100100100"),
    ('9', "001100100"),
    ('A', "100001001"),
    ('B', "001001001"),
    ('C', "101001000"),
    ('D', "000011001"),
    ('E', "100011000"),
    ('F', "001011000"),
    ('G', "000001101"),
    ('H', "100001100"),
    ('I', "001001100"),
    ('J', "000011100"),
    ('K', "100000011"),
    ('L', "001000011"),
    ('M', "101000010"),
    ('N', "000010011"),
    ('O', "100010010"),
    ('P', "001010010"),
    ('Q', "000000111"),
    ('R', "100000110"),
    ('S', "001000110"),
    ('T', "000010110"),
    ('U', "110000001"),
    ('V', "011000001"),
    ('W', "111000000"),
    ('X', "010010001"),
    ('Y', "110010000"),
    ('Z', "011010000"),
    ('-', "010000101"),
    ('.', "110000100"),
    (' ', "011000100"),
    ('$', "010101000"),
    ('/', "010100010"),
    ('+', "010001010"),
    ('%', "000101010"),
];

const START_STOP: &str = "010010100";

/// Modules per character (six narrow + three wide elements).
pub const MODULES_PER_CHAR: usize = 15;

/// Longest payload that still fits the barcode strip at minimum module width.
pub const MAX_CODE39_LEN: usize = 48;

fn pattern(c: char) -> Option<&'static str> {
    PATTERNS.iter().find(|(k, _)| *k == c).map(|(_, p)| *p)
}

fn push_pattern(modules: &mut Vec<bool>, pattern: &str) {
    for (i, element) in pattern.chars().enumerate() {
        let bar = i % 2 == 0;
        let width = if element == '1' { 3 } else { 1 };
        modules.extend(std::iter::repeat_n(bar, width));
    }
}

/// Check that `data` can be printed as a Code 39 symbol.
///
/// Failures are reported as `MalformedField` against `field`. Lowercase
/// letters are accepted since encoding folds them.
pub fn validate_code39(field: &str, data: &str) -> Result<()> {
    if data.is_empty() {
        return Err(DocguardError::malformed(field, "empty Code 39 payload"));
    }
    let len = data.chars().count();
    if len > MAX_CODE39_LEN {
        return Err(DocguardError::malformed(
            field,
            format!("{len} characters exceeds the Code 39 limit of {MAX_CODE39_LEN}"),
        ));
    }
    if let Some((position, c)) = data
        .chars()
        .enumerate()
        .find(|(_, c)| pattern(c.to_ascii_uppercase()).is_none())
    {
        return Err(DocguardError::malformed(
            field,
            format!("character {c:?} at position {position} is outside the Code 39 set"),
        ));
    }
    Ok(())
}

/// Module sequence for `data` (`true` = bar), start/stop included.
///
/// Input is checked with [`validate_code39`] first.
pub fn encode_code39(data: &str) -> Result<Vec<bool>> {
    validate_code39("barcode", data)?;
    let mut modules = Vec::with_capacity((data.len() + 2) * (MODULES_PER_CHAR + 1));
    push_pattern(&mut modules, START_STOP);
    for c in data.chars() {
        let p = pattern(c.to_ascii_uppercase())
            .ok_or_else(|| DocguardError::malformed("barcode", format!("no Code 39 pattern for {c:?}")))?;
        modules.push(false);
        push_pattern(&mut modules, p);
    }
    modules.push(false);
    push_pattern(&mut modules, START_STOP);
    Ok(modules)
}

/// Runs of consecutive bars as `(start_module, width_in_modules)`.
pub fn bar_runs(modules: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &bar) in modules.iter().enumerate() {
        match (bar, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_has_three_wide_elements() {
        for (c, p) in PATTERNS.iter().chain([&('*', START_STOP)]) {
            assert_eq!(p.len(), 9, "{c}");
            assert_eq!(p.chars().filter(|e| *e == '1').count(), 3, "{c}");
        }
    }

    #[test]
    fn symbol_length() {
        let data = "PSP-LOYW3V28-DEADBEEF";
        let modules = encode_code39(data).unwrap();
        let chars = data.len() + 2;
        assert_eq!(modules.len(), chars * MODULES_PER_CHAR + chars - 1);
        // Starts and ends on a bar.
        assert!(modules[0]);
        assert!(*modules.last().unwrap());
    }

    #[test]
    fn each_character_has_five_bars() {
        let modules = encode_code39("A1").unwrap();
        assert_eq!(bar_runs(&modules).len(), 5 * 4);
    }

    #[test]
    fn lowercase_folds_and_invalid_rejected() {
        assert_eq!(encode_code39("abc").unwrap(), encode_code39("ABC").unwrap());
        match encode_code39("AB#").unwrap_err() {
            DocguardError::MalformedField { field, reason } => {
                assert_eq!(field, "barcode");
                assert!(reason.contains("Code 39"), "{reason}");
                assert!(reason.contains("position 2"), "{reason}");
                assert!(!reason.contains("MRZ"), "{reason}");
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn validation_names_the_field_and_bounds_length() {
        assert!(validate_code39("serial", "PSP-LOYW3V28-DEADBEEF").is_ok());
        assert!(validate_code39("serial", &"A".repeat(MAX_CODE39_LEN)).is_ok());
        let long = "A".repeat(MAX_CODE39_LEN + 1);
        for bad in ["", "PSP_0001", long.as_str()] {
            assert!(matches!(
                validate_code39("serial", bad),
                Err(DocguardError::MalformedField { ref field, .. }) if field == "serial"
            ));
        }
    }

    #[test]
    fn bar_runs_of_simple_sequence() {
        let runs = bar_runs(&[true, true, false, true, false, false, true]);
        assert_eq!(runs, vec![(0, 2), (3, 1), (6, 1)]);
    }
}
