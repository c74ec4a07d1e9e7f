// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Check-digit engine — ICAO-9303 weighted check digits (7-3-1 cycle) and the
// Luhn algorithm for numeric national identifiers.

use docguard_core::error::{DocguardError, Result};

/// ICAO weight cycle: position 0 gets 7, position 1 gets 3, position 2 gets 1.
const WEIGHTS: [u32; 3] = [7, 3, 1];

/// Numeric value of one MRZ character: digits 0-9, `A`-`Z` 10-35, filler 0.
fn char_value(c: char, position: usize) -> Result<u32> {
    match c {
        '0'..='9' => Ok(c as u32 - '0' as u32),
        'A'..='Z' => Ok(c as u32 - 'A' as u32 + 10),
        '<' => Ok(0),
        _ => Err(DocguardError::InvalidCharacter {
            character: c,
            position,
        }),
    }
}

/// ICAO-9303 check digit of `input` (alphabet `[A-Z0-9<]`).
///
/// Fails with `InvalidCharacter` naming the first offending character and
/// its position; lowercase letters are rejected, not folded.
pub fn check_digit(input: &str) -> Result<u8> {
    let mut sum: u32 = 0;
    for (position, c) in input.chars().enumerate() {
        sum = (sum + char_value(c, position)? * WEIGHTS[position % 3]) % 10;
    }
    Ok(sum as u8)
}

/// Check digit over the concatenation of `fields`.
///
/// Each field must already include its own check digit where ICAO says so;
/// positions in a returned `InvalidCharacter` refer to the concatenation.
pub fn composite_check_digit(fields: &[&str]) -> Result<u8> {
    check_digit(&fields.concat())
}

/// Luhn check digit for the payload `digits` (check digit not included).
///
/// Doubling starts at the rightmost payload digit; doubled values above 9
/// have 9 subtracted.
pub fn luhn_check_digit(digits: &str) -> Result<u8> {
    let mut sum: u32 = 0;
    for (offset, (position, c)) in digits.char_indices().rev().enumerate() {
        let mut d = c.to_digit(10).ok_or(DocguardError::InvalidCharacter {
            character: c,
            position,
        })?;
        if offset % 2 == 0 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum = (sum + d) % 10;
    }
    Ok(((10 - sum) % 10) as u8)
}

/// Whether `number` (payload followed by its Luhn digit) is Luhn-valid.
pub fn luhn_valid(number: &str) -> bool {
    let Some(last) = number.chars().last() else {
        return false;
    };
    let payload = &number[..number.len() - last.len_utf8()];
    match (last.to_digit(10), luhn_check_digit(payload)) {
        (Some(expected), Ok(actual)) => !payload.is_empty() && expected == u32::from(actual),
        _ => false,
    }
}
