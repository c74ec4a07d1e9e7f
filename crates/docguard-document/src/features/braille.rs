// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Six-dot braille transliteration (uncontracted) for tactile markings.
//
// A cell is a bitmask with bit n-1 set when dot n is raised. Dots 1-3 run
// down the left column, 4-6 down the right.

/// Numeric indicator, dots 3-4-5-6.
pub const NUMBER_SIGN: u8 = 0b11_1100;

/// Letter indicator after digits, dots 5-6.
pub const LETTER_SIGN: u8 = 0b11_0000;

/// Cells for `a`..`j`; digits 1-9,0 reuse them.
const FIRST_DECADE: [u8; 10] = [
    0b00_0001, // a 1
    0b00_0011, // b 12
    0b00_1001, // c 14
    0b01_1001, // d 145
    0b01_0001, // e 15
    0b00_1011, // f 124
    0b01_1011, // g 1245
    0b01_0011, // h 125
    0b00_1010, // i 24
    0b01_1010, // j 245
];

/// Dot 3.
const DOT3: u8 = 0b00_0100;
/// Dots 3 and 6.
const DOT36: u8 = 0b10_0100;

fn letter(c: char) -> Option<u8> {
    let i = (c as u8).checked_sub(b'A')? as usize;
    match c {
        'A'..='J' => Some(FIRST_DECADE[i]),
        'K'..='T' => Some(FIRST_DECADE[i - 10] | DOT3),
        'W' => Some(0b11_1010),
        'U' | 'V' => Some(FIRST_DECADE[i - 20] | DOT36),
        'X' | 'Y' | 'Z' => Some(FIRST_DECADE[i - 21] | DOT36),
        _ => None,
    }
}

fn digit(c: char) -> Option<u8> {
    match c {
        '1'..='9' => Some(FIRST_DECADE[(c as u8 - b'1') as usize]),
        '0' => Some(FIRST_DECADE[9]),
        _ => None,
    }
}

/// Transliterate `text` into cells. Letters are case-folded; a number sign
/// opens each run of digits, and a letter sign separates digits from a
/// following `a`-`j`. Anything else becomes a blank cell.
pub fn cells(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    let mut numeric = false;
    for c in text.chars().map(|c| c.to_ascii_uppercase()) {
        if let Some(cell) = digit(c) {
            if !numeric {
                out.push(NUMBER_SIGN);
                numeric = true;
            }
            out.push(cell);
        } else if let Some(cell) = letter(c) {
            if numeric && ('A'..='J').contains(&c) {
                out.push(LETTER_SIGN);
            }
            numeric = false;
            out.push(cell);
        } else {
            numeric = false;
            out.push(0);
        }
    }
    out
}

/// Whether dot `n` (1-6) is raised in `cell`.
pub fn has_dot(cell: u8, n: u8) -> bool {
    (1..=6).contains(&n) && cell & (1 << (n - 1)) != 0
}
