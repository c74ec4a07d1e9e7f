// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial and document-number generation. Randomness always comes from the
// OS CSPRNG (`ring::rand::SystemRandom`), never from a counter.

use chrono::{DateTime, Utc};
use docguard_core::error::{DocguardError, Result};
use ring::rand::{SecureRandom, SystemRandom};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random bytes appended to generated serials.
pub const SERIAL_RANDOM_BYTES: usize = 4;

/// Uppercase base-36 rendering of `n`.
pub fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// `{prefix}-{base36(now in ms)}-{HEX(random)}`.
///
/// Pure: the caller supplies the clock reading and the random bytes, so the
/// layout is testable. Use [`new_serial`] in production.
pub fn generate_serial(prefix: &str, now: DateTime<Utc>, random: &[u8]) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    format!(
        "{prefix}-{}-{}",
        base36(millis),
        hex::encode_upper(random)
    )
}

/// Fill a fresh buffer of `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| DocguardError::Rendering("system random source unavailable".into()))?;
    Ok(buf)
}

/// Serial stamped with the current time and CSPRNG bytes.
pub fn new_serial(prefix: &str) -> Result<String> {
    let random = random_bytes(SERIAL_RANDOM_BYTES)?;
    Ok(generate_serial(prefix, Utc::now(), &random))
}

/// Nine-character document number: `prefix` followed by eight random digits.
///
/// Fits the ICAO document-number field without truncation.
pub fn new_document_number(prefix: char) -> Result<String> {
    let mut number = String::with_capacity(9);
    number.push(prefix.to_ascii_uppercase());
    while number.len() < 9 {
        for byte in random_bytes(16)? {
            // Rejection sampling keeps the digits uniform.
            if byte < 250 && number.len() < 9 {
                number.push(char::from(b'0' + byte % 10));
            }
        }
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn base36_known_values() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "Z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn serial_layout() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let serial = generate_serial("PSP", now, &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(serial, "PSP-LOYW3V28-DEADBEEF");
    }

    #[test]
    fn fresh_serials_differ() {
        let a = new_serial("SID").unwrap();
        let b = new_serial("SID").unwrap();
        assert!(a.starts_with("SID-"));
        assert_ne!(a, b);
    }

    #[test]
    fn document_number_shape() {
        let number = new_document_number('a').unwrap();
        assert_eq!(number.len(), 9);
        assert!(number.starts_with('A'));
        assert!(number[1..].chars().all(|c| c.is_ascii_digit()));
    }
}
