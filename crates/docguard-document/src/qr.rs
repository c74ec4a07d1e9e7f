// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR artifact — the JSON payload printed on documents and its raster
// rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use docguard_core::error::{DocguardError, Result};
use docguard_security::hash_prefix;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Light modules around the symbol, as the QR standard asks.
pub const QUIET_ZONE: u32 = 4;

/// What a scanner reads off the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Document-type code, e.g. `PASSPORT`.
    #[serde(rename = "type")]
    pub document_type: String,
    /// Document number.
    pub id: String,
    /// Issue instant, ISO-8601.
    pub issued: String,
    /// First 16 hex characters of the document hash.
    pub hash: String,
}

impl QrPayload {
    pub fn new(type_code: &str, document_number: &str, issued_at: DateTime<Utc>, document_hash: &str) -> Self {
        Self {
            document_type: type_code.to_owned(),
            id: document_number.to_owned(),
            issued: issued_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            hash: hash_prefix(document_hash).to_owned(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Render `data` as a QR symbol, `scale` pixels per module, quiet zone
/// included. Dark modules are black on white.
pub fn render_qr(data: &str, scale: u32) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| DocguardError::Rendering(format!("QR encoding failed: {e}")))?;
    let width = code.width();
    let scale = scale.max(1);
    let side = (width as u32 + 2 * QUIET_ZONE) * scale;

    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));
    for (i, colour) in code.to_colors().into_iter().enumerate() {
        if colour != Color::Dark {
            continue;
        }
        let x = (i % width) as u32 + QUIET_ZONE;
        let y = (i / width) as u32 + QUIET_ZONE;
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at((x * scale) as i32, (y * scale) as i32).of_size(scale, scale),
            Luma([0u8]),
        );
    }
    debug!(modules = width, side, "QR rendered");
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_shape() {
        let issued = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let payload = QrPayload::new("PASSPORT", "A12345678", issued, hash);
        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "PASSPORT");
        assert_eq!(json["id"], "A12345678");
        assert_eq!(json["issued"], "2026-03-01T09:30:00Z");
        assert_eq!(json["hash"], "e3b0c44298fc1c14");
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn raster_has_quiet_zone_and_finder_pattern() {
        let img = render_qr("{\"id\":\"A12345678\"}", 2).unwrap();
        assert_eq!(img.width(), img.height());
        assert_eq!(img.width() % 2, 0);
        // Quiet zone is light.
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        // Top-left module of the finder pattern is dark.
        let q = QUIET_ZONE * 2;
        assert_eq!(img.get_pixel(q, q).0[0], 0);
        assert_eq!(img.get_pixel(q + 1, q + 1).0[0], 0);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_qr("same", 3).unwrap(), render_qr("same", 3).unwrap());
    }
}
