// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docguard-document — Everything that ends up on the page.
//
// Provides the ICAO-9303 MRZ codec, the drawing surface contract with its
// PDF implementation, the security feature layering engine, and the QR,
// barcode and ghost-portrait artefacts the features draw.

pub mod barcode;
pub mod features;
pub mod mrz;
pub mod pdf;
pub mod portrait;
pub mod qr;
pub mod render;
pub mod surface;

// Re-export the primary entry points so callers can use `docguard_document::encode` etc.
pub use barcode::{MAX_CODE39_LEN, encode_code39, validate_code39};
pub use features::{ContentInput, FeatureContent, Layer, apply_features, feature_area, renderer};
pub use mrz::{CheckDigitFailure, FieldTruncation, MrzEncoding, MrzInput, encode, format_date, format_name, verify_mrz};
pub use pdf::PdfWriter;
pub use qr::QrPayload;
pub use render::{RenderedDocument, render_document, render_pdf};
pub use surface::{Colour, DrawCommand, Font, Point, RecordingSurface, Rect, Stroke, Surface};
