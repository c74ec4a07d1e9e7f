// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Security feature layering engine.
//
// `apply_features` walks the document type's feature matrix in layering
// order and hands each enabled feature to exactly one renderer, together
// with the rectangle the layout table assigns it. Renderers only draw; given
// the same surface state, area and content they emit the same commands.

mod background;
pub mod braille;
mod machine;
mod overlay;
mod rng;

use chrono::{DateTime, Utc};
use docguard_core::error::Result;
use docguard_core::{DocumentProfile, DocumentType, PageGeometry, SecurityFeature};
use image::{DynamicImage, RgbImage};
use tracing::{debug, instrument};

use crate::barcode::{encode_code39, validate_code39};
use crate::portrait::ghost_portrait;
use crate::qr::{QrPayload, render_qr};
use crate::surface::{Rect, Surface};

pub use rng::fnv1a;

/// Pixels per QR module in the prepared raster.
const QR_SCALE: u32 = 4;

/// Everything a renderer may draw from.
///
/// Built once per document by [`FeatureContent::prepare`]; derived artefacts
/// (QR raster, barcode modules, ghost portrait) are computed there so that
/// rendering itself cannot fail.
#[derive(Debug, Clone)]
pub struct FeatureContent {
    pub document_type: DocumentType,
    pub document_number: String,
    pub serial: String,
    pub holder_name: String,
    pub issued_at: DateTime<Utc>,
    pub mrz_lines: Vec<String>,
    pub qr_payload: QrPayload,
    qr_image: RgbImage,
    barcode: Vec<bool>,
    portrait: Option<RgbImage>,
    seed: u64,
}

/// Inputs to [`FeatureContent::prepare`].
#[derive(Debug, Clone)]
pub struct ContentInput<'a> {
    pub document_type: DocumentType,
    pub document_number: &'a str,
    pub serial: &'a str,
    pub holder_name: &'a str,
    pub issued_at: DateTime<Utc>,
    /// Full SHA-256 hex of the document data; the QR carries its prefix.
    pub document_hash: &'a str,
    pub mrz_lines: Vec<String>,
    /// Encoded applicant photo for the ghost image.
    pub photo: Option<&'a [u8]>,
}

impl FeatureContent {
    #[instrument(skip_all, fields(document_type = %input.document_type))]
    pub fn prepare(input: ContentInput<'_>) -> Result<Self> {
        let profile = input.document_type.profile();
        let qr_payload = QrPayload::new(
            profile.code,
            input.document_number,
            input.issued_at,
            input.document_hash,
        );
        let qr_image = DynamicImage::ImageLuma8(render_qr(&qr_payload.to_json()?, QR_SCALE)?).to_rgb8();
        validate_code39("serial", input.serial)?;
        let barcode = encode_code39(input.serial)?;
        let portrait = input.photo.map(ghost_portrait).transpose()?;
        debug!(
            barcode_modules = barcode.len(),
            qr_px = qr_image.width(),
            has_portrait = portrait.is_some(),
            "feature content prepared"
        );

        Ok(Self {
            document_type: input.document_type,
            document_number: input.document_number.to_owned(),
            serial: input.serial.to_owned(),
            holder_name: input.holder_name.to_owned(),
            issued_at: input.issued_at,
            mrz_lines: input.mrz_lines,
            qr_payload,
            qr_image,
            barcode,
            portrait,
            seed: fnv1a(input.serial.as_bytes()) ^ fnv1a(input.document_number.as_bytes()).rotate_left(17),
        })
    }

    pub fn profile(&self) -> DocumentProfile {
        self.document_type.profile()
    }

    pub fn barcode_modules(&self) -> &[bool] {
        &self.barcode
    }

    pub fn qr_image(&self) -> &RgbImage {
        &self.qr_image
    }

    pub fn portrait(&self) -> Option<&RgbImage> {
        self.portrait.as_ref()
    }

    /// Per-document seed for patterned features.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Draws one feature into its area.
pub type Renderer = fn(&mut dyn Surface, Rect, &FeatureContent);

/// The renderer registered for `feature`.
pub fn renderer(feature: SecurityFeature) -> Renderer {
    use SecurityFeature::*;
    match feature {
        Guilloche => background::guilloche,
        RainbowPrinting => background::rainbow_printing,
        VoidPantograph => background::void_pantograph,
        AntiCopy => background::anti_copy,
        Watermark => background::watermark,
        InvisibleFibers => background::invisible_fibers,
        SecurityThread => overlay::security_thread,
        Microtext => overlay::microtext,
        UvMarker => overlay::uv_marker,
        Thermochromic => overlay::thermochromic,
        Metameric => overlay::metameric,
        Holographic => overlay::holographic,
        Retroreflective => overlay::retroreflective,
        GhostImage => overlay::ghost_image,
        EmbossedSeal => overlay::embossed_seal,
        Perforation => overlay::perforation,
        Braille => machine::braille,
        Mrz => machine::mrz,
        Barcode => machine::barcode,
        QrCode => machine::qr_code,
    }
}

/// Where a feature goes, as fractions of the page: (x, y, width, height).
fn placement(feature: SecurityFeature) -> (f32, f32, f32, f32) {
    use SecurityFeature::*;
    match feature {
        Guilloche | VoidPantograph | AntiCopy | InvisibleFibers => (0.0, 0.0, 1.0, 1.0),
        RainbowPrinting => (0.0, 0.0, 1.0, 0.06),
        Watermark => (0.1, 0.3, 0.8, 0.3),
        SecurityThread => (0.66, 0.0, 0.015, 1.0),
        Microtext => (0.03, 0.155, 0.6, 0.02),
        UvMarker => (0.40, 0.22, 0.22, 0.16),
        Thermochromic => (0.40, 0.42, 0.10, 0.08),
        Metameric => (0.52, 0.42, 0.10, 0.08),
        Holographic => (0.70, 0.08, 0.26, 0.20),
        Retroreflective => (0.03, 0.60, 0.30, 0.08),
        GhostImage => (0.72, 0.30, 0.22, 0.30),
        EmbossedSeal => (0.40, 0.52, 0.22, 0.18),
        Perforation => (0.975, 0.08, 0.02, 0.55),
        Braille => (0.70, 0.62, 0.27, 0.07),
        Mrz => (0.02, 0.78, 0.96, 0.20),
        Barcode => (0.03, 0.70, 0.45, 0.07),
        QrCode => (0.52, 0.60, 0.16, 0.16),
    }
}

/// The rectangle `feature` occupies on a page of the given size.
pub fn feature_area(feature: SecurityFeature, page: PageGeometry) -> Rect {
    let (fx, fy, fw, fh) = placement(feature);
    Rect::page(page).fraction(fx, fy, fw, fh)
}

/// Where the holder's printed data goes (not a security feature).
pub fn data_area(page: PageGeometry) -> Rect {
    Rect::page(page).fraction(0.03, 0.18, 0.35, 0.40)
}

/// Where the document title goes.
pub fn title_area(page: PageGeometry) -> Rect {
    Rect::page(page).fraction(0.03, 0.065, 0.62, 0.08)
}

/// Background patterns go under the printed data, everything else on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Background,
    Foreground,
}

impl Layer {
    pub fn of(feature: SecurityFeature) -> Self {
        use SecurityFeature::*;
        match feature {
            Guilloche | RainbowPrinting | VoidPantograph | AntiCopy | Watermark | InvisibleFibers => {
                Self::Background
            }
            _ => Self::Foreground,
        }
    }
}

/// Draw one feature at its layout position.
pub fn render_feature(surface: &mut dyn Surface, feature: SecurityFeature, content: &FeatureContent) {
    let area = feature_area(feature, surface.page());
    renderer(feature)(surface, area, content);
}

/// Apply the enabled features of one layer, in layering order.
pub fn apply_layer(
    surface: &mut dyn Surface,
    document_type: DocumentType,
    content: &FeatureContent,
    layer: Layer,
) -> Vec<SecurityFeature> {
    let matrix = document_type.profile().features;
    let mut applied = Vec::new();
    for feature in matrix.enabled().into_iter().filter(|f| Layer::of(*f) == layer) {
        render_feature(surface, feature, content);
        debug!(%feature, "security feature applied");
        applied.push(feature);
    }
    applied
}

/// Apply every feature enabled for `document_type`, returning them in the
/// order they were drawn.
#[instrument(skip_all, fields(%document_type))]
pub fn apply_features(
    surface: &mut dyn Surface,
    document_type: DocumentType,
    content: &FeatureContent,
) -> Vec<SecurityFeature> {
    let mut applied = apply_layer(surface, document_type, content, Layer::Background);
    applied.extend(apply_layer(surface, document_type, content, Layer::Foreground));
    applied
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use docguard_core::error::DocguardError;
    use crate::surface::RecordingSurface;
    use chrono::TimeZone;

    pub(crate) fn sample_content(document_type: DocumentType) -> FeatureContent {
        FeatureContent::prepare(ContentInput {
            document_type,
            document_number: "P12345678",
            serial: "PSP-LOYW3V28-DEADBEEF",
            holder_name: "ERIKSSON, Anna Maria",
            issued_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            document_hash: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            mrz_lines: vec![
                "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<".into(),
                "L898902C36UTO7408122F1204159ZE184226B<<<<<10".into(),
            ],
            photo: None,
        })
        .unwrap()
    }

    #[test]
    fn every_renderer_stays_in_its_area_and_draws() {
        let content = sample_content(DocumentType::OrdinaryPassport);
        for page in [PageGeometry::ID1_CARD, PageGeometry::PASSPORT_PAGE, PageGeometry::A4] {
            for feature in SecurityFeature::ALL {
                let area = feature_area(feature, page);
                let mut surface = RecordingSurface::new(page);
                renderer(feature)(&mut surface, area, &content);
                assert!(!surface.commands.is_empty(), "{feature} drew nothing on {page:?}");
                assert!(surface.stays_within(area), "{feature} left {area:?} on {page:?}");
            }
        }
    }

    #[test]
    fn renderers_are_idempotent() {
        let content = sample_content(DocumentType::SmartIdCard);
        let area = Rect::new(5.0, 5.0, 40.0, 20.0);
        for feature in SecurityFeature::ALL {
            let mut first = RecordingSurface::new(PageGeometry::ID1_CARD);
            let mut second = RecordingSurface::new(PageGeometry::ID1_CARD);
            renderer(feature)(&mut first, area, &content);
            renderer(feature)(&mut second, area, &content);
            assert_eq!(first.commands, second.commands, "{feature}");
        }
    }

    #[test]
    fn feature_areas_lie_on_the_page() {
        for page in [PageGeometry::ID1_CARD, PageGeometry::A4] {
            let whole = Rect::page(page);
            for feature in SecurityFeature::ALL {
                let area = feature_area(feature, page);
                assert!(area.width > 0.0 && area.height > 0.0, "{feature}");
                assert!(area.corners().iter().all(|p| whole.contains(*p)), "{feature}");
            }
        }
    }

    #[test]
    fn apply_follows_the_matrix_in_layering_order() {
        for document_type in DocumentType::ALL {
            let content = sample_content(document_type);
            let mut surface = RecordingSurface::new(document_type.profile().page);
            let applied = apply_features(&mut surface, document_type, &content);
            let expected = document_type.profile().features.enabled();
            let mut sorted = applied.clone();
            sorted.sort();
            assert_eq!(sorted, expected, "{document_type:?}");
            // Background first, then foreground; declaration order within each.
            let split = applied.iter().position(|f| Layer::of(*f) == Layer::Foreground).unwrap_or(applied.len());
            assert!(applied[..split].iter().all(|f| Layer::of(*f) == Layer::Background));
            assert!(applied[split..].iter().all(|f| Layer::of(*f) == Layer::Foreground));
            assert!(applied.windows(2).all(|w| Layer::of(w[0]) != Layer::of(w[1]) || w[0] < w[1]));
        }
    }

    #[test]
    fn same_content_same_output() {
        let content = sample_content(DocumentType::GeneralWorkVisa);
        let mut a = RecordingSurface::new(PageGeometry::ID2_CARD);
        let mut b = RecordingSurface::new(PageGeometry::ID2_CARD);
        apply_features(&mut a, DocumentType::GeneralWorkVisa, &content);
        apply_features(&mut b, DocumentType::GeneralWorkVisa, &content);
        assert_eq!(a.commands, b.commands);
    }

    #[test]
    fn different_serials_change_the_patterns() {
        let a = sample_content(DocumentType::OrdinaryPassport);
        let mut b = a.clone();
        b.seed ^= 0xDEAD_BEEF;
        let area = feature_area(SecurityFeature::InvisibleFibers, PageGeometry::PASSPORT_PAGE);
        let mut sa = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        let mut sb = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        renderer(SecurityFeature::InvisibleFibers)(&mut sa, area, &a);
        renderer(SecurityFeature::InvisibleFibers)(&mut sb, area, &b);
        assert_ne!(sa.commands, sb.commands);
    }

    #[test]
    fn prepare_rejects_unencodable_serial() {
        let err = FeatureContent::prepare(ContentInput {
            document_type: DocumentType::SmartIdCard,
            document_number: "I12345678",
            serial: "SID#1",
            holder_name: "X",
            issued_at: Utc::now(),
            document_hash: "00",
            mrz_lines: Vec::new(),
            photo: None,
        })
        .unwrap_err();
        assert!(matches!(err, DocguardError::MalformedField { ref field, .. } if field == "serial"));
    }
}
