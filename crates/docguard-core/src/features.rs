// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Security features and the per-document-type feature matrix.

use serde::{Deserialize, Serialize};

/// Every tamper-evident feature the layering engine knows how to draw.
///
/// Declaration order is layering order: background patterns first, then
/// overlays, then machine-readable elements on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecurityFeature {
    Guilloche,
    RainbowPrinting,
    VoidPantograph,
    AntiCopy,
    Watermark,
    InvisibleFibers,
    SecurityThread,
    Microtext,
    UvMarker,
    Thermochromic,
    Metameric,
    Holographic,
    Retroreflective,
    GhostImage,
    EmbossedSeal,
    Perforation,
    Braille,
    Mrz,
    Barcode,
    QrCode,
}

impl SecurityFeature {
    /// All features in layering order.
    pub const ALL: [SecurityFeature; 20] = [
        Self::Guilloche,
        Self::RainbowPrinting,
        Self::VoidPantograph,
        Self::AntiCopy,
        Self::Watermark,
        Self::InvisibleFibers,
        Self::SecurityThread,
        Self::Microtext,
        Self::UvMarker,
        Self::Thermochromic,
        Self::Metameric,
        Self::Holographic,
        Self::Retroreflective,
        Self::GhostImage,
        Self::EmbossedSeal,
        Self::Perforation,
        Self::Braille,
        Self::Mrz,
        Self::Barcode,
        Self::QrCode,
    ];

    /// Stable human-readable name, used in summaries and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Guilloche => "guilloche",
            Self::RainbowPrinting => "rainbow-printing",
            Self::VoidPantograph => "void-pantograph",
            Self::AntiCopy => "anti-copy",
            Self::Watermark => "watermark",
            Self::InvisibleFibers => "invisible-fibers",
            Self::SecurityThread => "security-thread",
            Self::Microtext => "microtext",
            Self::UvMarker => "uv-marker",
            Self::Thermochromic => "thermochromic",
            Self::Metameric => "metameric",
            Self::Holographic => "holographic",
            Self::Retroreflective => "retroreflective",
            Self::GhostImage => "ghost-image",
            Self::EmbossedSeal => "embossed-seal",
            Self::Perforation => "perforation",
            Self::Braille => "braille",
            Self::Mrz => "mrz",
            Self::Barcode => "barcode",
            Self::QrCode => "qr-code",
        }
    }
}

impl std::fmt::Display for SecurityFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which features a document type carries. Static configuration only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityFeatureMatrix {
    pub uv: bool,
    pub holographic: bool,
    pub braille: bool,
    pub mrz: bool,
    /// Linear barcode of the serial / document number.
    #[serde(alias = "pdf417")]
    pub barcode: bool,
    pub microprinting: bool,
    pub security_thread: bool,
    pub invisible_fibers: bool,
    pub guilloche: bool,
    pub anti_copy: bool,
    pub void_pantograph: bool,
    pub ghost_image: bool,
    pub rainbow_printing: bool,
    pub thermochromic: bool,
    pub metameric: bool,
    pub perforation: bool,
    pub embossed_seal: bool,
    pub retroreflective: bool,
    pub watermark: bool,
    pub qr_code: bool,
}

impl SecurityFeatureMatrix {
    /// Every flag off; the base for the static catalogue matrices.
    pub const NONE: Self = Self {
        uv: false,
        holographic: false,
        braille: false,
        mrz: false,
        barcode: false,
        microprinting: false,
        security_thread: false,
        invisible_fibers: false,
        guilloche: false,
        anti_copy: false,
        void_pantograph: false,
        ghost_image: false,
        rainbow_printing: false,
        thermochromic: false,
        metameric: false,
        perforation: false,
        embossed_seal: false,
        retroreflective: false,
        watermark: false,
        qr_code: false,
    };

    /// Whether the flag backing `feature` is set.
    pub fn is_enabled(&self, feature: SecurityFeature) -> bool {
        match feature {
            SecurityFeature::Guilloche => self.guilloche,
            SecurityFeature::RainbowPrinting => self.rainbow_printing,
            SecurityFeature::VoidPantograph => self.void_pantograph,
            SecurityFeature::AntiCopy => self.anti_copy,
            SecurityFeature::Watermark => self.watermark,
            SecurityFeature::InvisibleFibers => self.invisible_fibers,
            SecurityFeature::SecurityThread => self.security_thread,
            SecurityFeature::Microtext => self.microprinting,
            SecurityFeature::UvMarker => self.uv,
            SecurityFeature::Thermochromic => self.thermochromic,
            SecurityFeature::Metameric => self.metameric,
            SecurityFeature::Holographic => self.holographic,
            SecurityFeature::Retroreflective => self.retroreflective,
            SecurityFeature::GhostImage => self.ghost_image,
            SecurityFeature::EmbossedSeal => self.embossed_seal,
            SecurityFeature::Perforation => self.perforation,
            SecurityFeature::Braille => self.braille,
            SecurityFeature::Mrz => self.mrz,
            SecurityFeature::Barcode => self.barcode,
            SecurityFeature::QrCode => self.qr_code,
        }
    }

    /// Enabled features in layering order.
    pub fn enabled(&self) -> Vec<SecurityFeature> {
        SecurityFeature::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matrix_enables_nothing() {
        assert!(SecurityFeatureMatrix::default().enabled().is_empty());
    }

    #[test]
    fn enabled_follows_layering_order() {
        let matrix = SecurityFeatureMatrix {
            qr_code: true,
            guilloche: true,
            mrz: true,
            ..Default::default()
        };
        assert_eq!(
            matrix.enabled(),
            vec![
                SecurityFeature::Guilloche,
                SecurityFeature::Mrz,
                SecurityFeature::QrCode
            ]
        );
    }

    #[test]
    fn pdf417_alias_maps_to_barcode() {
        let matrix: SecurityFeatureMatrix = serde_json::from_str(r#"{"pdf417": true}"#).unwrap();
        assert!(matrix.is_enabled(SecurityFeature::Barcode));
    }

    #[test]
    fn partial_matrix_leaves_other_flags_off() {
        let matrix: SecurityFeatureMatrix = serde_json::from_str(r#"{"uv": true, "qrCode": true}"#).unwrap();
        assert_eq!(matrix.enabled(), vec![SecurityFeature::UvMarker, SecurityFeature::QrCode]);
    }

    #[test]
    fn every_feature_has_a_flag() {
        let json: serde_json::Map<String, serde_json::Value> =
            serde_json::to_value(SecurityFeatureMatrix::default())
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .map(|k| (k.clone(), serde_json::Value::Bool(true)))
                .collect();
        let all: SecurityFeatureMatrix = serde_json::from_value(json.into()).unwrap();
        assert_eq!(all.enabled(), SecurityFeature::ALL.to_vec());
    }
}
