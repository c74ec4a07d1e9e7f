// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document renderer — the single, profile-driven page composition used for
// every document type: background features, title and holder data, then
// foreground features.

use docguard_core::{DocumentType, SecurityFeature};
use tracing::{info, instrument};

use crate::features::{FeatureContent, Layer, apply_layer, data_area, title_area};
use crate::pdf::PdfWriter;
use crate::surface::{Colour, Font, MM_PER_PT, Point, Surface, fit_font_size};

/// A rendered, unsigned document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pdf: Vec<u8>,
    /// Features in the order they were drawn.
    pub features: Vec<SecurityFeature>,
}

/// Compose one page on `surface`. Returns the applied features.
pub fn render_document(
    surface: &mut dyn Surface,
    content: &FeatureContent,
    fields: &[(String, String)],
) -> Vec<SecurityFeature> {
    let document_type: DocumentType = content.document_type;
    let mut applied = apply_layer(surface, document_type, content, Layer::Background);
    draw_title(surface, content);
    draw_fields(surface, fields);
    applied.extend(apply_layer(surface, document_type, content, Layer::Foreground));
    applied
}

fn draw_title(surface: &mut dyn Surface, content: &FeatureContent) {
    let area = title_area(surface.page());
    let title = content.profile().title.to_uppercase();
    let size = fit_font_size(&title, Font::SansBold, area.width, 16.0).min(area.height / MM_PER_PT * 0.8);
    surface.text(&title, Point::new(area.x, area.bottom()), size, Font::SansBold, Colour::INK);
}

/// Label/value pairs, one per line, scaled to the data block.
fn draw_fields(surface: &mut dyn Surface, fields: &[(String, String)]) {
    if fields.is_empty() {
        return;
    }
    let area = data_area(surface.page());
    let line_height = area.height / fields.len() as f32;
    let widest = fields
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .max_by_key(String::len)
        .unwrap_or_default();
    let size = fit_font_size(&widest, Font::Sans, area.width, 10.0).min(line_height / MM_PER_PT * 0.7);

    for (i, (label, value)) in fields.iter().enumerate() {
        let baseline = area.y + line_height * (i as f32 + 0.8);
        surface.text(
            &format!("{label}: {value}"),
            Point::new(area.x, baseline),
            size,
            Font::Sans,
            Colour::INK,
        );
    }
}

/// Render to PDF bytes on a fresh page sized for the document type.
///
/// CPU-bound and synchronous; callers on an async runtime should run it on
/// a blocking worker.
#[instrument(skip_all, fields(document_type = %content.document_type, fields = fields.len()))]
pub fn render_pdf(content: &FeatureContent, fields: &[(String, String)]) -> RenderedDocument {
    let profile = content.profile();
    let mut writer = PdfWriter::new(profile.title, profile.page);
    let features = render_document(&mut writer, content, fields);
    let pdf = writer.finish();
    info!(bytes = pdf.len(), features = features.len(), "document rendered");
    RenderedDocument { pdf, features }
}
