// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Machine- and touch-readable elements: braille, MRZ, barcode and QR.

use super::FeatureContent;
use super::braille::{cells, has_dot};
use crate::barcode::bar_runs;
use crate::surface::{Colour, Font, MM_PER_PT, Point, Rect, Surface, fit_font_size};

/// Quiet-zone modules on each side of the barcode.
const BARCODE_QUIET: usize = 10;

/// Raised-dot cells for the document number.
pub(super) fn braille(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let cells = cells(&content.document_number);
    if cells.is_empty() {
        return;
    }
    let pitch = (area.width / cells.len() as f32).min(area.height / 1.6);
    let spacing = pitch * 0.4;
    let radius = pitch * 0.12;
    let top = area.y + area.height / 2.0 - spacing;
    let dot = Colour::INK.lighten(0.3);

    for (i, cell) in cells.iter().enumerate() {
        let left = area.x + i as f32 * pitch + pitch * 0.2;
        for n in 1..=6u8 {
            if has_dot(*cell, n) {
                let col = if n <= 3 { 0.0 } else { 1.0 };
                let row = f32::from((n - 1) % 3);
                let centre = Point::new(left + col * spacing, top + row * spacing);
                surface.fill_circle(centre, radius, dot);
            }
        }
    }
}

/// MRZ lines in a fixed-pitch face, scaled to fill the zone.
pub(super) fn mrz(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let lines = &content.mrz_lines;
    let Some(longest) = lines.iter().max_by_key(|l| l.len()) else {
        return;
    };
    let line_height = area.height / lines.len() as f32;
    let size = fit_font_size(longest, Font::Mono, area.width, 12.0).min(line_height / MM_PER_PT / 1.25);
    for (i, line) in lines.iter().enumerate() {
        let baseline = area.y + line_height * (i as f32 + 0.8);
        surface.text(line, Point::new(area.x, baseline), size, Font::Mono, Colour::BLACK);
    }
}

/// Code 39 bars of the serial with the human-readable text underneath.
pub(super) fn barcode(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let modules = content.barcode_modules();
    if modules.is_empty() {
        return;
    }
    let module = area.width / (modules.len() + 2 * BARCODE_QUIET) as f32;
    let bar_height = area.height * 0.75;
    for (start, width) in bar_runs(modules) {
        let x = area.x + (BARCODE_QUIET + start) as f32 * module;
        surface.fill_rect(Rect::new(x, area.y, width as f32 * module, bar_height), Colour::BLACK);
    }

    let text_width = modules.len() as f32 * module;
    let max_size = (area.height * 0.22 / MM_PER_PT).min(6.0);
    let size = fit_font_size(&content.serial, Font::Mono, text_width, max_size);
    let at = Point::new(area.x + BARCODE_QUIET as f32 * module, area.bottom());
    surface.text(&content.serial, at, size, Font::Mono, Colour::BLACK);
}

/// The prepared QR raster, square in the area.
pub(super) fn qr_code(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    surface.image(content.qr_image(), area.square());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sample_content;
    use crate::surface::{DrawCommand, RecordingSurface};
    use docguard_core::{DocumentType, PageGeometry};

    #[test]
    fn mrz_draws_each_line_in_mono() {
        let content = sample_content(DocumentType::OrdinaryPassport);
        let mut s = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        mrz(&mut s, Rect::new(2.0, 70.0, 120.0, 16.0), &content);
        assert_eq!(s.texts(), content.mrz_lines.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(s.commands.iter().all(|c| matches!(c, DrawCommand::Text { font: Font::Mono, .. })));
    }

    #[test]
    fn barcode_bar_count_matches_symbol() {
        let content = sample_content(DocumentType::OrdinaryPassport);
        let mut s = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        barcode(&mut s, Rect::new(3.0, 60.0, 60.0, 8.0), &content);
        let bars = s
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polygon { .. }))
            .count();
        // Five bars per character, start and stop included.
        assert_eq!(bars, 5 * (content.serial.len() + 2));
        assert_eq!(s.texts(), vec![content.serial.as_str()]);
    }

    #[test]
    fn braille_dot_count_matches_cells() {
        let content = sample_content(DocumentType::OrdinaryPassport);
        let expected: u32 = cells(&content.document_number).iter().map(|c| c.count_ones()).sum();
        let mut s = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        braille(&mut s, Rect::new(80.0, 50.0, 40.0, 6.0), &content);
        assert_eq!(s.commands.len() as u32, expected);
    }

    #[test]
    fn qr_is_one_square_image() {
        let content = sample_content(DocumentType::OrdinaryPassport);
        let mut s = RecordingSurface::new(PageGeometry::PASSPORT_PAGE);
        qr_code(&mut s, Rect::new(60.0, 50.0, 30.0, 20.0), &content);
        match s.commands.as_slice() {
            [DrawCommand::Image { rect, width, height, .. }] => {
                assert_eq!(rect.width, rect.height);
                assert_eq!(width, height);
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }
}
