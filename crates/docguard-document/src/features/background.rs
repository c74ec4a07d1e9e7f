// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background layer: fine-line and tint patterns printed under the holder's
// data.

use std::f32::consts::TAU;

use super::FeatureContent;
use super::rng::SplitMix64;
use crate::surface::{Colour, Font, Point, Rect, Stroke, Surface, fit_font_size, text_width_mm, MM_PER_PT};

/// Upper bound on dots/lines per pattern so A4 pages stay a sane size.
const MAX_PATTERN_ELEMENTS: f32 = 2000.0;

/// Overlapping hypotrochoid rosettes, stretched to fill the area.
pub(super) fn guilloche(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    const STEPS: usize = 720;
    let mut rng = SplitMix64::new(content.seed());
    let c = area.centre();

    for i in 0..4 {
        // Integer lobe count closes the curve after one turn.
        let lobes = 6.0 + 2.0 * i as f32;
        let r = 1.0 / (lobes + 1.0);
        let d = 0.25 + 0.3 * rng.unit();
        let extent = (1.0 - r) + d;
        let (sx, sy) = (area.width / 2.0 / extent, area.height / 2.0 / extent);

        let points: Vec<Point> = (0..STEPS)
            .map(|s| {
                let t = TAU * s as f32 / STEPS as f32;
                let x = (1.0 - r) * t.cos() + d * (lobes * t).cos();
                let y = (1.0 - r) * t.sin() - d * (lobes * t).sin();
                Point::new(c.x + sx * x, c.y + sy * y)
            })
            .collect();
        let colour = Colour::from_hue(190.0 + 25.0 * i as f32, 0.55);
        surface.polyline(&points, Stroke::new(0.08, colour), true);
    }
}

/// Split-fountain tint: pale hue ramp across the band.
pub(super) fn rainbow_printing(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    const BANDS: usize = 48;
    let w = area.width / BANDS as f32;
    for i in 0..BANDS {
        let t = i as f32 / (BANDS - 1) as f32;
        let colour = Colour::from_hue(220.0 - 180.0 * t, 0.6);
        surface.fill_rect(Rect::new(area.x + w * i as f32, area.y, w, area.height), colour);
    }
}

/// Dot screen that a photocopier resolves into the word VOID.
pub(super) fn void_pantograph(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    let spacing = (area.width * area.height / MAX_PATTERN_ELEMENTS).sqrt().max(1.2);
    let dot = spacing * 0.2;
    let tone = Colour::INK.lighten(0.88);

    let cols = (area.width / spacing) as usize;
    let rows = (area.height / spacing) as usize;
    for row in 0..rows {
        for col in 0..cols {
            let x = area.x + (col as f32 + 0.5) * spacing - dot / 2.0;
            let y = area.y + (row as f32 + 0.5) * spacing - dot / 2.0;
            surface.fill_rect(Rect::new(x, y, dot, dot), tone);
        }
    }

    let word = "VOID";
    let size = fit_font_size(word, Font::SansBold, area.width * 0.6, 48.0);
    let c = area.centre();
    let at = Point::new(
        c.x - text_width_mm(word, Font::SansBold, size) / 2.0,
        c.y + size * MM_PER_PT / 3.0,
    );
    surface.text(word, area.clamp(at), size, Font::SansBold, Colour::INK.lighten(0.84));
}

/// Fine 45-degree line screen; copies moiré.
pub(super) fn anti_copy(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    let (w, h) = (area.width, area.height);
    let spacing = ((w + h) / (MAX_PATTERN_ELEMENTS / 8.0)).max(1.5);
    let stroke = Stroke::new(0.05, Colour::INK.lighten(0.9));

    // Lines satisfy (px - x) - (py - y) = d.
    let mut d = -h + spacing / 2.0;
    while d < w {
        let start = Point::new(area.x + d.max(0.0), area.y + (-d).max(0.0));
        let end = Point::new(area.x + w.min(h + d), area.y + (w - d).min(h));
        surface.polyline(&[start, end], stroke, false);
        d += spacing;
    }
}

/// Large pale title across the middle of the page.
pub(super) fn watermark(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let text = content.profile().title.to_uppercase();
    let size = fit_font_size(&text, Font::SansBold, area.width, 36.0);
    let c = area.centre();
    let at = Point::new(
        c.x - text_width_mm(&text, Font::SansBold, size) / 2.0,
        c.y + size * MM_PER_PT * 0.35,
    );
    surface.text(&text, area.clamp(at), size, Font::SansBold, Colour::INK.lighten(0.92));
}

/// Short coloured fibres scattered over the page.
pub(super) fn invisible_fibers(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    const FIBRES: usize = 60;
    let palette = [
        Colour::from_hue(0.0, 0.7),
        Colour::from_hue(120.0, 0.7),
        Colour::from_hue(230.0, 0.7),
        Colour::from_hue(55.0, 0.6),
    ];
    // Offset the stream so fibres do not mirror the guilloche parameters.
    let mut rng = SplitMix64::new(content.seed() ^ 0x5EED_F1B3);

    for i in 0..FIBRES {
        let start = Point::new(area.x + rng.unit() * area.width, area.y + rng.unit() * area.height);
        let angle = rng.unit() * TAU;
        let len = 1.5 + 2.5 * rng.unit();
        let end = area.clamp(Point::new(start.x + len * angle.cos(), start.y + len * angle.sin()));
        surface.polyline(&[start, end], Stroke::new(0.1, palette[i % palette.len()]), false);
    }
}
