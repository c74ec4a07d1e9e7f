// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Foreground overlays: threads, inks, optically variable and tactile
// features drawn over the printed data.

use std::f32::consts::PI;

use super::FeatureContent;
use crate::surface::{
    Colour, Font, MM_PER_PT, Point, Rect, Stroke, Surface, fit_font_size, regular_polygon, text_width_mm,
};

/// Centre `text` horizontally in `area` with its baseline at `baseline`.
fn centred_text(
    surface: &mut dyn Surface,
    area: Rect,
    text: &str,
    baseline: f32,
    size: f32,
    font: Font,
    colour: Colour,
) {
    let x = area.x + (area.width - text_width_mm(text, font, size)) / 2.0;
    surface.text(text, area.clamp(Point::new(x, baseline)), size, font, colour);
}

/// Alternating star polygon: `points` tips between two radii.
fn star(centre: Point, outer: f32, inner: f32, points: usize) -> Vec<Point> {
    let outer_pts = regular_polygon(centre, outer, points, 0.0);
    let inner_pts = regular_polygon(centre, inner, points, PI / points as f32);
    outer_pts.into_iter().zip(inner_pts).flat_map(|(a, b)| [a, b]).collect()
}

/// Windowed metallic thread: segments with gaps, a darker core line in each.
pub(super) fn security_thread(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    const SEGMENT: f32 = 6.0;
    const GAP: f32 = 3.0;
    let metal = Colour::rgb(150, 152, 165);
    let core = Stroke::new(0.1, Colour::rgb(90, 92, 110));
    let mid_x = area.x + area.width / 2.0;

    let mut y = area.y;
    while y < area.bottom() {
        let len = SEGMENT.min(area.bottom() - y);
        surface.fill_rect(Rect::new(area.x, y, area.width, len), metal);
        surface.polyline(&[Point::new(mid_x, y), Point::new(mid_x, y + len)], core, false);
        y += SEGMENT + GAP;
    }
}

/// Rows of sub-millimetre repeated text.
pub(super) fn microtext(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let unit = format!("{}*{}*", content.profile().code, content.document_number);
    let size = (area.height / MM_PER_PT * 0.8).clamp(0.8, 1.5);
    let per_char = text_width_mm("M", Font::Sans, size);
    let chars = ((area.width / per_char) as usize).max(unit.len());
    let line: String = unit.chars().cycle().take(chars).collect();
    let at = Point::new(area.x, area.y + area.height * 0.8);
    surface.text(&line, at, size, Font::Sans, Colour::INK.lighten(0.2));
}

/// Fluorescent emblem and serial, visible under UV light.
pub(super) fn uv_marker(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let glow = Colour::rgb(214, 255, 170);
    let sq = area.square();
    let c = sq.centre();
    let side = sq.width;
    surface.stroke_circle(c, side * 0.45, Stroke::new(0.2, glow));
    surface.polygon(&star(c, side * 0.35, side * 0.14, 5), glow);

    let size = fit_font_size(&content.serial, Font::Mono, area.width, 6.0);
    centred_text(surface, area, &content.serial, area.bottom(), size, Font::Mono, glow);
}

/// Heat-reactive ink patch: magenta to red ramp in a frame.
pub(super) fn thermochromic(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    const BANDS: usize = 6;
    let w = area.width / BANDS as f32;
    for i in 0..BANDS {
        let colour = Colour::from_hue(300.0 + 12.0 * i as f32, 0.3);
        surface.fill_rect(Rect::new(area.x + w * i as f32, area.y, w, area.height), colour);
    }
    surface.stroke_rect(area, Stroke::new(0.1, Colour::INK.lighten(0.5)));
}

/// Two inks that match in daylight and split under other illuminants; the
/// second carries a hidden glyph.
pub(super) fn metameric(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let half = area.width / 2.0;
    let left = Rect::new(area.x, area.y, half, area.height);
    let right = Rect::new(area.x + half, area.y, half, area.height);
    surface.fill_rect(left, Colour::rgb(120, 128, 150));
    surface.fill_rect(right, Colour::rgb(122, 127, 147));

    let glyph: String = content.profile().code.chars().take(1).collect();
    let size = (area.height / MM_PER_PT * 0.7).min(24.0);
    centred_text(
        surface,
        right,
        &glyph,
        right.bottom() - area.height * 0.2,
        size,
        Font::SansBold,
        Colour::rgb(121, 128, 149),
    );
}

/// Nested rotated hexagons in shifting hues, standing in for the
/// diffractive foil.
pub(super) fn holographic(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    let c = area.centre();
    let base = area.width.min(area.height) / 2.0 * 0.95;
    for i in 0..8 {
        let radius = base * (1.0 - i as f32 * 0.1);
        let hexagon = regular_polygon(c, radius, 6, i as f32 * PI / 16.0);
        surface.polyline(&hexagon, Stroke::new(0.15, Colour::from_hue(i as f32 * 45.0, 0.35)), true);
    }
}

/// Bead grid of retroreflective film.
pub(super) fn retroreflective(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    let spacing = ((area.width * area.height / 600.0).sqrt()).max(1.2);
    let radius = spacing * 0.3;
    let bead = Colour::rgb(200, 200, 212);
    let cols = (area.width / spacing) as usize;
    let rows = (area.height / spacing) as usize;
    for row in 0..rows {
        for col in 0..cols {
            let centre = Point::new(
                area.x + (col as f32 + 0.5) * spacing,
                area.y + (row as f32 + 0.5) * spacing,
            );
            surface.fill_circle(centre, radius, bead);
        }
    }
}

/// Pale secondary portrait; a neutral silhouette when no photo was given.
pub(super) fn ghost_image(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    match content.portrait() {
        Some(portrait) => {
            let (pw, ph) = (portrait.width() as f32, portrait.height() as f32);
            let scale = (area.width / pw).min(area.height / ph);
            let (w, h) = (pw * scale, ph * scale);
            let rect = Rect::new(
                area.x + (area.width - w) / 2.0,
                area.y + (area.height - h) / 2.0,
                w,
                h,
            );
            surface.image(portrait, rect);
        }
        None => {
            let tone = Colour::INK.lighten(0.85);
            let head = Point::new(area.centre().x, area.y + area.height * 0.35);
            surface.fill_circle(head, area.width.min(area.height) * 0.2, tone);
            let shoulders = [
                Point::new(area.x + area.width * 0.15, area.bottom()),
                Point::new(area.x + area.width * 0.25, area.y + area.height * 0.62),
                Point::new(area.x + area.width * 0.75, area.y + area.height * 0.62),
                Point::new(area.x + area.width * 0.85, area.bottom()),
            ];
            surface.polygon(&shoulders, tone);
        }
    }
}

/// Blind-embossed seal: rings, rosette and the type code.
pub(super) fn embossed_seal(surface: &mut dyn Surface, area: Rect, content: &FeatureContent) {
    let sq = area.square();
    let c = sq.centre();
    let r = sq.width / 2.0;
    let relief = Colour::INK.lighten(0.5);
    surface.stroke_circle(c, r * 0.96, Stroke::new(0.3, relief));
    surface.stroke_circle(c, r * 0.78, Stroke::new(0.15, relief));
    surface.polygon(&star(c, r * 0.7, r * 0.5, 16), Colour::INK.lighten(0.8));

    let code = content.profile().code.replace('_', " ");
    let size = fit_font_size(&code, Font::SansBold, r, 8.0);
    centred_text(surface, sq, &code, c.y + size * MM_PER_PT / 3.0, size, Font::SansBold, relief);
}

/// Row of punched holes along the longer side of the strip.
pub(super) fn perforation(surface: &mut dyn Surface, area: Rect, _content: &FeatureContent) {
    const PITCH: f32 = 1.6;
    let vertical = area.height >= area.width;
    let (long, short) = if vertical {
        (area.height, area.width)
    } else {
        (area.width, area.height)
    };
    let radius = (short * 0.35).min(0.5);
    let rim = Stroke::new(0.05, Colour::INK.lighten(0.4));
    let holes = (long / PITCH) as usize;
    for i in 0..holes {
        let along = (i as f32 + 0.5) * PITCH;
        let centre = if vertical {
            Point::new(area.x + area.width / 2.0, area.y + along)
        } else {
            Point::new(area.x + along, area.y + area.height / 2.0)
        };
        surface.fill_circle(centre, radius, Colour::WHITE);
        surface.stroke_circle(centre, radius, rim);
    }
}
