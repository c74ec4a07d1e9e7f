// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drawing surface contract.
//
// Everything the layering engine draws goes through `Surface`, in page
// millimetres with the origin at the top-left corner and y growing
// downwards. `PdfWriter` is the production implementation;
// `RecordingSurface` keeps the command list for golden-output tests.

use docguard_core::PageGeometry;
use image::RgbImage;

/// A position on the page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole page.
    pub fn page(page: PageGeometry) -> Self {
        Self::new(0.0, 0.0, page.width_mm, page.height_mm)
    }

    /// Sub-rectangle given as fractions of this one.
    pub fn fraction(&self, fx: f32, fy: f32, fw: f32, fh: f32) -> Self {
        Self::new(
            self.x + self.width * fx,
            self.y + self.height * fy,
            self.width * fw,
            self.height * fh,
        )
    }

    /// Shrink by `margin` on every side (never below zero size).
    pub fn inset(&self, margin: f32) -> Self {
        let m = margin.min(self.width / 2.0).min(self.height / 2.0).max(0.0);
        Self::new(self.x + m, self.y + m, self.width - 2.0 * m, self.height - 2.0 * m)
    }

    /// Largest square centred in this rectangle.
    pub fn square(&self) -> Self {
        let side = self.width.min(self.height);
        Self::new(
            self.x + (self.width - side) / 2.0,
            self.y + (self.height - side) / 2.0,
            side,
            side,
        )
    }

    pub fn centre(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `p` lies inside (edges included, with a small tolerance for
    /// trigonometric rounding).
    pub fn contains(&self, p: Point) -> bool {
        const EPS: f32 = 1e-3;
        p.x >= self.x - EPS && p.x <= self.right() + EPS && p.y >= self.y - EPS && p.y <= self.bottom() + EPS
    }

    /// Clamp `p` into this rectangle.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const INK: Self = Self::rgb(24, 32, 56);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Blend towards white; `amount` 0.0 leaves the colour, 1.0 gives white.
    pub fn lighten(self, amount: f32) -> Self {
        let t = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * t).round() as u8;
        Self::rgb(mix(self.r), mix(self.g), mix(self.b))
    }

    /// Fully saturated colour at `hue` degrees, lightened by `pale`.
    pub fn from_hue(hue: f32, pale: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let to_u8 = |v: f32| (v * 255.0).round() as u8;
        Self::rgb(to_u8(r), to_u8(g), to_u8(b)).lighten(pale)
    }
}

/// Built-in typefaces every surface must offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Sans,
    SansBold,
    /// Fixed pitch; used for the MRZ.
    Mono,
    Serif,
}

impl Font {
    /// Average advance width as a fraction of the font size.
    pub fn advance(&self) -> f32 {
        match self {
            Self::Mono => 0.6,
            Self::Sans | Self::Serif => 0.5,
            Self::SansBold => 0.55,
        }
    }
}

/// Points to millimetres.
pub const MM_PER_PT: f32 = 0.352_778;

/// Estimated width in millimetres of `text` set in `font` at `size_pt`.
pub fn text_width_mm(text: &str, font: Font, size_pt: f32) -> f32 {
    text.chars().count() as f32 * font.advance() * size_pt * MM_PER_PT
}

/// Largest size (capped at `max_pt`) at which `text` fits in `width_mm`.
pub fn fit_font_size(text: &str, font: Font, width_mm: f32, max_pt: f32) -> f32 {
    let unit = text_width_mm(text, font, 1.0);
    if unit <= 0.0 {
        return max_pt;
    }
    (width_mm / unit).min(max_pt)
}

/// Line style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width_mm: f32,
    pub colour: Colour,
}

impl Stroke {
    pub const fn new(width_mm: f32, colour: Colour) -> Self {
        Self { width_mm, colour }
    }
}

/// A fixed-size page that can be drawn on.
///
/// Drawing never fails: a surface either records the operation or drops
/// it. Renderers therefore return nothing.
pub trait Surface {
    fn page(&self) -> PageGeometry;

    /// Draw `text` with its baseline starting at `at`.
    fn text(&mut self, text: &str, at: Point, size_pt: f32, font: Font, colour: Colour);

    fn polyline(&mut self, points: &[Point], stroke: Stroke, closed: bool);

    fn polygon(&mut self, points: &[Point], fill: Colour);

    /// Place a raster image stretched to `rect`.
    fn image(&mut self, image: &RgbImage, rect: Rect);

    fn fill_rect(&mut self, rect: Rect, fill: Colour) {
        self.polygon(&rect.corners(), fill);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.polyline(&rect.corners(), stroke, true);
    }

    fn fill_circle(&mut self, centre: Point, radius: f32, fill: Colour) {
        self.polygon(&circle_points(centre, radius, 24), fill);
    }

    fn stroke_circle(&mut self, centre: Point, radius: f32, stroke: Stroke) {
        self.polyline(&circle_points(centre, radius, 48), stroke, true);
    }
}

/// Regular polygon approximation of a circle, starting at 12 o'clock.
pub fn circle_points(centre: Point, radius: f32, segments: usize) -> Vec<Point> {
    regular_polygon(centre, radius, segments, 0.0)
}

/// Vertices of a regular `sides`-gon rotated by `rotation` radians.
pub fn regular_polygon(centre: Point, radius: f32, sides: usize, rotation: f32) -> Vec<Point> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| {
            let a = rotation + std::f32::consts::TAU * i as f32 / sides as f32;
            Point::new(centre.x + radius * a.sin(), centre.y - radius * a.cos())
        })
        .collect()
}

// -- Recording surface ---------------------------------------------------------

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        at: Point,
        size_pt: f32,
        font: Font,
        colour: Colour,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
        closed: bool,
    },
    Polygon {
        points: Vec<Point>,
        fill: Colour,
    },
    Image {
        width: u32,
        height: u32,
        rect: Rect,
        pixels: Vec<u8>,
    },
}

impl DrawCommand {
    /// Every anchor point the command touches.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Self::Text { at, .. } => vec![*at],
            Self::Polyline { points, .. } | Self::Polygon { points, .. } => points.clone(),
            Self::Image { rect, .. } => rect.corners().to_vec(),
        }
    }
}

/// In-memory surface that records every command in order.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    page: PageGeometry,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(page: PageGeometry) -> Self {
        Self {
            page,
            commands: Vec::new(),
        }
    }

    /// All recorded text, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether every recorded anchor point lies inside `area`.
    pub fn stays_within(&self, area: Rect) -> bool {
        self.commands
            .iter()
            .flat_map(DrawCommand::points)
            .all(|p| area.contains(p))
    }
}

impl Surface for RecordingSurface {
    fn page(&self) -> PageGeometry {
        self.page
    }

    fn text(&mut self, text: &str, at: Point, size_pt: f32, font: Font, colour: Colour) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            at,
            size_pt,
            font,
            colour,
        });
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke, closed: bool) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            stroke,
            closed,
        });
    }

    fn polygon(&mut self, points: &[Point], fill: Colour) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            fill,
        });
    }

    fn image(&mut self, image: &RgbImage, rect: Rect) {
        self.commands.push(DrawCommand::Image {
            width: image.width(),
            height: image.height(),
            rect,
            pixels: image.as_raw().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_and_square() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.fraction(0.5, 0.5, 0.5, 0.5), Rect::new(60.0, 45.0, 50.0, 25.0));
        assert_eq!(r.square(), Rect::new(35.0, 20.0, 50.0, 50.0));
        assert_eq!(r.inset(5.0), Rect::new(15.0, 25.0, 90.0, 40.0));
    }

    #[test]
    fn circle_stays_in_bounding_square() {
        let area = Rect::new(0.0, 0.0, 10.0, 10.0);
        for p in circle_points(area.centre(), 5.0, 36) {
            assert!(area.contains(p), "{p:?}");
        }
    }

    #[test]
    fn lighten_extremes() {
        assert_eq!(Colour::INK.lighten(0.0), Colour::INK);
        assert_eq!(Colour::INK.lighten(1.0), Colour::WHITE);
    }

    #[test]
    fn hue_primaries() {
        assert_eq!(Colour::from_hue(0.0, 0.0), Colour::rgb(255, 0, 0));
        assert_eq!(Colour::from_hue(120.0, 0.0), Colour::rgb(0, 255, 0));
        assert_eq!(Colour::from_hue(240.0, 0.0), Colour::rgb(0, 0, 255));
    }

    #[test]
    fn font_fit_respects_width() {
        let size = fit_font_size("P<UTOERIKSSON", Font::Mono, 40.0, 100.0);
        assert!(text_width_mm("P<UTOERIKSSON", Font::Mono, size) <= 40.0 + 1e-3);
        assert_eq!(fit_font_size("AB", Font::Mono, 1000.0, 12.0), 12.0);
    }

    #[test]
    fn recording_surface_records_in_order() {
        let mut s = RecordingSurface::new(PageGeometry::ID1_CARD);
        s.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0), Colour::BLACK);
        s.text("HELLO", Point::new(5.0, 5.0), 8.0, Font::Sans, Colour::INK);
        assert_eq!(s.commands.len(), 2);
        assert_eq!(s.texts(), vec!["HELLO"]);
        assert!(s.stays_within(Rect::page(PageGeometry::ID1_CARD)));
        assert!(!s.stays_within(Rect::new(0.0, 0.0, 2.0, 2.0)));
    }
}
