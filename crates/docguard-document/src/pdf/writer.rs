// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — a `Surface` backed by `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each drawing call appends `Op`s to
// the page's operation list, and `finish()` wraps them in a `PdfPage` and
// serialises via `PdfDocument::save()`. Surface coordinates are top-left
// millimetres; PDF user space is bottom-left points, so every y is flipped
// here and nowhere else.

use docguard_core::PageGeometry;
use image::RgbImage;
use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, Point as PdfPoint, Polygon, PolygonRing, Pt, RawImage, RawImageData,
    RawImageFormat, Rgb, TextItem, WindingOrder, XObjectTransform,
};
use tracing::{debug, instrument};

use crate::surface::{Colour, Font, Point, Rect, Stroke, Surface};

/// Raster images are registered at this resolution, then scaled to fit.
const IMAGE_DPI: f32 = 300.0;

/// Single-page PDF surface.
pub struct PdfWriter {
    doc: PdfDocument,
    page: PageGeometry,
    ops: Vec<Op>,
}

impl PdfWriter {
    /// Start a blank page of the given geometry.
    pub fn new(title: &str, page: PageGeometry) -> Self {
        Self {
            doc: PdfDocument::new(title),
            page,
            ops: Vec::new(),
        }
    }

    /// Number of operations recorded so far.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Serialise the page to PDF bytes.
    #[instrument(skip(self), fields(ops = self.ops.len()))]
    pub fn finish(mut self) -> Vec<u8> {
        let page = PdfPage::new(
            Mm(self.page.width_mm),
            Mm(self.page.height_mm),
            std::mem::take(&mut self.ops),
        );
        self.doc.with_pages(vec![page]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");
        output
    }

    fn to_pdf(&self, p: Point) -> PdfPoint {
        PdfPoint {
            x: Mm(p.x).into_pt(),
            y: Mm(self.page.height_mm - p.y).into_pt(),
        }
    }

    fn line_points(&self, points: &[Point]) -> Vec<LinePoint> {
        points
            .iter()
            .map(|p| LinePoint {
                p: self.to_pdf(*p),
                bezier: false,
            })
            .collect()
    }
}

fn pdf_colour(c: Colour) -> Color {
    Color::Rgb(Rgb {
        r: f32::from(c.r) / 255.0,
        g: f32::from(c.g) / 255.0,
        b: f32::from(c.b) / 255.0,
        icc_profile: None,
    })
}

fn builtin(font: Font) -> BuiltinFont {
    match font {
        Font::Sans => BuiltinFont::Helvetica,
        Font::SansBold => BuiltinFont::HelveticaBold,
        Font::Mono => BuiltinFont::Courier,
        Font::Serif => BuiltinFont::TimesRoman,
    }
}

impl Surface for PdfWriter {
    fn page(&self) -> PageGeometry {
        self.page
    }

    fn text(&mut self, text: &str, at: Point, size_pt: f32, font: Font, colour: Colour) {
        let font = builtin(font);
        let pos = self.to_pdf(at);
        self.ops.push(Op::SetFillColor {
            col: pdf_colour(colour),
        });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size_pt),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_owned())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke, closed: bool) {
        if points.len() < 2 {
            return;
        }
        let line = Line {
            points: self.line_points(points),
            is_closed: closed,
        };
        self.ops.push(Op::SetOutlineColor {
            col: pdf_colour(stroke.colour),
        });
        self.ops.push(Op::SetOutlineThickness {
            pt: Mm(stroke.width_mm).into_pt(),
        });
        self.ops.push(Op::DrawLine { line });
    }

    fn polygon(&mut self, points: &[Point], fill: Colour) {
        if points.len() < 3 {
            return;
        }
        let polygon = Polygon {
            rings: vec![PolygonRing {
                points: self.line_points(points),
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        };
        self.ops.push(Op::SetFillColor {
            col: pdf_colour(fill),
        });
        self.ops.push(Op::DrawPolygon { polygon });
    }

    fn image(&mut self, image: &RgbImage, rect: Rect) {
        let (px_w, px_h) = (image.width() as usize, image.height() as usize);
        if px_w == 0 || px_h == 0 {
            return;
        }
        let raw = RawImage {
            pixels: RawImageData::U8(image.as_raw().clone()),
            width: px_w,
            height: px_h,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = self.doc.add_image(&raw);

        // Native size at IMAGE_DPI, then stretch to the target rectangle.
        let native_w_pt = px_w as f32 / IMAGE_DPI * 72.0;
        let native_h_pt = px_h as f32 / IMAGE_DPI * 72.0;
        let origin = self.to_pdf(Point::new(rect.x, rect.bottom()));

        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(origin.x),
                translate_y: Some(origin.y),
                scale_x: Some(Mm(rect.width).into_pt().0 / native_w_pt),
                scale_y: Some(Mm(rect.height).into_pt().0 / native_h_pt),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        });
    }
}
