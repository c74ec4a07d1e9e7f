// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Portrait processing for the ghost image: decode, shrink, desaturate and
// fade the applicant photo so it prints as a pale secondary portrait.

use docguard_core::error::{DocguardError, Result};
use image::{DynamicImage, RgbImage};
use tracing::{debug, instrument};

/// Longest side of the processed ghost image, in pixels.
pub const GHOST_MAX_SIDE: u32 = 240;

/// Processing chain over one decoded portrait.
///
/// Each step consumes `self` and returns the transformed processor.
pub struct PortraitProcessor {
    image: DynamicImage,
}

impl PortraitProcessor {
    /// Decode an encoded portrait (PNG, JPEG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| DocguardError::malformed("photo", format!("failed to decode image: {err}")))?;
        debug!(width = image.width(), height = image.height(), "Portrait decoded");
        Ok(Self { image })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Fit within `max_side` x `max_side`, preserving aspect ratio. Never
    /// upscales.
    pub fn shrink(self, max_side: u32) -> Self {
        if self.image.width() <= max_side && self.image.height() <= max_side {
            return self;
        }
        let resized = self
            .image
            .resize(max_side, max_side, image::imageops::FilterType::Triangle);
        Self { image: resized }
    }

    pub fn grayscale(self) -> Self {
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Compress every channel into `[floor, 255]`, keeping relative tone.
    pub fn fade(self, floor: u8) -> Self {
        let mut rgb = self.image.to_rgb8();
        let span = f32::from(255 - floor) / 255.0;
        for pixel in rgb.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = floor + (f32::from(*channel) * span).round() as u8;
            }
        }
        Self {
            image: DynamicImage::ImageRgb8(rgb),
        }
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image.to_rgb8()
    }
}

/// The standard ghost-image chain.
pub fn ghost_portrait(photo: &[u8]) -> Result<RgbImage> {
    Ok(PortraitProcessor::from_bytes(photo)?
        .shrink(GHOST_MAX_SIDE)
        .grayscale()
        .fade(170)
        .into_rgb())
}
