//! Merging worker buffers and mapping radiance to displayable bytes.
//!
//! Deposits pile up over several orders of magnitude (the direct slit image is
//! far brighter than the dispersed fan), so values are log-compressed, scaled by
//! the brightest channel in the image and gamma-corrected before quantizing.

use std::sync::Arc;

use rayon::prelude::*;

use crate::buffer::AccumulationBuffer;
use crate::output::Frame;
use crate::vector::Color;

/// Pixelwise sum of several accumulation buffers, in linear radiance.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major pixels.
    pub pixels: Vec<Color>,
}

impl MergedImage {
    /// Sum all buffers pixel by pixel. Buffers must share one size.
    pub fn merge(buffers: &[Arc<AccumulationBuffer>]) -> Self {
        let Some(first) = buffers.first() else {
            return Self {
                width: 0,
                height: 0,
                pixels: Vec::new(),
            };
        };
        debug_assert!(buffers
            .iter()
            .all(|b| b.width() == first.width() && b.height() == first.height()));

        let pixels = (0..first.len())
            .into_par_iter()
            .map(|pixel| buffers.iter().map(|b| b.pixel(pixel)).sum::<Color>())
            .collect();

        Self {
            width: first.width(),
            height: first.height(),
            pixels,
        }
    }

    /// Tone-map to an 8-bit RGB frame.
    ///
    /// Each channel becomes `ln(1 + v)`, is divided by the largest such value in
    /// the image and raised to `gamma`, then scaled to [0, 255]. An image with no
    /// light at all maps to black.
    pub fn tone_map(&self, gamma: f32) -> Frame {
        let compressed: Vec<Color> = self
            .pixels
            .par_iter()
            .map(|c| Color::new(c.x.ln_1p(), c.y.ln_1p(), c.z.ln_1p()))
            .collect();

        let max = compressed
            .par_iter()
            .map(|c| c.max_element())
            .reduce(|| 0.0, f32::max);

        let quantize = |v: f32| -> u8 {
            if v > 0.0 {
                (255.0 * (v / max).powf(gamma)).clamp(0.0, 255.0) as u8
            } else {
                0
            }
        };

        let bytes = compressed
            .par_iter()
            .flat_map_iter(|c| c.to_array().map(quantize))
            .collect();

        Frame::rgb(self.width, self.height, bytes)
    }
}
