//! # Output Module
//!
//! Hand-off points between the renderer and the outside world:
//! - [`ImageExporter`] writes finished 8-bit frames; [`PngExporter`] is the
//!   standard implementation
//! - [`Display`] shows in-progress frames and reports when the user closes it
//! - [`save_merged_as_exr`] dumps the linear, un-tonemapped radiance as OpenEXR
//!
//! Export failures are returned as [`ExportError`]; the coordinator logs them and
//! keeps rendering.

use std::path::Path;

use exr::prelude::write_rgb_file;
use image::ExtendedColorType;
use log::info;

use crate::tonemap::MergedImage;

/// Tone-mapped image, one byte per channel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel: 1, 3 or 4
    pub channels: u8,
    /// Interleaved channel bytes
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Interleaved RGB frame.
    pub fn rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels: 3,
            pixels,
        }
    }

    /// Number of bytes the frame's dimensions call for.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Channel bytes of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.pixels.get(start..start + channels)
    }
}

/// Reasons a frame could not be written.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The pixel buffer does not match the frame's dimensions.
    #[error("Frame holds {actual} bytes but {expected} were expected")]
    BufferSize {
        /// Bytes implied by the frame's dimensions
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// No image format for this channel count.
    #[error("Unsupported channel count: {0}")]
    Channels(u8),

    /// The output directory could not be created.
    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding or writing failed.
    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    /// EXR writing failed.
    #[error("Failed to write EXR image: {0}")]
    Exr(#[from] exr::error::Error),
}

/// Destination for finished frames.
pub trait ImageExporter {
    /// Write `frame` to `path`.
    fn export(&mut self, frame: &Frame, path: &Path) -> Result<(), ExportError>;
}

/// Writes frames as 8-bit PNG files, creating the parent directory if needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngExporter;

impl ImageExporter for PngExporter {
    fn export(&mut self, frame: &Frame, path: &Path) -> Result<(), ExportError> {
        if frame.pixels.len() != frame.expected_len() {
            return Err(ExportError::BufferSize {
                expected: frame.expected_len(),
                actual: frame.pixels.len(),
            });
        }

        let color = match frame.channels {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            4 => ExtendedColorType::Rgba8,
            other => return Err(ExportError::Channels(other)),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        image::save_buffer(path, &frame.pixels, frame.width, frame.height, color)?;
        info!("Image saved as {}", path.display());
        Ok(())
    }
}

/// Whether a display is still showing frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Still showing frames.
    Open,
    /// The user closed the display; treated as a request to stop rendering.
    Closed,
}

/// Live view of the render in progress.
pub trait Display {
    /// Show `frame` and report whether the display is still open.
    fn show(&mut self, frame: &Frame) -> DisplayStatus;
}

/// Save the merged linear radiance as OpenEXR, without tone mapping.
pub fn save_merged_as_exr(image: &MergedImage, path: &Path) -> Result<(), ExportError> {
    let width = image.width as usize;

    write_rgb_file(path, width, image.height as usize, |x, y| {
        let c = image.pixels[y * width + x];
        (c.x, c.y, c.z)
    })?;

    info!("HDR image saved as EXR: {}", path.display());
    Ok(())
}
