//! Per-worker accumulation buffer.
//!
//! Each worker owns the only [`BufferWriter`] of its buffer and adds light to it
//! for as long as it runs. The coordinator holds a shared [`AccumulationBuffer`]
//! handle and may read it at any time for previews and snapshots.
//!
//! Preview reads race with the worker's writes. This is accepted on purpose: each
//! channel is stored as the bit pattern of an `f32` in an `AtomicU32`, so a reader
//! sees either the old or the new value of a channel, never a torn one, but the
//! three channels of a pixel (and neighbouring pixels) may come from different
//! moments. For an image built from millions of tiny deposits that difference is
//! invisible. Once the worker has joined, reads are exact.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::vector::Color;

/// Dense width×height grid of RGB radiance sums, starting at zero.
#[derive(Debug)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    channels: Box<[AtomicU32]>,
}

impl AccumulationBuffer {
    /// Allocate a zeroed buffer, returning the shared read handle and the sole writer.
    pub fn new(width: u32, height: u32) -> (Arc<Self>, BufferWriter) {
        let len = width as usize * height as usize * 3;
        let channels = (0..len).map(|_| AtomicU32::new(0)).collect();
        let buffer = Arc::new(Self {
            width,
            height,
            channels,
        });
        let writer = BufferWriter {
            buffer: Arc::clone(&buffer),
        };
        (buffer, writer)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.channels.len() / 3
    }

    /// True for a zero-sized image.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize * self.width as usize + x as usize) * 3)
        } else {
            None
        }
    }

    fn load(&self, i: usize) -> Color {
        Color::new(
            f32::from_bits(self.channels[i].load(Ordering::Relaxed)),
            f32::from_bits(self.channels[i + 1].load(Ordering::Relaxed)),
            f32::from_bits(self.channels[i + 2].load(Ordering::Relaxed)),
        )
    }

    /// Accumulated color at a pixel, `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| self.load(i))
    }

    /// Accumulated color of the pixel with row-major index `pixel`.
    pub fn pixel(&self, pixel: usize) -> Color {
        self.load(pixel * 3)
    }

    /// All pixels in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        (0..self.len()).map(move |pixel| self.pixel(pixel))
    }

    /// Copy of the whole buffer, row-major.
    pub fn to_vec(&self) -> Vec<Color> {
        self.iter().collect()
    }
}

/// Exclusive write access to one [`AccumulationBuffer`].
///
/// Not `Clone`: exactly one writer exists per buffer, which makes the
/// load-then-store update in [`BufferWriter::add`] lossless.
#[derive(Debug)]
pub struct BufferWriter {
    buffer: Arc<AccumulationBuffer>,
}

impl BufferWriter {
    /// Add `color` to the pixel at (x, y). Returns false, changing nothing, when
    /// the pixel lies outside the image.
    pub fn add(&mut self, x: u32, y: u32, color: Color) -> bool {
        let Some(i) = self.buffer.index(x, y) else {
            return false;
        };

        for (channel, value) in self.buffer.channels[i..i + 3].iter().zip(color.to_array()) {
            let sum = f32::from_bits(channel.load(Ordering::Relaxed)) + value;
            channel.store(sum.to_bits(), Ordering::Relaxed);
        }
        true
    }

    /// Read access to the buffer being written.
    pub fn buffer(&self) -> &AccumulationBuffer {
        &self.buffer
    }
}
