//! Live preview window, available with the `window` feature.

use log::warn;
use minifb::{Key, Scale, Window, WindowOptions};

use crate::output::{Display, DisplayStatus, Frame};

/// Preview window showing the tone-mapped render.
pub struct MinifbDisplay {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbDisplay {
    /// Open a window for frames of the given size, scaled down to fit the screen.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, minifb::Error> {
        let width = width as usize;
        let height = height as usize;

        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                scale: Scale::FitScreen,
                resize: true,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }
}

impl Display for MinifbDisplay {
    fn show(&mut self, frame: &Frame) -> DisplayStatus {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return DisplayStatus::Closed;
        }

        let channels = frame.channels as usize;
        if frame.channels < 3 || frame.width as usize != self.width || frame.height as usize != self.height {
            warn!(
                "Skipping {}x{} frame with {} channels for a {}x{} window",
                frame.width, frame.height, frame.channels, self.width, self.height
            );
            return DisplayStatus::Open;
        }

        // minifb wants 0RGB packed into u32
        for (dst, px) in self.buffer.iter_mut().zip(frame.pixels.chunks_exact(channels)) {
            *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        }

        if let Err(e) = self
            .window
            .update_with_buffer(&self.buffer, self.width, self.height)
        {
            warn!("Failed to update preview window: {}", e);
        }

        if self.window.is_open() {
            DisplayStatus::Open
        } else {
            DisplayStatus::Closed
        }
    }
}
