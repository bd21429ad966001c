//! Projection from the ground plane onto the output image.
//!
//! The paper spans x in [-0.5, 0.5] across the image width at zoom 1; the image
//! height follows from the aspect ratio. Zooming scales around the image center.

use crate::vector::Point3;

/// Linear mapping between ground-plane points and pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Magnification around the image center
    pub zoom: f32,
}

impl Camera {
    /// Creates a camera for an image of the given size.
    pub fn new(width: u32, height: u32, zoom: f32) -> Self {
        Self {
            width,
            height,
            zoom,
        }
    }

    /// Pixel the ground point lands on, or `None` if it falls outside the image.
    ///
    /// Row 0 is the top of the image, so world +y points up.
    pub fn project(&self, p: Point3) -> Option<(u32, u32)> {
        let w = self.width as f32;
        let px = (p.x * self.zoom + 0.5) * w;
        let py = (p.y * self.zoom + self.height as f32 / 2.0 / w) * w;

        let x = (px + 0.5) as i64;
        let y = self.height as i64 - 1 - (py + 0.5) as i64;

        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// Ground-plane point at the center of a pixel, `None` for pixels outside
    /// the image.
    pub fn unproject(&self, x: u32, y: u32) -> Option<Point3> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let w = self.width as f32;
        let px = x as f32;
        let py = (self.height - 1 - y) as f32;

        Some(Point3::new(
            (px / w - 0.5) / self.zoom,
            (py / w - self.height as f32 / 2.0 / w) / self.zoom,
            0.0,
        ))
    }
}
