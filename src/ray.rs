//! Monochromatic light ray.
//!
//! A ray is defined as r(t) = origin + t * direction and carries the wavelength of
//! the light it transports. Rays are immutable: every bounce produces a new one.

use glam::Vec3A;

/// Lowest wavelength the tracer emits or colors, in nanometers.
pub const MIN_WAVELENGTH_NM: u32 = 380;

/// Upper end (exclusive) of the visible range used for coloring, in nanometers.
pub const MAX_WAVELENGTH_NM: u32 = 781;

/// Ray of monochromatic light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Starting point of the ray in world coordinates.
    pub origin: Vec3A,

    /// Direction of travel.
    ///
    /// Not required to be unit length; the optical model normalizes it before
    /// refracting or reflecting.
    pub direction: Vec3A,

    /// Wavelength in nanometers. Travels unchanged until the path ends.
    pub wavelength: u32,
}

impl Ray {
    /// Create a new ray with origin, direction and wavelength.
    pub fn new(origin: Vec3A, direction: Vec3A, wavelength: u32) -> Self {
        Self {
            origin,
            direction,
            wavelength,
        }
    }

    /// Compute a point at parameter t along the ray.
    pub fn at(&self, t: f32) -> Vec3A {
        self.origin + t * self.direction
    }
}
