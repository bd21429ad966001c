//! Light sources illuminating the prism.
//!
//! Most light comes from a distant lamp through a narrow vertical slit beside the
//! prism. A small share falls from above onto the prism itself so its outline
//! shows up on the paper.

use glam::Vec3A;

use crate::prism::Prism;
use crate::random::Sampler;
use crate::ray::{Ray, MIN_WAVELENGTH_NM};
use crate::vector::Point3;

/// Upper end (exclusive) of the emitted wavelengths, in nanometers.
pub const MAX_EMITTED_NM: u32 = 700;

/// Lamp, slit and top light geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    /// Lamp position, before centering.
    pub lamp: Point3,
    /// x coordinate of the slit plane, before centering.
    pub slit_x: f32,
    /// Lower y edge of the slit, before centering.
    pub slit_y: f32,
    /// Slit opening along y.
    pub slit_width: f32,
    /// Slit opening along z, starting at the ground.
    pub slit_height: f32,
    /// Probability that a path starts at the top light instead of the lamp.
    pub ambient_probability: f32,
    /// Height of the top light above the ground.
    pub ambient_height: f32,
    /// Side length of the square the top light rays start from.
    pub ambient_source_size: f32,
    /// Side length of the square on the ground the top light rays aim at.
    pub ambient_target_size: f32,
    /// Translation shared with the prism.
    pub offset: Vec3A,
    /// Point the top light is centered on.
    pub center: Point3,
}

impl LightRig {
    /// Standard rig lighting the given prism.
    pub fn new(prism: &Prism) -> Self {
        Self {
            lamp: Vec3A::new(-10.0, -3.2, 1.0),
            slit_x: -0.6,
            slit_y: -0.05,
            slit_width: 0.002,
            slit_height: 1.0,
            ambient_probability: 0.10,
            ambient_height: 10.0,
            ambient_source_size: 0.1,
            ambient_target_size: 1.0,
            offset: prism.offset(),
            center: prism.centroid(),
        }
    }

    /// Draw the first ray of a new light path.
    pub fn sample(&self, sampler: &mut Sampler) -> Ray {
        let mut origin = self.lamp;
        let mut target = Vec3A::new(
            self.slit_x,
            self.slit_y + sampler.next_f32() * self.slit_width,
            sampler.next_f32() * self.slit_height,
        );
        let span = (MAX_EMITTED_NM - MIN_WAVELENGTH_NM) as f32;
        let wavelength = (MIN_WAVELENGTH_NM as f32 + span * sampler.next_f32()) as u32;

        origin += self.offset;
        target += self.offset;

        if sampler.next_f32() < self.ambient_probability {
            origin = self.center
                + Vec3A::new(
                    (sampler.next_f32() - 0.5) * self.ambient_source_size,
                    (sampler.next_f32() - 0.5) * self.ambient_source_size,
                    self.ambient_height,
                );
            target = self.center
                + Vec3A::new(
                    (sampler.next_f32() - 0.5) * self.ambient_target_size,
                    (sampler.next_f32() - 0.5) * self.ambient_target_size,
                    0.0,
                );
        }

        Ray::new(origin, (target - origin).normalize(), wavelength)
    }
}
