//! Immutable description of one render, shared by every worker.

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::light::LightRig;
use crate::optics::CauchyDispersion;
use crate::prism::Prism;

/// Everything a worker needs to trace paths, computed once per render.
#[derive(Debug, Clone)]
pub struct Scene {
    /// The glass prism.
    pub prism: Prism,
    /// Where new light paths start.
    pub light: LightRig,
    /// Ground-plane to pixel mapping.
    pub camera: Camera,
    /// Refractive index of the glass per wavelength.
    pub dispersion: CauchyDispersion,
    /// Hits closer than this to a ray's origin are ignored.
    pub min_hit_distance: f32,
    /// Scale of the color deposited per landed path.
    pub deposit_intensity: f32,
    /// Prism bounces after which a path is abandoned.
    pub max_bounces: u32,
}

impl Scene {
    /// Build the scene described by `config`.
    pub fn new(config: &RenderConfig) -> Self {
        let prism = Prism::new(config.prism_width, config.prism_height);
        let light = LightRig::new(&prism);

        Self {
            prism,
            light,
            camera: Camera::new(config.width, config.height, config.zoom),
            dispersion: CauchyDispersion::default(),
            min_hit_distance: config.min_hit_distance,
            deposit_intensity: config.deposit_intensity,
            max_bounces: config.max_bounces,
        }
    }
}
