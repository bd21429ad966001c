//! Per-worker light-path tracing.
//!
//! A worker repeatedly samples a ray from the light rig, follows it through any
//! number of prism faces, and when it lands on the paper deposits the color of
//! its wavelength into the worker's accumulation buffer. Cancellation is checked
//! only between paths, never in the middle of one.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::buffer::BufferWriter;
use crate::coordinator::CancellationToken;
use crate::hittable::{nearest_hit, Intersection, SurfaceHit};
use crate::optics::{reflect, refract, schlick, wavelength_to_rgb};
use crate::random::Sampler;
use crate::ray::Ray;
use crate::scene::Scene;

/// How a single light path ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// Landed on the paper inside the image and left a deposit.
    Deposited,
    /// Landed on the paper outside the image.
    OffImage,
    /// Left the scene without touching the paper.
    Escaped,
    /// Kept bouncing inside the prism past the bounce cap.
    BounceLimit,
}

/// Counts of path outcomes for one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    /// Paths traced.
    pub paths: u64,
    /// Paths that left a deposit.
    pub deposited: u64,
    /// Paths that landed outside the image.
    pub off_image: u64,
    /// Paths that never reached the paper.
    pub escaped: u64,
    /// Paths abandoned at the bounce cap.
    pub bounce_limited: u64,
    /// Prism bounces over all paths.
    pub bounces: u64,
}

impl TraceStats {
    fn record(&mut self, outcome: PathOutcome) {
        self.paths += 1;
        match outcome {
            PathOutcome::Deposited => self.deposited += 1,
            PathOutcome::OffImage => self.off_image += 1,
            PathOutcome::Escaped => self.escaped += 1,
            PathOutcome::BounceLimit => self.bounce_limited += 1,
        }
    }

    /// Sum of two workers' statistics.
    pub fn merge(&self, other: &TraceStats) -> TraceStats {
        TraceStats {
            paths: self.paths + other.paths,
            deposited: self.deposited + other.deposited,
            off_image: self.off_image + other.off_image,
            escaped: self.escaped + other.escaped,
            bounce_limited: self.bounce_limited + other.bounce_limited,
            bounces: self.bounces + other.bounces,
        }
    }
}

/// Light-path tracer owned by one worker thread.
pub struct PathTracer<'a> {
    scene: &'a Scene,
    sampler: Sampler,
    stats: TraceStats,
}

impl<'a> PathTracer<'a> {
    /// Create a tracer whose random sequence is fixed by `seed`.
    pub fn new(scene: &'a Scene, seed: u64) -> Self {
        Self {
            scene,
            sampler: Sampler::new(seed),
            stats: TraceStats::default(),
        }
    }

    /// Statistics of all paths traced so far.
    pub fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Trace paths until cancelled or until `max_paths` paths are done.
    ///
    /// `progress` receives the running path count for progress display.
    pub fn run(
        &mut self,
        writer: &mut BufferWriter,
        cancel: &CancellationToken,
        max_paths: Option<u64>,
        progress: Option<&AtomicU64>,
    ) -> TraceStats {
        let mut traced = 0u64;
        while !cancel.is_cancelled() && max_paths.map_or(true, |max| traced < max) {
            self.trace_path(writer);
            traced += 1;
            if let Some(progress) = progress {
                progress.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(
            "Tracer stopped after {} paths ({} deposited, {} escaped)",
            traced, self.stats.deposited, self.stats.escaped
        );
        self.stats
    }

    /// Sample one light path and follow it until it lands, escapes or hits the
    /// bounce cap.
    pub fn trace_path(&mut self, writer: &mut BufferWriter) -> PathOutcome {
        let mut ray = self.scene.light.sample(&mut self.sampler);
        let mut bounces = 0u32;

        let outcome = loop {
            match nearest_hit(&self.scene.prism, &ray, self.scene.min_hit_distance) {
                Intersection::None => break PathOutcome::Escaped,
                Intersection::Ground(hit) => break self.deposit(writer, &ray, &hit),
                Intersection::Side0(hit) | Intersection::Side1(hit) | Intersection::Side2(hit) => {
                    if bounces >= self.scene.max_bounces {
                        break PathOutcome::BounceLimit;
                    }
                    bounces += 1;
                    ray = self.scatter(&ray, &hit);
                }
            }
        };

        self.stats.bounces += bounces as u64;
        self.stats.record(outcome);
        outcome
    }

    /// New ray leaving a glass face, either reflected or refracted.
    ///
    /// The face normal always points out of the prism; the sign of
    /// `direction · normal` tells whether the ray is entering or leaving the glass.
    pub fn scatter(&mut self, ray: &Ray, hit: &SurfaceHit) -> Ray {
        let refraction_index = self.scene.dispersion.refractive_index(ray.wavelength);
        let dir = ray.direction.normalize();
        let d_n = dir.dot(hit.normal);

        let (normal, ni_over_nt, cosine) = if d_n > 0.0 {
            // Inside the glass, heading out.
            (-hit.normal, refraction_index, refraction_index * d_n)
        } else {
            (hit.normal, 1.0 / refraction_index, -d_n)
        };

        let direction = match refract(dir, normal, ni_over_nt) {
            Some(refracted) => {
                if self.sampler.next_f32() < schlick(cosine, refraction_index) {
                    reflect(dir, hit.normal)
                } else {
                    refracted
                }
            }
            None => reflect(dir, hit.normal),
        };

        Ray::new(hit.point, direction, ray.wavelength)
    }

    fn deposit(&self, writer: &mut BufferWriter, ray: &Ray, hit: &SurfaceHit) -> PathOutcome {
        let Some((x, y)) = self.scene.camera.project(hit.point) else {
            return PathOutcome::OffImage;
        };

        let color = wavelength_to_rgb(ray.wavelength) * self.scene.deposit_intensity;
        if writer.add(x, y, color) {
            PathOutcome::Deposited
        } else {
            PathOutcome::OffImage
        }
    }
}
