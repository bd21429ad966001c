//! Ray-surface intersection for the prism scene.
//!
//! The scene has exactly four surfaces: the three prism faces and the ground
//! plane at z = 0. [`nearest_hit`] tests them in a fixed order and reports the
//! closest one as an [`Intersection`] variant.

use glam::Vec3A;

use crate::interval::Interval;
use crate::prism::Prism;
use crate::ray::Ray;

/// Where a ray meets a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Point where the ray intersects the surface
    pub point: Vec3A,
    /// Outward unit normal of the surface
    pub normal: Vec3A,
}

/// Closest surface hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// Prism face spanning vertex 0 to vertex 1.
    Side0(SurfaceHit),
    /// Prism face spanning vertex 1 to vertex 2.
    Side1(SurfaceHit),
    /// Prism face spanning vertex 2 to vertex 0.
    Side2(SurfaceHit),
    /// The receiving plane at z = 0.
    Ground(SurfaceHit),
    /// The ray leaves the scene.
    None,
}

impl Intersection {
    fn side(index: usize, hit: SurfaceHit) -> Self {
        match index {
            0 => Intersection::Side0(hit),
            1 => Intersection::Side1(hit),
            _ => Intersection::Side2(hit),
        }
    }

    /// The hit record, if any surface was hit.
    pub fn hit(&self) -> Option<&SurfaceHit> {
        match self {
            Intersection::Side0(hit)
            | Intersection::Side1(hit)
            | Intersection::Side2(hit)
            | Intersection::Ground(hit) => Some(hit),
            Intersection::None => None,
        }
    }

    /// Distance to the hit, `f32::MAX` when nothing was hit.
    pub fn t(&self) -> f32 {
        self.hit().map_or(f32::MAX, |hit| hit.t)
    }

    /// Whether `candidate` is strictly closer than the current best.
    ///
    /// Ties keep the current best, so the surface tested first wins.
    pub fn is_beaten_by(&self, candidate: &SurfaceHit) -> bool {
        candidate.t < self.t()
    }
}

/// Intersect a ray with the ground plane z = 0.
///
/// Rays parallel to the plane never hit it. Any distance beyond `min_distance`
/// is accepted.
pub fn intersect_ground(ray: &Ray, min_distance: f32) -> Option<SurfaceHit> {
    let dz = ray.direction.z;
    if dz == 0.0 {
        return None;
    }

    let t = -ray.origin.z / dz;
    if t <= min_distance {
        return None;
    }

    Some(SurfaceHit {
        t,
        point: ray.at(t),
        normal: Vec3A::Z,
    })
}

/// Find the closest surface along the ray.
///
/// Surfaces are tested in the order side 0, side 1, side 2, ground. A face hit
/// only counts when it lies strictly above the base (z > 0).
pub fn nearest_hit(prism: &Prism, ray: &Ray, min_distance: f32) -> Intersection {
    let mut best = Intersection::None;
    let above_base = Interval::new(0.0, f32::INFINITY);

    for side in 0..3 {
        if let Some(hit) = prism.intersect_side(ray, side, min_distance) {
            if above_base.surrounds(hit.point.z) && best.is_beaten_by(&hit) {
                best = Intersection::side(side, hit);
            }
        }
    }

    if let Some(hit) = intersect_ground(ray, min_distance) {
        if best.is_beaten_by(&hit) {
            best = Intersection::Ground(hit);
        }
    }

    best
}
