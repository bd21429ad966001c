//! Vector types for points, directions and colors.
//!
//! All three roles share `glam::Vec3A`, which already provides the component-wise
//! and scalar arithmetic, dot/cross products, length, normalization, min/max and
//! negation the tracer needs. Division by zero is not special-cased: it yields
//! IEEE infinities/NaNs and callers avoid zero-length normalization by construction.

use glam::Vec3A;

/// A position in world space.
pub type Point3 = Vec3A;

/// Linear RGB color, one channel per component.
pub type Color = Vec3A;

/// Unit vector perpendicular to the 2-D edge `p1 -> p2`, lying in the z = 0 plane.
///
/// The edge direction `(dx, dy)` is rotated to `(-dy, dx)`, so for a triangle whose
/// vertices are ordered clockwise every edge normal points out of the triangle.
/// The z components of the inputs are ignored.
pub fn edge_normal(p1: Point3, p2: Point3) -> Vec3A {
    let v = p2 - p1;
    Vec3A::new(-v.y, v.x, 0.0).normalize()
}
