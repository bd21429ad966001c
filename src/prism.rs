//! Triangular glass prism standing on the ground plane.
//!
//! The prism is an extruded triangle: three vertical rectangular faces over a
//! base triangle at z = 0, open at the top. Face normals are computed once from
//! the clockwise vertex order and always point outward.

use glam::Vec3A;

use crate::hittable::SurfaceHit;
use crate::interval::Interval;
use crate::ray::Ray;
use crate::vector::{edge_normal, Point3};

/// Fraction of the apex height the equilateral prism is shifted down by, which
/// puts it roughly at the center of the image.
const CENTERING: f32 = 0.4;

/// Extruded triangular prism.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    /// Base vertices at z = 0, clockwise from lower-left.
    vertices: [Point3; 3],

    /// Outward unit normal of face `i`, which spans `vertices[i] -> vertices[i + 1]`.
    normals: [Vec3A; 3],

    /// Extrusion height; faces end at this z.
    height: f32,

    /// Translation applied to the canonical triangle to center it.
    offset: Vec3A,
}

impl Prism {
    /// Equilateral prism with the given base width and height, centered around
    /// the origin of the ground plane.
    pub fn new(base_width: f32, height: f32) -> Self {
        let apex_y = base_width * 3.0_f32.sqrt() / 2.0;
        let offset = Vec3A::new(0.0, -apex_y * CENTERING, 0.0);

        let vertices = [
            Vec3A::new(-base_width / 2.0, 0.0, 0.0) + offset,
            Vec3A::new(0.0, apex_y, 0.0) + offset,
            Vec3A::new(base_width / 2.0, 0.0, 0.0) + offset,
        ];

        let mut prism = Self::from_vertices(vertices, height);
        prism.offset = offset;
        prism
    }

    /// Prism over an arbitrary clockwise base triangle.
    pub fn from_vertices(vertices: [Point3; 3], height: f32) -> Self {
        let vertices = vertices.map(|v| Vec3A::new(v.x, v.y, 0.0));
        let normals = [
            edge_normal(vertices[0], vertices[1]),
            edge_normal(vertices[1], vertices[2]),
            edge_normal(vertices[2], vertices[0]),
        ];

        Self {
            vertices,
            normals,
            height,
            offset: Vec3A::ZERO,
        }
    }

    /// Base vertices, clockwise.
    pub fn vertices(&self) -> &[Point3; 3] {
        &self.vertices
    }

    /// Outward face normals, face `i` spanning vertex `i` to vertex `i + 1`.
    pub fn normals(&self) -> &[Vec3A; 3] {
        &self.normals
    }

    /// Height of the faces above the ground.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Translation that was applied to center the prism.
    pub fn offset(&self) -> Vec3A {
        self.offset
    }

    /// Center of the base triangle.
    pub fn centroid(&self) -> Point3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    /// Endpoints of the base edge under face `side`.
    pub fn edge(&self, side: usize) -> (Point3, Point3) {
        (self.vertices[side], self.vertices[(side + 1) % 3])
    }

    /// Whether the point's projection onto the ground lies inside the base triangle.
    pub fn contains_xy(&self, p: Point3) -> bool {
        let flat = Vec3A::new(p.x, p.y, 0.0);
        self.vertices
            .iter()
            .zip(self.normals.iter())
            .all(|(v, n)| (flat - *v).dot(*n) <= 0.0)
    }

    /// Intersect a ray with face `side`.
    ///
    /// The face is treated as the infinite vertical plane through its edge, then
    /// clipped to the prism height and to the edge segment. Hits at or closer than
    /// `min_distance` are rejected to avoid re-hitting the face a ray just left.
    pub fn intersect_side(&self, ray: &Ray, side: usize, min_distance: f32) -> Option<SurfaceHit> {
        let (p1, p2) = self.edge(side);
        let n = self.normals[side];

        let denom = ray.direction.dot(n);
        if denom == 0.0 {
            // Parallel to the face.
            return None;
        }

        let t = -(ray.origin - p1).dot(n) / denom;
        if t <= min_distance {
            return None;
        }

        let point = ray.at(t);
        if point.z > self.height {
            return None;
        }

        // Test against the edge extent along the axis the face is most aligned with.
        let inside = if n.x.abs() > n.y.abs() {
            Interval::spanning(p1.y, p2.y).contains(point.y)
        } else {
            Interval::spanning(p1.x, p2.x).contains(point.x)
        };
        if !inside {
            return None;
        }

        Some(SurfaceHit {
            t,
            point,
            normal: n,
        })
    }
}
