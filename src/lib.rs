//! Prismatic spectral renderer
//!
//! Simulates white light passing through a triangular glass prism and landing on
//! a sheet of paper. Light paths are sampled from a lamp behind a narrow slit,
//! each carrying one wavelength; the glass bends them by a wavelength-dependent
//! refractive index, so the paper collects a spread-out spectrum. Worker threads
//! trace paths independently into their own buffers, which are merged and
//! tone-mapped into PNG snapshots.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod vector;
pub mod ray;
pub mod interval;
pub mod random;
pub mod optics;
pub mod prism;
pub mod hittable;
pub mod light;
pub mod camera;
pub mod scene;
pub mod config;
pub mod buffer;
pub mod tracer;
pub mod tonemap;
pub mod output;
pub mod coordinator;
#[cfg(feature = "window")]
pub mod display;
