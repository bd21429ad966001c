//! Wavelength-dependent optics of the glass prism.
//!
//! Cauchy dispersion for the refractive index, Schlick's Fresnel approximation,
//! Snell refraction, mirror reflection and the visible-spectrum color ramp.

use glam::Vec3A;

use crate::vector::Color;

/// Two-term Cauchy dispersion model, `n(λ) = B + C / λ²` with λ in micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CauchyDispersion {
    /// Constant term.
    pub b: f32,
    /// Coefficient of the 1/λ² term, in µm².
    pub c: f32,
}

impl CauchyDispersion {
    /// Calibration constant B of the base glass.
    pub const BASE_B: f32 = 1.5046;
    /// Calibration constant C of the base glass, in µm².
    pub const BASE_C: f32 = 0.00420;
    /// How much the visible spread is widened relative to the base glass.
    pub const WIDENING: f32 = 10.0;
    /// Wavelength whose index is preserved when widening, in µm.
    pub const REFERENCE_UM: f32 = 0.540;

    /// Create a model from raw coefficients.
    pub fn new(b: f32, c: f32) -> Self {
        Self { b, c }
    }

    /// Scale C by `factor` and re-derive B so that `n(reference_um)` is unchanged.
    pub fn widened(b: f32, c: f32, factor: f32, reference_um: f32) -> Self {
        let reference_sq = reference_um * reference_um;
        let new_c = c * factor;
        let new_b = b + c / reference_sq - new_c / reference_sq;
        Self::new(new_b, new_c)
    }

    /// Refractive index at a wavelength given in nanometers.
    pub fn refractive_index(&self, wavelength_nm: u32) -> f32 {
        let wl_um = wavelength_nm as f32 / 1000.0;
        self.b + self.c / (wl_um * wl_um)
    }
}

impl Default for CauchyDispersion {
    /// The base glass with its rainbow widened tenfold around 540 nm.
    fn default() -> Self {
        Self::widened(
            Self::BASE_B,
            Self::BASE_C,
            Self::WIDENING,
            Self::REFERENCE_UM,
        )
    }
}

/// Compute Fresnel reflectance using Schlick's approximation.
pub fn schlick(cosine: f32, refraction_index: f32) -> f32 {
    let r0 = (1.0 - refraction_index) / (1.0 + refraction_index);
    let r0 = r0 * r0;
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Reflect a vector off a surface. `v` and `n` must be unit length.
pub fn reflect(v: Vec3A, n: Vec3A) -> Vec3A {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through an interface using Snell's law.
///
/// `v` and `n` must be unit length, with `n` facing the side `v` comes from.
/// Returns `None` on total internal reflection.
pub fn refract(v: Vec3A, n: Vec3A, ni_over_nt: f32) -> Option<Vec3A> {
    let dt = v.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (v - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Approximate perceived color of monochromatic light, each channel in [0, 1].
///
/// Piecewise-linear ramps over [380, 440), [440, 490), [490, 510), [510, 580),
/// [580, 645) and [645, 781) nm, dimmed towards zero at both ends of the visible
/// range. Anything outside [380, 781) is black.
pub fn wavelength_to_rgb(wavelength_nm: u32) -> Color {
    let wl = wavelength_nm as f32;

    let (r, g, b) = match wavelength_nm {
        380..=439 => (-(wl - 440.0) / (440.0 - 380.0), 0.0, 1.0),
        440..=489 => (0.0, (wl - 440.0) / (490.0 - 440.0), 1.0),
        490..=509 => (0.0, 1.0, -(wl - 510.0) / (510.0 - 490.0)),
        510..=579 => ((wl - 510.0) / (580.0 - 510.0), 1.0, 0.0),
        580..=644 => (1.0, -(wl - 645.0) / (645.0 - 580.0), 0.0),
        645..=780 => (1.0, 0.0, 0.0),
        _ => return Color::ZERO,
    };

    // Eye sensitivity falls off at the edges of the visible range.
    let factor = match wavelength_nm {
        380..=419 => (wl - 380.0) / (420.0 - 380.0),
        420..=700 => 1.0,
        _ => (780.0 - wl) / (780.0 - 700.0),
    };

    Color::new(r, g, b) * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflecting_straight_down_off_the_floor_goes_straight_up() {
        let reflected = reflect(Vec3A::new(0.0, 0.0, -1.0), Vec3A::new(0.0, 0.0, 1.0));
        assert_eq!(reflected, Vec3A::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn reflection_ignores_normal_orientation() {
        let v = Vec3A::new(1.0, -1.0, 0.0).normalize();
        let n = Vec3A::new(0.0, 1.0, 0.0);
        assert_eq!(reflect(v, n), reflect(v, -n));
    }

    #[test]
    fn refraction_at_equal_indices_keeps_direction() {
        let v = Vec3A::new(0.0, 0.0, -1.0);
        let n = Vec3A::new(0.0, 0.0, 1.0);
        assert_eq!(refract(v, n, 1.0), Some(v));
    }

    #[test]
    fn refraction_bends_towards_normal_entering_glass() {
        let v = Vec3A::new(1.0, -1.0, 0.0).normalize();
        let n = Vec3A::new(0.0, 1.0, 0.0);
        let refracted = refract(v, n, 1.0 / 1.5).expect("entering glass always refracts");
        assert!((refracted.length() - 1.0).abs() < 1e-5);
        assert!(refracted.x > 0.0 && refracted.x < v.x);
        assert!(refracted.y < 0.0);
    }

    #[test]
    fn grazing_exit_from_glass_is_total_internal_reflection() {
        // Inside glass, normal facing the incoming side.
        let v = Vec3A::new(1.0, 0.2, 0.0).normalize();
        let n = Vec3A::new(0.0, -1.0, 0.0);
        assert_eq!(refract(v, n, 1.5), None);
    }

    #[test]
    fn schlick_at_normal_incidence_is_r0() {
        for &n in &[1.0_f32, 1.33, 1.5, 1.7] {
            let r0 = (1.0 - n) / (1.0 + n);
            assert_eq!(schlick(1.0, n), r0 * r0);
        }
    }

    #[test]
    fn schlick_at_grazing_angle_reflects_everything() {
        assert!((schlick(0.0, 1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn widened_dispersion_preserves_reference_index() {
        let base = CauchyDispersion::new(CauchyDispersion::BASE_B, CauchyDispersion::BASE_C);
        let widened = CauchyDispersion::default();
        assert!((widened.c - 0.042).abs() < 1e-7);
        assert!((base.refractive_index(540) - widened.refractive_index(540)).abs() < 1e-5);

        let base_spread = base.refractive_index(400) - base.refractive_index(700);
        let widened_spread = widened.refractive_index(400) - widened.refractive_index(700);
        assert!((widened_spread / base_spread - 10.0).abs() < 1e-2);
    }

    #[test]
    fn shorter_wavelengths_bend_more() {
        let dispersion = CauchyDispersion::default();
        let mut previous = dispersion.refractive_index(380);
        for wl in 381..=700 {
            let n = dispersion.refractive_index(wl);
            assert!(n < previous, "index not decreasing at {} nm", wl);
            previous = n;
        }
    }

    #[test]
    fn green_light_is_green_dominant() {
        let rgb = wavelength_to_rgb(550);
        assert_eq!(rgb.y, 1.0);
        assert_eq!(rgb.z, 0.0);
        assert!(rgb.x > 0.0 && rgb.x < 1.0);
    }

    #[test]
    fn visible_range_edges_are_dark() {
        let low = wavelength_to_rgb(380);
        let high = wavelength_to_rgb(780);
        assert!(low.x + low.y + low.z < 1e-6);
        assert!(high.x + high.y + high.z < 1e-6);
    }

    #[test]
    fn ramps_follow_the_spectrum() {
        assert_eq!(wavelength_to_rgb(450), Color::new(0.0, 0.2, 1.0));
        assert_eq!(wavelength_to_rgb(500), Color::new(0.0, 1.0, 0.5));
        assert_eq!(wavelength_to_rgb(600), Color::new(1.0, 45.0 / 65.0, 0.0));
        assert_eq!(wavelength_to_rgb(680), Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn invisible_wavelengths_are_black() {
        assert_eq!(wavelength_to_rgb(379), Color::ZERO);
        assert_eq!(wavelength_to_rgb(781), Color::ZERO);
        assert_eq!(wavelength_to_rgb(0), Color::ZERO);
    }
}
