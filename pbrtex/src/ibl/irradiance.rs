//! Diffuse irradiance convolution.
//!
//! For every output texel the hemisphere around its direction `N` is walked
//! on a fixed (θ, φ) grid and the cosine-weighted radiance is averaged:
//!
//! ```text
//! irradiance(N) = π / n · Σ L(dir(θ, φ)) · cos θ · sin θ
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

use super::sampling::RadianceSource;

/// Polar step of the hemisphere walk in radians.
pub const THETA_STEP: f32 = 0.01;
/// Azimuthal step of the hemisphere walk in radians.
pub const PHI_STEP: f32 = 0.025;

/// Tangent frame around `normal`: `(right, up)`.
///
/// The reference up is +Y unless the normal is nearly parallel to it, in
/// which case +X is used.
pub fn tangent_frame(normal: Vec3) -> (Vec3, Vec3) {
    let reference = if normal.y.abs() > 0.999 { Vec3::X } else { Vec3::Y };
    let right = reference.cross(normal).normalize();
    let up = normal.cross(right);
    (right, up)
}

/// Number of (θ, φ) samples taken per texel.
pub fn sample_count() -> usize {
    theta_steps() * phi_steps()
}

fn theta_steps() -> usize {
    (FRAC_PI_2 / THETA_STEP).ceil() as usize
}

fn phi_steps() -> usize {
    (2.0 * PI / PHI_STEP).ceil() as usize
}

/// Source mip used for the hemisphere samples.
///
/// Each sample stands for `2π / n` steradians of the hemisphere; the level
/// whose texels cover that solid angle is sampled.
pub fn source_lod(resolution: u32) -> f32 {
    let res = resolution.max(1) as f32;
    let texel_solid_angle = 4.0 * PI / (6.0 * res * res);
    let sample_solid_angle = 2.0 * PI / sample_count() as f32;
    (0.5 * (sample_solid_angle / texel_solid_angle).log2()).max(0.0)
}

/// Irradiance arriving at a surface with the given normal.
pub fn convolve(source: &impl RadianceSource, normal: Vec3) -> Vec3 {
    let normal = normal.normalize();
    let (right, up) = tangent_frame(normal);
    let lod = source_lod(source.resolution());

    let mut sum = Vec3::ZERO;
    let mut samples = 0usize;
    for t in 0..theta_steps() {
        let theta = t as f32 * THETA_STEP;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for p in 0..phi_steps() {
            let phi = p as f32 * PHI_STEP;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let tangent = Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta);
            let direction = tangent.x * right + tangent.y * up + tangent.z * normal;

            sum += source.radiance(direction, lod) * cos_theta * sin_theta;
            samples += 1;
        }
    }

    PI * sum / samples as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(Vec3);

    impl RadianceSource for Constant {
        fn radiance(&self, _: Vec3, _: f32) -> Vec3 {
            self.0
        }

        fn resolution(&self) -> u32 {
            64
        }
    }

    struct SkyOnly;

    impl RadianceSource for SkyOnly {
        fn radiance(&self, direction: Vec3, _: f32) -> Vec3 {
            if direction.y > 0.0 {
                Vec3::ONE
            } else {
                Vec3::ZERO
            }
        }

        fn resolution(&self) -> u32 {
            64
        }
    }

    #[test]
    fn test_tangent_frame_is_orthonormal() {
        for normal in [Vec3::X, Vec3::Y, Vec3::NEG_Y, Vec3::new(0.3, -0.5, 0.8).normalize()] {
            let (right, up) = tangent_frame(normal);
            assert!((right.length() - 1.0).abs() < 1e-5);
            assert!((up.length() - 1.0).abs() < 1e-5);
            assert!(right.dot(normal).abs() < 1e-5);
            assert!(up.dot(normal).abs() < 1e-5);
            assert!(right.dot(up).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(), 158 * 252);
    }

    #[test]
    fn test_constant_environment_gives_constant_irradiance() {
        let radiance = Vec3::new(0.5, 1.0, 2.0);
        for normal in [Vec3::X, Vec3::Y, Vec3::NEG_Z] {
            let irradiance = convolve(&Constant(radiance), normal);
            assert!(
                (irradiance - radiance).abs().max_element() < 0.02,
                "{:?}",
                irradiance
            );
        }
    }

    #[test]
    fn test_facing_away_from_light_is_dark() {
        let down = convolve(&SkyOnly, Vec3::NEG_Y);
        let up = convolve(&SkyOnly, Vec3::Y);
        assert!(down.max_element() < 0.01);
        assert!(up.min_element() > 0.95);
    }

    #[test]
    fn test_source_lod_grows_with_resolution() {
        assert_eq!(source_lod(1), 0.0);
        assert!(source_lod(1024) > source_lod(256));
    }
}
