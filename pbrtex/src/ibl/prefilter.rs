//! Specular prefiltering with GGX importance sampling.
//!
//! Each mip of the prefiltered cube map corresponds to one roughness value.
//! For every texel, with `N = V = R` (the texel direction), 1024 Hammersley
//! points are mapped to GGX half vectors, reflected into light directions and
//! accumulated weighted by `N·L`. The source level of every sample is chosen
//! from its PDF so that low-probability samples read a blurrier mip.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::irradiance::tangent_frame;
use super::sampling::RadianceSource;

/// Hammersley points per texel.
pub const SAMPLE_COUNT: u32 = 1024;

/// Mip level that reaches roughness 1.
pub const MAX_ROUGHNESS_LEVEL: u32 = 4;

/// Roughness rendered into prefilter mip `level`.
pub fn roughness_for_level(level: u32) -> f32 {
    level.min(MAX_ROUGHNESS_LEVEL) as f32 / MAX_ROUGHNESS_LEVEL as f32
}

/// Van der Corput radical inverse in base 2.
pub fn radical_inverse_vdc(bits: u32) -> f32 {
    bits.reverse_bits() as f32 * 2.328_306_4e-10
}

/// The `i`-th of `n` Hammersley points.
pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n as f32, radical_inverse_vdc(i))
}

/// GGX half vector around `normal` for the sample `xi`.
///
/// `roughness` is perceptual; the distribution uses `α = roughness²`.
pub fn importance_sample_ggx(xi: Vec2, normal: Vec3, roughness: f32) -> Vec3 {
    let a = roughness * roughness;

    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let h = Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);

    let (right, up) = tangent_frame(normal);
    (right * h.x + up * h.y + normal * h.z).normalize()
}

/// GGX normal distribution `D(h)`.
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h2 = n_dot_h * n_dot_h;
    let denom = n_dot_h2 * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// Source mip for one sample.
///
/// `0.5 · log2(Ω_sample / Ω_texel)` with `Ω_sample = 1 / (N · pdf)` and
/// `Ω_texel = 4π / (6 · res²)`; exactly 0 for a mirror.
pub fn source_lod(roughness: f32, n_dot_h: f32, h_dot_v: f32, resolution: u32) -> f32 {
    if roughness == 0.0 {
        return 0.0;
    }
    let d = distribution_ggx(n_dot_h, roughness);
    let pdf = d * n_dot_h / (4.0 * h_dot_v) + 0.0001;

    let res = resolution.max(1) as f32;
    let texel_solid_angle = 4.0 * PI / (6.0 * res * res);
    let sample_solid_angle = 1.0 / (SAMPLE_COUNT as f32 * pdf + 0.0001);

    (0.5 * (sample_solid_angle / texel_solid_angle).log2()).max(0.0)
}

/// Prefiltered radiance around `direction` at `roughness`.
pub fn prefilter(source: &impl RadianceSource, direction: Vec3, roughness: f32) -> Vec3 {
    let n = direction.normalize();
    let v = n;
    let resolution = source.resolution();

    let mut color = Vec3::ZERO;
    let mut total_weight = 0.0;

    for i in 0..SAMPLE_COUNT {
        let xi = hammersley(i, SAMPLE_COUNT);
        let h = importance_sample_ggx(xi, n, roughness);
        let l = (2.0 * v.dot(h) * h - v).normalize();

        let n_dot_l = n.dot(l).max(0.0);
        if n_dot_l > 0.0 {
            let n_dot_h = n.dot(h).max(0.0);
            let h_dot_v = h.dot(v).max(0.0);
            let lod = source_lod(roughness, n_dot_h, h_dot_v, resolution);

            color += source.radiance(l, lod) * n_dot_l;
            total_weight += n_dot_l;
        }
    }

    if total_weight > 0.0 {
        color / total_weight
    } else {
        source.radiance(n, 0.0)
    }
}
