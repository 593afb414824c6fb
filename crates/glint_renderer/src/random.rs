//! Sampling helpers shared by materials, PDFs and the camera.
//!
//! Everything takes an explicit generator; there is no global RNG.

use glint_math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use std::f32::consts::PI;

/// Uniform sample in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Uniform sample in `[min, max)`.
#[inline]
pub fn gen_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * gen_f32(rng)
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Rejection sampling; the lower bound avoids normalizing near-zero vectors
    loop {
        let v = Vec3::new(
            gen_range(rng, -1.0, 1.0),
            gen_range(rng, -1.0, 1.0),
            gen_range(rng, -1.0, 1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Uniform point in the unit disk on the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_range(rng, -1.0, 1.0), gen_range(rng, -1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

/// Cosine-weighted direction on the +Z hemisphere.
pub fn random_cosine_direction(rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f32(rng);
    let r2 = gen_f32(rng);

    let phi = 2.0 * PI * r1;
    let x = phi.cos() * r2.sqrt();
    let y = phi.sin() * r2.sqrt();
    let z = (1.0 - r2).sqrt();
    Vec3::new(x, y, z)
}

/// Generator for one pixel of one frame.
///
/// Each (seed, frame, pixel) triple gets its own stream, so the image does
/// not depend on how pixels are scheduled across threads. The hash is
/// expanded into the full generator state 8 bytes at a time.
pub fn pixel_rng(seed: u64, frame: u32, pixel: usize) -> SmallRng {
    let mut state = splitmix64(seed);
    state = splitmix64(state ^ u64::from(frame));
    state = splitmix64(state ^ pixel as u64);

    let mut bytes = <SmallRng as SeedableRng>::Seed::default();
    for chunk in bytes.as_mut().chunks_exact_mut(8) {
        state = splitmix64(state);
        chunk.copy_from_slice(&state.to_le_bytes());
    }
    SmallRng::from_seed(bytes)
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_unit_vector_is_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_disk_and_hemisphere() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let d = random_in_unit_disk(&mut rng);
            assert!(d.length_squared() < 1.0);
            assert_eq!(d.z, 0.0);

            let c = random_cosine_direction(&mut rng);
            assert!(c.z >= 0.0);
            assert!((c.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_pixel_rng_streams() {
        let a: u64 = pixel_rng(1, 0, 5).next_u64();
        let b: u64 = pixel_rng(1, 0, 5).next_u64();
        assert_eq!(a, b);

        assert_ne!(a, pixel_rng(1, 0, 6).next_u64());
        assert_ne!(a, pixel_rng(1, 1, 5).next_u64());
        assert_ne!(a, pixel_rng(2, 0, 5).next_u64());
    }

    #[test]
    fn test_splitmix_reference_values() {
        // First outputs of the reference SplitMix64 stream seeded with 0
        assert_eq!(splitmix64(0), 0xE220_A839_7B1D_CDAF);
        assert_eq!(splitmix64(0x9E37_79B9_7F4A_7C15), 0x6E78_9E6A_A1B9_65F4);
    }
}
