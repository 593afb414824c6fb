//! Perlin gradient noise.

use crate::random_unit_vector;
use glint_math::Vec3;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Octaves summed by the turbulence used for marble.
pub const MARBLE_TURBULENCE_DEPTH: u32 = 7;

/// Gradient-noise generator.
///
/// Tables are drawn once from the supplied generator; afterwards `noise` is a
/// pure function of position.
#[derive(Debug, Clone)]
pub struct Perlin {
    randvec: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    /// `point_count` is clamped to at least 1.
    pub fn new(point_count: usize, rng: &mut dyn RngCore) -> Self {
        let point_count = point_count.max(1);
        let randvec = (0..point_count).map(|_| random_unit_vector(rng)).collect();

        Self {
            randvec,
            perm_x: Self::generate_perm(point_count, rng),
            perm_y: Self::generate_perm(point_count, rng),
            perm_z: Self::generate_perm(point_count, rng),
        }
    }

    pub fn point_count(&self) -> usize {
        self.randvec.len()
    }

    /// Smooth noise in roughly `[-1, 1]`.
    pub fn noise(&self, p: Vec3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;
        let (i, j, k) = (floor.x as i64, floor.y as i64, floor.z as i64);
        let n = self.randvec.len();
        let wrap = |v: i64| v.rem_euclid(n as i64) as usize;

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    let index = self.perm_x[wrap(i + di as i64)]
                        ^ self.perm_y[wrap(j + dj as i64)]
                        ^ self.perm_z[wrap(k + dk as i64)];
                    // XOR of indices below a non-power-of-two count can overflow it
                    *cell = self.randvec[index % n];
                }
            }
        }

        perlin_interp(&c, frac)
    }

    /// Sum of `depth` octaves, each at double frequency and half weight.
    pub fn turb(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }

    fn generate_perm(point_count: usize, rng: &mut dyn RngCore) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..point_count).collect();
        perm.shuffle(rng);
        perm
    }
}

/// Trilinear blend of lattice gradients with Hermite smoothing.
fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    let smooth = frac * frac * (Vec3::splat(3.0) - 2.0 * frac);
    let mut accum = 0.0;

    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let corner = Vec3::new(i as f32, j as f32, k as f32);
                let blend = corner * smooth + (Vec3::ONE - corner) * (Vec3::ONE - smooth);
                let weight = frac - corner;
                accum += blend.x * blend.y * blend.z * gradient.dot(weight);
            }
        }
    }

    accum
}
