//! Color sources referenced by handle from materials.

use crate::perlin::MARBLE_TURBULENCE_DEPTH;
use crate::{Color, Perlin};
use glint_core::NoiseKind;
use glint_math::{Vec2, Vec3};

/// Index into the scene's texture table.
pub type TextureId = usize;

#[derive(Debug, Clone)]
pub enum Texture {
    Solid(Color),
    /// 3D checkerboard of two other textures
    Checker {
        inv_scale: f32,
        even: TextureId,
        odd: TextureId,
    },
    Noise {
        noise: Perlin,
        albedo: Color,
        scale: f32,
        kind: NoiseKind,
    },
}

impl Texture {
    /// Checkerboard with cells `scale` units wide.
    pub fn checker(scale: f32, even: TextureId, odd: TextureId) -> Self {
        Texture::Checker {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    /// Color at surface coordinates `uv` and world point `p`.
    ///
    /// `textures` is the table checker handles index into; a dangling handle
    /// reads as black.
    pub fn value(&self, textures: &[Texture], uv: Vec2, p: Vec3) -> Color {
        match self {
            Texture::Solid(albedo) => *albedo,
            Texture::Checker {
                inv_scale,
                even,
                odd,
            } => {
                let cell = (*inv_scale * p).floor();
                let parity = (cell.x as i64 + cell.y as i64 + cell.z as i64).rem_euclid(2);
                let pick = if parity == 0 { *even } else { *odd };
                textures
                    .get(pick)
                    .map_or(Color::ZERO, |texture| texture.value(textures, uv, p))
            }
            Texture::Noise {
                noise,
                albedo,
                scale,
                kind,
            } => match kind {
                NoiseKind::Perlin => *albedo * 0.5 * (1.0 + noise.noise(*scale * p)),
                NoiseKind::Marble => {
                    let phase = *scale * p.z + 10.0 * noise.turb(p, MARBLE_TURBULENCE_DEPTH);
                    *albedo * (1.0 + phase.sin())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_solid() {
        let tex = Texture::Solid(Color::new(0.1, 0.2, 0.3));
        assert_eq!(tex.value(&[], Vec2::ZERO, Vec3::splat(100.0)), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_checker_alternates() {
        let textures = vec![
            Texture::Solid(Color::ZERO),
            Texture::Solid(Color::ONE),
            Texture::checker(1.0, 0, 1),
        ];
        let checker = &textures[2];
        let at = |p: Vec3| checker.value(&textures, Vec2::ZERO, p);

        assert_eq!(at(Vec3::new(0.5, 0.5, 0.5)), Color::ZERO);
        assert_eq!(at(Vec3::new(1.5, 0.5, 0.5)), Color::ONE);
        assert_eq!(at(Vec3::new(1.5, 1.5, 0.5)), Color::ZERO);
        assert_eq!(at(Vec3::new(-0.5, 0.5, 0.5)), Color::ONE);
    }

    #[test]
    fn test_checker_scale() {
        let textures = vec![
            Texture::Solid(Color::ZERO),
            Texture::Solid(Color::ONE),
            Texture::checker(2.0, 0, 1),
        ];
        let value = textures[2].value(&textures, Vec2::ZERO, Vec3::new(1.5, 0.5, 0.5));
        assert_eq!(value, Color::ZERO);
        let value = textures[2].value(&textures, Vec2::ZERO, Vec3::new(2.5, 0.5, 0.5));
        assert_eq!(value, Color::ONE);
    }

    #[test]
    fn test_noise_ranges() {
        let mut rng = StdRng::seed_from_u64(0);
        // Perlin stays near [0, albedo]; marble swings over [0, 2 * albedo]
        for (kind, max) in [(NoiseKind::Perlin, 1.5), (NoiseKind::Marble, 2.0)] {
            let tex = Texture::Noise {
                noise: Perlin::new(256, &mut rng),
                albedo: Color::ONE,
                scale: 4.0,
                kind,
            };
            for i in 0..200 {
                let p = Vec3::new(i as f32 * 0.173, (i % 7) as f32 * 0.31, i as f32 * -0.05);
                let c = tex.value(&[], Vec2::ZERO, p);
                assert!(c.min_element() >= -0.5 && c.max_element() <= max + 1e-5, "{kind:?}: {c:?}");
            }
        }
    }

    #[test]
    fn test_marble_full_brightness() {
        let noise = Perlin::new(256, &mut StdRng::seed_from_u64(4));
        let p = Vec3::new(0.3, -1.2, 2.5);
        let phase = 3.0 * p.z + 10.0 * noise.turb(p, MARBLE_TURBULENCE_DEPTH);
        let tex = Texture::Noise {
            noise,
            albedo: Color::new(0.2, 0.4, 0.8),
            scale: 3.0,
            kind: NoiseKind::Marble,
        };
        let expected = Color::new(0.2, 0.4, 0.8) * (1.0 + phase.sin());
        let value = tex.value(&[], Vec2::ZERO, p);
        assert!((value - expected).length() < 1e-6, "{value:?} vs {expected:?}");
    }
}
