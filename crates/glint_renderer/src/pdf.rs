//! Sampling densities over directions.

use crate::{random::gen_f32, random_cosine_direction, random_unit_vector, HittableId, Scene};
use glint_math::{Onb, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A direction distribution that can be sampled and evaluated.
#[derive(Debug, Clone, Copy)]
pub enum Pdf<'a> {
    /// Uniform over the unit sphere
    Sphere,
    /// Cosine-weighted around the basis' `w` axis
    Cosine(Onb),
    /// Toward points on a hittable, as seen from `origin`
    Hittable {
        scene: &'a Scene,
        target: HittableId,
        origin: Vec3,
    },
    /// Equal-weight blend of two densities
    Mixture(&'a Pdf<'a>, &'a Pdf<'a>),
}

impl<'a> Pdf<'a> {
    /// Density of generating `direction`.
    ///
    /// Hittable densities intersect the target, which may consume randomness.
    pub fn value(&self, direction: Vec3, rng: &mut dyn RngCore) -> f32 {
        match self {
            Pdf::Sphere => 1.0 / (4.0 * PI),
            Pdf::Cosine(onb) => {
                let cosine_theta = direction.normalize().dot(onb.w);
                (cosine_theta / PI).max(0.0)
            }
            Pdf::Hittable {
                scene,
                target,
                origin,
            } => scene
                .object(*target)
                .pdf_value(scene, *origin, direction, rng),
            Pdf::Mixture(a, b) => 0.5 * a.value(direction, rng) + 0.5 * b.value(direction, rng),
        }
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            Pdf::Sphere => random_unit_vector(rng),
            Pdf::Cosine(onb) => onb.transform(random_cosine_direction(rng)),
            Pdf::Hittable {
                scene,
                target,
                origin,
            } => scene.object(*target).random(scene, *origin, rng),
            Pdf::Mixture(a, b) => {
                if gen_f32(rng) < 0.5 {
                    a.generate(rng)
                } else {
                    b.generate(rng)
                }
            }
        }
    }
}
