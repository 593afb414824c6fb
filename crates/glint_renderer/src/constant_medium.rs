//! Homogeneous participating medium bounded by another hittable.

use crate::{random::gen_f32, HitRecord, HittableId, MaterialId, Scene};
use glint_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Offset past the entry point when probing for the exit.
const EXIT_PROBE_OFFSET: f32 = 0.0001;

/// Fog of constant density filling a closed boundary.
#[derive(Debug, Clone)]
pub struct ConstantMedium {
    boundary: HittableId,
    neg_inv_density: f32,
    phase_function: MaterialId,
    bbox: Aabb,
}

impl ConstantMedium {
    /// `phase_function` should be an isotropic material.
    pub fn new(boundary: HittableId, boundary_box: Aabb, density: f32, phase_function: MaterialId) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function,
            bbox: boundary_box,
        }
    }

    pub fn hit<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'s>> {
        let boundary = scene.object(self.boundary);

        let entry = boundary.hit(scene, ray, Interval::UNIVERSE, rng)?;
        let exit = boundary.hit(
            scene,
            ray,
            Interval::new(entry.t + EXIT_PROBE_OFFSET, f32::INFINITY),
            rng,
        )?;

        let mut t_enter = entry.t.max(ray_t.min);
        let t_exit = exit.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }
        t_enter = t_enter.max(0.0);

        let ray_length = ray.direction.length();
        let distance_inside_boundary = (t_exit - t_enter) * ray_length;
        let hit_distance = self.neg_inv_density * gen_f32(rng).ln();
        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        Some(HitRecord {
            p: ray.at(t),
            // Arbitrary; isotropic scattering ignores it
            normal: Vec3::X,
            t,
            front_face: true,
            uv: Vec2::ZERO,
            material: scene.material(self.phase_function),
        })
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
