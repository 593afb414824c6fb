//! Affine transform wrapper around another hittable.

use crate::{HitRecord, HittableId, Scene};
use glint_math::{Aabb, Interval, Mat3, Mat4, Mat4Ext, Ray};
use rand::RngCore;

/// A hittable placed by a model matrix.
///
/// Rays are mapped into the wrapped object's local space with a unit-length
/// direction; the interval and the resulting `t` are rescaled so `t` stays in
/// world units of the incoming ray.
#[derive(Debug, Clone)]
pub struct Transformed {
    object: HittableId,
    model: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
    bbox: Aabb,
}

impl Transformed {
    pub fn new(object: HittableId, object_box: &Aabb, model: Mat4) -> Self {
        Self {
            object,
            model,
            inverse: model.inverse(),
            normal_matrix: model.normal_matrix(),
            bbox: model.transform_aabb(object_box),
        }
    }

    pub fn hit<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'s>> {
        let local_origin = self.inverse.transform_point3(ray.origin);
        let local_direction = self.inverse.transform_vector3(ray.direction);
        let scale = local_direction.length();
        if scale == 0.0 || !scale.is_finite() {
            return None;
        }

        let local_ray = Ray::new(local_origin, local_direction / scale, ray.time);
        let local_t = Interval::new(ray_t.min * scale, ray_t.max * scale);

        let mut rec = scene.object(self.object).hit(scene, &local_ray, local_t, rng)?;

        rec.t /= scale;
        rec.p = self.model.transform_point3(rec.p);
        // The normal matrix preserves the sign of normal . direction, so the
        // local front/back orientation carries over unchanged.
        rec.normal = (self.normal_matrix * rec.normal).normalize();
        Some(rec)
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
