//! Ordered collection of hittables.

use crate::{random::gen_f32, HitRecord, HittableId, Scene};
use glint_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

/// A list of hittable handles with a bounding box kept up to date on insert.
#[derive(Debug, Clone, Default)]
pub struct HittableList {
    objects: Vec<HittableId>,
    bbox: Aabb,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    /// Add an object whose bounding box is `bbox`.
    pub fn add(&mut self, object: HittableId, bbox: Aabb) {
        self.bbox = Aabb::surrounding(&self.bbox, &bbox);
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn hit<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'s>> {
        let mut closest: Option<HitRecord<'s>> = None;

        for &id in &self.objects {
            let far = closest.as_ref().map_or(ray_t.max, |rec| rec.t);
            if let Some(rec) = scene.object(id).hit(scene, ray, ray_t.with_max(far), rng) {
                closest = Some(rec);
            }
        }

        closest
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Mean of the children's densities.
    pub fn pdf_value(
        &self,
        scene: &Scene,
        origin: Vec3,
        direction: Vec3,
        rng: &mut dyn RngCore,
    ) -> f32 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f32;
        self.objects
            .iter()
            .map(|&id| weight * scene.object(id).pdf_value(scene, origin, direction, rng))
            .sum()
    }

    /// Delegates to a uniformly chosen child.
    pub fn random(&self, scene: &Scene, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let n = self.objects.len();
        let pick = ((gen_f32(rng) * n as f32) as usize).min(n - 1);
        scene.object(self.objects[pick]).random(scene, origin, rng)
    }
}
