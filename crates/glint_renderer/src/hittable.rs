//! Hittable variants and HitRecord for ray-object intersection.

use crate::{
    BvhNode, ConstantMedium, HittableList, Material, Quad, Scene, Sphere, Transformed,
};
use glint_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Record of a ray-object intersection.
///
/// The material is borrowed from the scene's material table.
#[derive(Clone, Copy, Debug)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against the ray)
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Surface texture coordinates
    pub uv: Vec2,
    /// Material at the intersection point
    pub material: &'a Material,
}

impl<'a> HitRecord<'a> {
    /// Record with the normal already oriented against `ray`.
    pub fn new(ray: &Ray, t: f32, outward_normal: Vec3, uv: Vec2, material: &'a Material) -> Self {
        let mut rec = Self {
            p: ray.at(t),
            normal: outward_normal,
            t,
            front_face: true,
            uv,
            material,
        };
        rec.set_face_normal(ray, outward_normal);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// `outward_normal` must be unit length.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Handle of a [`Hittable`] inside a [`HittableArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HittableId(u32);

impl HittableId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flat storage for every hittable of a scene.
#[derive(Debug, Default)]
pub struct HittableArena {
    items: Vec<Hittable>,
}

impl HittableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hittable: impl Into<Hittable>) -> HittableId {
        let id = HittableId(self.items.len() as u32);
        self.items.push(hittable.into());
        id
    }

    #[inline]
    pub fn get(&self, id: HittableId) -> &Hittable {
        &self.items[id.index()]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Everything a ray can hit.
///
/// Composite variants reference their children by [`HittableId`].
#[derive(Debug)]
pub enum Hittable {
    Sphere(Sphere),
    Quad(Quad),
    List(HittableList),
    Bvh(BvhNode),
    ConstantMedium(ConstantMedium),
    Transformed(Transformed),
}

impl Hittable {
    /// Nearest intersection with `ray` for `t` in `ray_t`.
    ///
    /// The generator is only consumed by participating media.
    pub fn hit<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'s>> {
        match self {
            Hittable::Sphere(sphere) => sphere.hit(scene, ray, ray_t),
            Hittable::Quad(quad) => quad.hit(scene, ray, ray_t),
            Hittable::List(list) => list.hit(scene, ray, ray_t, rng),
            Hittable::Bvh(node) => node.hit(scene, ray, ray_t, rng),
            Hittable::ConstantMedium(medium) => medium.hit(scene, ray, ray_t, rng),
            Hittable::Transformed(transformed) => transformed.hit(scene, ray, ray_t, rng),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Hittable::Sphere(sphere) => sphere.bounding_box(),
            Hittable::Quad(quad) => quad.bounding_box(),
            Hittable::List(list) => list.bounding_box(),
            Hittable::Bvh(node) => node.bounding_box(),
            Hittable::ConstantMedium(medium) => medium.bounding_box(),
            Hittable::Transformed(transformed) => transformed.bounding_box(),
        }
    }

    /// Solid-angle density of sampling `direction` from `origin` toward this object.
    ///
    /// Zero for variants that cannot act as importance-sampled lights.
    pub fn pdf_value(
        &self,
        scene: &Scene,
        origin: Vec3,
        direction: Vec3,
        rng: &mut dyn RngCore,
    ) -> f32 {
        match self {
            Hittable::Sphere(sphere) => sphere.pdf_value(scene, origin, direction),
            Hittable::Quad(quad) => quad.pdf_value(scene, origin, direction),
            Hittable::List(list) => list.pdf_value(scene, origin, direction, rng),
            _ => 0.0,
        }
    }

    /// Direction from `origin` toward a random point on this object.
    pub fn random(&self, scene: &Scene, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            Hittable::Sphere(sphere) => sphere.random(origin, rng),
            Hittable::Quad(quad) => quad.random(origin, rng),
            Hittable::List(list) => list.random(scene, origin, rng),
            _ => Vec3::X,
        }
    }
}

impl From<Sphere> for Hittable {
    fn from(sphere: Sphere) -> Self {
        Hittable::Sphere(sphere)
    }
}

impl From<Quad> for Hittable {
    fn from(quad: Quad) -> Self {
        Hittable::Quad(quad)
    }
}

impl From<HittableList> for Hittable {
    fn from(list: HittableList) -> Self {
        Hittable::List(list)
    }
}

impl From<BvhNode> for Hittable {
    fn from(node: BvhNode) -> Self {
        Hittable::Bvh(node)
    }
}

impl From<ConstantMedium> for Hittable {
    fn from(medium: ConstantMedium) -> Self {
        Hittable::ConstantMedium(medium)
    }
}

impl From<Transformed> for Hittable {
    fn from(transformed: Transformed) -> Self {
        Hittable::Transformed(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_face_normal() {
        let material = Material::Lambertian { albedo: Vec3::ONE };
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);

        let front = HitRecord::new(&ray, 1.0, Vec3::Z, Vec2::ZERO, &material);
        assert!(front.front_face);
        assert_eq!(front.normal, Vec3::Z);
        assert_eq!(front.p, Vec3::new(0.0, 0.0, -1.0));

        let back = HitRecord::new(&ray, 1.0, Vec3::NEG_Z, Vec2::ZERO, &material);
        assert!(!back.front_face);
        assert_eq!(back.normal, Vec3::Z);
    }

    #[test]
    fn test_arena_ids_are_sequential() {
        let mut arena = HittableArena::new();
        assert!(arena.is_empty());
        let a = arena.push(HittableList::new());
        let b = arena.push(HittableList::new());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
        assert!(arena.get(b).bounding_box().is_empty());
    }
}
