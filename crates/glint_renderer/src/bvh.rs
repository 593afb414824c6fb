//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over arena handles, built once per scene. Each node
//! stores the merged box of its span and two child handles.

use crate::{HitRecord, HittableArena, HittableId, HittableList, Scene};
use glint_math::{Aabb, Interval, Ray};
use rand::RngCore;
use std::cmp::Ordering;

/// Internal BVH node. For a single-element span both children are the same handle.
#[derive(Debug, Clone)]
pub struct BvhNode {
    left: HittableId,
    right: HittableId,
    bbox: Aabb,
}

impl BvhNode {
    /// Build a BVH over `objects` and return the root handle.
    ///
    /// The slice is reordered in place. An empty slice yields an empty list,
    /// which never reports a hit.
    pub fn build(arena: &mut HittableArena, objects: &mut [HittableId]) -> HittableId {
        if objects.is_empty() {
            return arena.push(HittableList::new());
        }
        let root = Self::build_span(arena, objects);
        log::debug!(
            "Built BVH over {} objects, arena now holds {}",
            objects.len(),
            arena.len()
        );
        root
    }

    /// Recursive construction: sort the span by box minimum along the
    /// longest axis of its bounds and split at the median.
    fn build_span(arena: &mut HittableArena, objects: &mut [HittableId]) -> HittableId {
        let bbox = objects.iter().fold(Aabb::EMPTY, |acc, &id| {
            Aabb::surrounding(&acc, &arena.get(id).bounding_box())
        });

        let (left, right) = match objects.len() {
            1 => (objects[0], objects[0]),
            2 => (objects[0], objects[1]),
            n => {
                let axis = bbox.longest_axis();
                objects.sort_unstable_by(|&a, &b| box_compare(arena, a, b, axis));

                let (lo, hi) = objects.split_at_mut(n / 2);
                let left = Self::build_span(arena, lo);
                let right = Self::build_span(arena, hi);
                (left, right)
            }
        };

        arena.push(BvhNode { left, right, bbox })
    }

    pub fn left(&self) -> HittableId {
        self.left
    }

    pub fn right(&self) -> HittableId {
        self.right
    }

    pub fn hit<'s>(
        &self,
        scene: &'s Scene,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord<'s>> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }

        let hit_left = scene.object(self.left).hit(scene, ray, ray_t, rng);
        if self.left == self.right {
            return hit_left;
        }

        // Only check right up to closest hit
        let right_max = hit_left.as_ref().map_or(ray_t.max, |rec| rec.t);
        let hit_right = scene
            .object(self.right)
            .hit(scene, ray, ray_t.with_max(right_max), rng);

        hit_right.or(hit_left)
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

fn box_compare(arena: &HittableArena, a: HittableId, b: HittableId, axis: usize) -> Ordering {
    let a_min = arena.get(a).bounding_box().axis_interval(axis).min;
    let b_min = arena.get(b).bounding_box().axis_interval(axis).min;
    a_min.partial_cmp(&b_min).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hittable, Material, Sphere};
    use glint_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn interval() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_bvh_empty() {
        let mut scene = Scene::new(Vec3::ZERO);
        let root = scene.build_bvh(Vec::new());
        scene.set_root(root);
        assert!(matches!(scene.object(root), Hittable::List(list) if list.is_empty()));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        assert!(scene.hit(&ray, interval(), &mut rng).is_none());
    }

    #[test]
    fn test_bvh_single_sphere() {
        let mut scene = Scene::new(Vec3::ZERO);
        let mat = scene.add_material(Material::Lambertian {
            albedo: Vec3::splat(0.5),
        });
        let sphere = scene.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, mat));
        let root = scene.build_bvh(vec![sphere]);
        scene.set_root(root);

        match scene.object(root) {
            Hittable::Bvh(node) => {
                assert_eq!(node.left(), sphere);
                assert_eq!(node.right(), sphere);
            }
            other => panic!("expected a BVH node, got {other:?}"),
        }

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        assert!(scene.hit(&ray, interval(), &mut rng).is_some());
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let mut scene = Scene::new(Vec3::ZERO);
        let mat = scene.add_material(Material::Lambertian {
            albedo: Vec3::splat(0.5),
        });
        let spheres: Vec<_> = (0..10)
            .map(|i| scene.add(Sphere::new(Vec3::new(i as f32, 0.0, -5.0), 0.5, mat)))
            .collect();
        let root = scene.build_bvh(spheres);
        scene.set_root(root);

        // Test ray that hits sphere at x=5
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        let rec = scene.hit(&ray, interval(), &mut rng).unwrap();

        // Hit point should be near z = -4.5 (sphere at z=-5, radius 0.5)
        assert!((rec.p.z - (-4.5)).abs() < 0.01);
    }

    #[test]
    fn test_nearer_of_overlapping_children_wins() {
        let mut scene = Scene::new(Vec3::ZERO);
        let near_mat = scene.add_material(Material::Lambertian { albedo: Vec3::X });
        let far_mat = scene.add_material(Material::Lambertian { albedo: Vec3::Y });
        // Listed far-first so the far sphere ends up on the left after sorting by z min
        let far = scene.add(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0, far_mat));
        let near = scene.add(Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, near_mat));
        let root = scene.build_bvh(vec![near, far]);
        scene.set_root(root);

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        let rec = scene.hit(&ray, interval(), &mut rng).unwrap();
        assert!((rec.t - 3.0).abs() < 1e-4);
        assert!(matches!(rec.material, Material::Lambertian { albedo } if *albedo == Vec3::X));
    }
}
