//! Planar parallelogram primitive.

use crate::{random::gen_f32, HitRecord, MaterialId, Scene};
use glint_math::{Aabb, Interval, Ray, Vec2, Vec3};
use rand::RngCore;

/// Rays closer to parallel than this are treated as missing the plane.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Parallelogram with corner `q` and edges `u`, `v`.
#[derive(Debug, Clone)]
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// `n / (n . n)` with `n = u x v`; turns triple products into planar coordinates
    w: Vec3,
    normal: Vec3,
    d: f32,
    area: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Quad {
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: MaterialId) -> Self {
        let n = u.cross(v);
        let normal = n.normalize_or_zero();
        let d = normal.dot(q);
        let w = n / n.dot(n);

        let bbox_diagonal1 = Aabb::from_points(q, q + u + v);
        let bbox_diagonal2 = Aabb::from_points(q + u, q + v);

        Self {
            q,
            u,
            v,
            w,
            normal,
            d,
            area: n.length(),
            material,
            bbox: Aabb::surrounding(&bbox_diagonal1, &bbox_diagonal2),
        }
    }

    /// Coordinates `(alpha, beta)` of a point in the quad's plane, such that
    /// `p = q + alpha * u + beta * v`.
    pub fn planar_coordinates(&self, p: Vec3) -> Vec2 {
        let planar_hit = p - self.q;
        let alpha = self.w.dot(planar_hit.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar_hit));
        Vec2::new(alpha, beta)
    }

    /// Boundary-inclusive interior test on planar coordinates.
    pub fn is_interior(coords: Vec2) -> bool {
        Interval::UNIT.contains(coords.x) && Interval::UNIT.contains(coords.y)
    }

    pub fn hit<'s>(&self, scene: &'s Scene, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'s>> {
        let denom = self.normal.dot(ray.direction);

        // No hit if the ray is parallel to the plane
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if !ray_t.contains(t) {
            return None;
        }

        let coords = self.planar_coordinates(ray.at(t));
        if !Self::is_interior(coords) {
            return None;
        }

        Some(HitRecord::new(
            ray,
            t,
            self.normal,
            coords,
            scene.material(self.material),
        ))
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Solid-angle density of uniformly sampling the quad's area from `origin`.
    pub fn pdf_value(&self, scene: &Scene, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        let Some(rec) = self.hit(scene, &ray, Interval::new(0.001, f32::INFINITY)) else {
            return 0.0;
        };

        let length = direction.length();
        let distance_squared = rec.t * rec.t * length * length;
        let cosine = (direction.dot(rec.normal) / length).abs();
        if cosine <= 0.0 {
            return 0.0;
        }
        distance_squared / (cosine * self.area)
    }

    pub fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let p = self.q + gen_f32(rng) * self.u + gen_f32(rng) * self.v;
        p - origin
    }
}
