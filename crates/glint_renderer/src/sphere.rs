//! Sphere primitive for ray tracing.

use crate::{random::gen_f32, random_unit_vector, HitRecord, MaterialId, Scene};
use glint_math::{Aabb, Interval, Onb, Ray, Vec2, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// A sphere, optionally moving linearly over the shutter interval.
#[derive(Debug, Clone)]
pub struct Sphere {
    /// Center at time 0 (origin) and displacement over the shutter (direction)
    center: Ray,
    radius: f32,
    material: MaterialId,
    bbox: Aabb,
}

impl Sphere {
    /// Create a stationary sphere.
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self::moving(center, Vec3::ZERO, radius, material)
    }

    /// Create a sphere at `start` for time 0 and `start + displacement` for time 1.
    pub fn moving(start: Vec3, displacement: Vec3, radius: f32, material: MaterialId) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let end = start + displacement;
        let box0 = Aabb::from_points(start - rvec, start + rvec);
        let box1 = Aabb::from_points(end - rvec, end + rvec);

        Self {
            center: Ray::new(start, displacement, 0.0),
            radius,
            material,
            bbox: Aabb::surrounding(&box0, &box1),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_moving(&self) -> bool {
        self.center.direction != Vec3::ZERO
    }

    /// UV coordinates for a point on the unit sphere centered at the origin.
    ///
    /// `u` is the angle around Y from X = -1, `v` the angle from Y = -1 up to Y = +1.
    pub fn sphere_uv(p: Vec3) -> Vec2 {
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }

    pub fn hit<'s>(&self, scene: &'s Scene, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'s>> {
        if self.radius <= 0.0 {
            return None;
        }

        let current_center = self.center.at(ray.time);
        let oc = current_center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        let outward_normal = (p - current_center) / self.radius;
        Some(HitRecord::new(
            ray,
            root,
            outward_normal,
            Self::sphere_uv(outward_normal),
            scene.material(self.material),
        ))
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    /// Density of sampling `direction` uniformly over the cone the sphere subtends.
    ///
    /// Uses the position at time 0. Scene assembly never collects moving
    /// spheres as lights.
    pub fn pdf_value(&self, scene: &Scene, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        if self
            .hit(scene, &ray, Interval::new(0.001, f32::INFINITY))
            .is_none()
        {
            return 0.0;
        }

        let distance_squared = (self.center.origin - origin).length_squared();
        let ratio = self.radius * self.radius / distance_squared;
        if ratio >= 1.0 {
            // Inside the sphere every direction is equally likely
            return 1.0 / (4.0 * PI);
        }
        let cos_theta_max = (1.0 - ratio).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        1.0 / solid_angle
    }

    pub fn random(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center.origin - origin;
        let distance_squared = direction.length_squared();
        let ratio = self.radius * self.radius / distance_squared;
        if ratio >= 1.0 || !ratio.is_finite() {
            return random_unit_vector(rng);
        }
        let onb = Onb::new(direction);
        onb.transform(random_to_sphere(ratio, rng))
    }
}

/// Direction inside the cone toward a sphere, in the sphere-aligned basis.
fn random_to_sphere(radius_sq_over_dist_sq: f32, rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f32(rng);
    let r2 = gen_f32(rng);
    let z = 1.0 + r2 * ((1.0 - radius_sq_over_dist_sq).sqrt() - 1.0);

    let phi = 2.0 * PI * r1;
    let sin_theta = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, z)
}
