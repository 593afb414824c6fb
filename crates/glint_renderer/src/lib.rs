//! Glint Renderer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer that refines its estimate one sample per pixel
//! per [`Renderer::update`] call.
//!
//! Geometry lives in an arena owned by [`Scene`]: every [`Hittable`] refers
//! to its children (BVH nodes, lists, transform and medium wrappers) by
//! [`HittableId`], and primitives refer to materials by index, so the scene is
//! one flat, read-only structure during a frame.

mod bvh;
mod camera;
mod constant_medium;
mod hittable;
mod hittable_list;
mod material;
mod pdf;
mod perlin;
mod quad;
mod random;
mod renderer;
mod scene;
mod sphere;
mod texture;
mod transformed;

pub use bvh::BvhNode;
pub use camera::{Camera, CameraFrame};
pub use constant_medium::ConstantMedium;
pub use hittable::{HitRecord, Hittable, HittableArena, HittableId};
pub use hittable_list::HittableList;
pub use material::{Color, Material, MaterialId, ScatterRecord};
pub use pdf::Pdf;
pub use perlin::Perlin;
pub use quad::Quad;
pub use random::{gen_f32, pixel_rng, random_cosine_direction, random_in_unit_disk, random_unit_vector};
pub use renderer::{
    color_to_rgba, ray_color, RenderConfig, RenderError, Renderer, RendererState, MAX_DIMENSION,
};
pub use scene::Scene;
pub use sphere::Sphere;
pub use texture::{Texture, TextureId};
pub use transformed::Transformed;

/// Re-export the math types used throughout the public API
pub use glint_math::{Aabb, Interval, Ray, Vec2, Vec3};
