//! Glint math - ranges, bounding boxes, rays and basis helpers.
//!
//! Re-exports `glam` so downstream crates share one vector library.

pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;
