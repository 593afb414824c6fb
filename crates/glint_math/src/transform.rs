// Affine helpers on top of glam::Mat4.
//
// glam already provides transform_point3/transform_vector3 and inverse();
// this adds what the transform wrapper needs for normals and bounds.

use crate::Aabb;
use glam::{Mat3, Mat4, Quat, Vec3};

/// Extension trait for `Mat4` used by transformed primitives.
pub trait Mat4Ext {
    /// Model matrix `T * R * S`.
    fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4;

    /// Inverse-transpose of the upper-left 3x3 block, for mapping normals.
    fn normal_matrix(&self) -> Mat3;

    /// Axis-aligned box around all 8 transformed corners of `aabb`.
    ///
    /// Conservative (not tight) under rotation.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }
        let corners = aabb.corners().map(|corner| self.transform_point3(corner));
        let (lo, hi) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), &c| (lo.min(c), hi.max(c)));
        Aabb::from_points(lo, hi)
    }
}
