//! Camera for ray generation.
//!
//! [`Camera`] holds the authoritative pose and lens parameters. Everything
//! derived from them (basis, pixel grid, defocus disk, stratification) lives
//! in a [`CameraFrame`], recomputed by the renderer whenever the camera,
//! output size or sample count changes.

use crate::{gen_f32, random_in_unit_disk, RenderError};
use glint_core::CameraDesc;
use glint_math::{Ray, Vec3};
use rand::RngCore;

/// Camera pose and lens.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub center: Vec3,
    pub look_at: Vec3,
    pub view_up: Vec3,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from(&CameraDesc::default())
    }
}

impl From<&CameraDesc> for Camera {
    fn from(desc: &CameraDesc) -> Self {
        Self {
            center: desc.center,
            look_at: desc.look_at,
            view_up: desc.view_up,
            vfov: desc.fov,
            defocus_angle: desc.defocus_angle,
            focus_distance: desc.focus_distance,
        }
    }
}

impl Camera {
    /// Set camera position.
    pub fn with_position(mut self, center: Vec3, look_at: Vec3, view_up: Vec3) -> Self {
        self.center = center;
        self.look_at = look_at;
        self.view_up = view_up;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_distance: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_distance = focus_distance;
        self
    }

    /// Reject parameters that would produce NaN rays.
    pub fn validate(&self) -> Result<(), RenderError> {
        let finite = self.center.is_finite()
            && self.look_at.is_finite()
            && self.view_up.is_finite()
            && self.vfov.is_finite()
            && self.defocus_angle.is_finite()
            && self.focus_distance.is_finite();
        if !finite {
            return Err(RenderError::InvalidCamera("non-finite parameter".into()));
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(RenderError::InvalidCamera(format!(
                "vertical field of view {} must be in (0, 180)",
                self.vfov
            )));
        }
        if self.focus_distance <= 0.0 {
            return Err(RenderError::InvalidCamera(format!(
                "focus distance {} must be positive",
                self.focus_distance
            )));
        }
        let forward = self.center - self.look_at;
        if forward.length_squared() == 0.0 {
            return Err(RenderError::InvalidCamera("center and look_at coincide".into()));
        }
        if self.view_up.cross(forward).length_squared() == 0.0 {
            return Err(RenderError::InvalidCamera(
                "view_up is parallel to the viewing direction".into(),
            ));
        }
        Ok(())
    }
}

/// State derived from a [`Camera`] for one output size and sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_angle: f32,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
    sqrt_spp: u32,
    recip_sqrt_spp: f32,
}

impl CameraFrame {
    pub fn new(camera: &Camera, width: u32, height: u32, samples_per_pixel: u32) -> Self {
        let sqrt_spp = ((samples_per_pixel as f64).sqrt() as u32).max(1);

        // Calculate viewport dimensions
        let theta = camera.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * camera.focus_distance;
        let viewport_width = viewport_height * (width as f32 / height as f32);

        // Calculate camera basis vectors
        let w = (camera.center - camera.look_at).normalize();
        let u = camera.view_up.cross(w).normalize();
        let v = w.cross(u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u;
        let viewport_v = viewport_height * -v;

        let pixel_delta_u = viewport_u / width as f32;
        let pixel_delta_v = viewport_v / height as f32;

        let viewport_upper_left =
            camera.center - camera.focus_distance * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = camera.focus_distance * (camera.defocus_angle / 2.0).to_radians().tan();

        Self {
            width,
            height,
            center: camera.center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_angle: camera.defocus_angle,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            sqrt_spp,
            recip_sqrt_spp: 1.0 / sqrt_spp as f32,
        }
    }

    /// Side of the stratification grid.
    pub fn sqrt_spp(&self) -> u32 {
        self.sqrt_spp
    }

    /// Camera basis `(u, v, w)`; `w` points backwards from the view direction.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Ray through pixel `(x, y)` (row 0 at the top), jittered within
    /// sub-cell `(s_i, s_j)` of the pixel's stratification grid.
    pub fn get_ray(&self, x: u32, y: u32, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = self.sample_square_stratified(s_i, s_j, rng);
        let pixel_sample = self.pixel00_loc
            + (x as f32 + offset.x) * self.pixel_delta_u
            + (y as f32 + offset.y) * self.pixel_delta_v;

        let origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };
        let time = gen_f32(rng);

        Ray::new(origin, (pixel_sample - origin).normalize(), time)
    }

    /// Offset in `[-0.5, 0.5)^2` inside sub-cell `(s_i, s_j)`.
    fn sample_square_stratified(&self, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Vec3 {
        let px = ((s_i as f32 + gen_f32(rng)) * self.recip_sqrt_spp) - 0.5;
        let py = ((s_j as f32 + gen_f32(rng)) * self.recip_sqrt_spp) - 0.5;
        Vec3::new(px, py, 0.0)
    }

    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + (p.x * self.defocus_disk_u) + (p.y * self.defocus_disk_v)
    }
}
