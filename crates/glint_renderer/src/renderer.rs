//! Progressive path tracing renderer.
//!
//! Each [`Renderer::update`] adds one stratified sample to every pixel's
//! running sum and refreshes the display buffer from the running average.

use crate::{pixel_rng, Camera, CameraFrame, Color, Pdf, Scene};
use glint_core::{RenderSettings, SceneError, MAX_DEPTH_LIMIT};
use glint_math::{Interval, Ray};
use rand::RngCore;
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;

/// Largest accepted image side, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Nearest accepted hit distance; hides self-intersection acne.
const T_MIN: f32 = 0.001;

/// Errors reported by the renderer
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No camera bound to the renderer")]
    NoCamera,

    #[error("Invalid image dimensions {width}x{height}: each side must be in 1..={MAX_DIMENSION}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid camera: {0}")]
    InvalidCamera(String),

    #[error("Failed to build scene: {0}")]
    Scene(#[from] SceneError),
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Samples per pixel; also the length of a one-shot render in frames
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Base seed of the per-pixel random streams
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from(&RenderSettings::default())
    }
}

impl From<&RenderSettings> for RenderConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            samples_per_pixel: settings.num_samples,
            max_depth: settings.max_depth,
            seed: settings.seed,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidSettings(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(RenderError::InvalidSettings(format!(
                "max_depth must be in 1..={MAX_DEPTH_LIMIT}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

/// Lifecycle of a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// No camera bound yet
    Uninitialized,
    /// Camera bound and buffers sized, no samples accumulated
    Ready,
    /// At least one frame accumulated
    Accumulating,
}

/// Progressive accumulator.
pub struct Renderer {
    config: RenderConfig,
    camera: Option<Camera>,
    frame: Option<CameraFrame>,
    camera_dirty: bool,
    width: u32,
    height: u32,
    accumulation: Vec<Color>,
    pixels: Vec<[u8; 4]>,
    frame_index: u32,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self {
            config,
            camera: None,
            frame: None,
            camera_dirty: true,
            width: 0,
            height: 0,
            accumulation: Vec::new(),
            pixels: Vec::new(),
            frame_index: 0,
        })
    }

    /// Bind a camera and size the buffers.
    pub fn bind_camera(&mut self, camera: Camera, width: u32, height: u32) -> Result<(), RenderError> {
        camera.validate()?;
        self.on_resize(width, height)?;
        self.camera = Some(camera);
        self.camera_dirty = true;
        Ok(())
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Mutable access to the bound camera.
    ///
    /// Derived state is recomputed and the accumulation restarted on the
    /// next [`Renderer::update`].
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera_dirty = true;
        self.camera.as_mut()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Reallocate both buffers for a new output size and reset.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let valid = |side: u32| (1..=MAX_DIMENSION).contains(&side);
        if !valid(width) || !valid(height) {
            return Err(RenderError::InvalidDimensions { width, height });
        }

        let count = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.accumulation = vec![Color::ZERO; count];
        self.pixels = vec![[0, 0, 0, 255]; count];
        self.frame_index = 0;
        self.camera_dirty = true;
        log::info!("Renderer resized to {width}x{height}");
        Ok(())
    }

    /// Zero the accumulator and frame counter without reallocating.
    pub fn reset(&mut self) {
        self.accumulation.fill(Color::ZERO);
        self.pixels.fill([0, 0, 0, 255]);
        self.frame_index = 0;
    }

    /// Accumulate one sample for every pixel.
    pub fn update(&mut self, scene: &Scene) -> Result<(), RenderError> {
        let camera = self.camera.as_ref().ok_or(RenderError::NoCamera)?;

        if self.camera_dirty || self.frame.is_none() {
            camera.validate()?;
            let frame = CameraFrame::new(camera, self.width, self.height, self.config.samples_per_pixel);
            if self.frame.as_ref() != Some(&frame) && self.frame_index > 0 {
                log::debug!("Camera changed, restarting accumulation");
                self.reset();
            }
            self.frame = Some(frame);
            self.camera_dirty = false;
        }
        let Some(frame) = self.frame.as_ref() else {
            return Err(RenderError::NoCamera);
        };

        let sqrt_spp = frame.sqrt_spp();
        let s_i = self.frame_index % sqrt_spp;
        let s_j = (self.frame_index / sqrt_spp) % sqrt_spp;
        let frame_seed = self.frame_index;

        self.frame_index += 1;
        let inv_frames = 1.0 / self.frame_index as f32;

        let width = self.width as usize;
        let max_depth = self.config.max_depth;
        let seed = self.config.seed;
        let start = Instant::now();

        self.accumulation
            .par_iter_mut()
            .zip(self.pixels.par_iter_mut())
            .enumerate()
            .for_each(|(index, (sum, pixel))| {
                let x = (index % width) as u32;
                let y = (index / width) as u32;
                let mut rng = pixel_rng(seed, frame_seed, index);

                let ray = frame.get_ray(x, y, s_i, s_j, &mut rng);
                let sample = ray_color(&ray, scene, max_depth, &mut rng);
                *sum += if sample.is_finite() { sample } else { Color::ZERO };
                *pixel = color_to_rgba(*sum * inv_frames);
            });

        log::debug!(
            "Frame {} ({}x{}, stratum {s_i},{s_j}) in {:.2?}",
            self.frame_index,
            self.width,
            self.height,
            start.elapsed()
        );
        Ok(())
    }

    pub fn state(&self) -> RendererState {
        if self.camera.is_none() {
            RendererState::Uninitialized
        } else if self.frame_index == 0 {
            RendererState::Ready
        } else {
            RendererState::Accumulating
        }
    }

    /// Number of frames accumulated since the last reset.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// True once a one-shot render has taken all its samples.
    pub fn is_complete(&self) -> bool {
        self.frame_index >= self.config.samples_per_pixel
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display-ready RGBA pixels, row-major with the top row first.
    pub fn display_pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Linear running average per pixel, unclamped.
    pub fn average(&self) -> Vec<Color> {
        if self.frame_index == 0 {
            return vec![Color::ZERO; self.accumulation.len()];
        }
        let inv_frames = 1.0 / self.frame_index as f32;
        self.accumulation.iter().map(|sum| *sum * inv_frames).collect()
    }
}

/// Radiance arriving along `ray`, following at most `depth` bounces.
///
/// Diffuse and volumetric scattering is importance sampled: with lights in
/// the scene, directions come from an even mixture of the light and
/// material densities, and each bounce is weighted by
/// `scattering_pdf / pdf_value`. Specular bounces follow the material's ray.
pub fn ray_color(ray: &Ray, scene: &Scene, depth: u32, rng: &mut dyn RngCore) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = scene.hit(ray, Interval::new(T_MIN, f32::INFINITY), rng) else {
        return scene.background;
    };

    let emission = rec.material.emitted(scene.textures(), &rec);

    let Some(srec) = rec.material.scatter(scene.textures(), ray, &rec, rng) else {
        return emission;
    };

    let Some(surface_pdf) = srec.pdf else {
        return emission + srec.attenuation * ray_color(&srec.scattered, scene, depth - 1, rng);
    };

    let (scattered, pdf_value) = match scene.lights() {
        Some(lights) => {
            let light_pdf = Pdf::Hittable {
                scene,
                target: lights,
                origin: rec.p,
            };
            let mixture = Pdf::Mixture(&light_pdf, &surface_pdf);
            let scattered = Ray::new(rec.p, mixture.generate(rng), ray.time);
            let pdf_value = mixture.value(scattered.direction, rng);
            (scattered, pdf_value)
        }
        None => {
            let scattered = Ray::new(rec.p, surface_pdf.generate(rng), ray.time);
            let pdf_value = surface_pdf.value(scattered.direction, rng);
            (scattered, pdf_value)
        }
    };

    // Also rejects NaN
    if !(pdf_value > 0.0) {
        return emission;
    }

    let scattering_pdf = rec.material.scattering_pdf(ray, &rec, &scattered);
    let incoming = ray_color(&scattered, scene, depth - 1, rng);
    emission + srec.attenuation * scattering_pdf * incoming / pdf_value
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to display RGBA: clamp, gamma 2, 8 bits.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (255.0 * linear_to_gamma(c.clamp(0.0, 1.0))).round() as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Quad, Sphere, Texture, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sphere_scene(background: Color) -> Scene {
        let mut scene = Scene::new(background);
        let mat = scene.add_material(Material::Lambertian {
            albedo: Color::splat(0.5),
        });
        let sphere = scene.add(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, mat));
        let root = scene.build_bvh(vec![sphere]);
        scene.set_root(root);
        scene
    }

    fn camera() -> Camera {
        Camera::default().with_position(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y)
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(-1.0, 0.25, 7.0)), [0, 128, 255, 255]);
    }

    #[test]
    fn test_ray_color_background_and_depth() {
        let scene = sphere_scene(Color::new(0.2, 0.4, 0.6));
        let mut rng = StdRng::seed_from_u64(0);

        let miss = Ray::new(Vec3::ZERO, Vec3::Z, 0.0);
        assert_eq!(ray_color(&miss, &scene, 5, &mut rng), Color::new(0.2, 0.4, 0.6));

        let hit = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        assert_eq!(ray_color(&hit, &scene, 0, &mut rng), Color::ZERO);
        // One bounce leaves the convex sphere and sees the background
        let c = ray_color(&hit, &scene, 2, &mut rng);
        assert!((c - Color::new(0.1, 0.2, 0.3)).length() < 1e-4, "{c:?}");
    }

    #[test]
    fn test_lifecycle() {
        let scene = sphere_scene(Color::ONE);
        let mut renderer = Renderer::new(RenderConfig {
            samples_per_pixel: 4,
            max_depth: 4,
            seed: 1,
        })
        .unwrap();

        assert_eq!(renderer.state(), RendererState::Uninitialized);
        assert!(matches!(renderer.update(&scene), Err(RenderError::NoCamera)));

        renderer.bind_camera(camera(), 8, 6).unwrap();
        assert_eq!(renderer.state(), RendererState::Ready);
        assert_eq!(renderer.display_pixels().len(), 48);

        for _ in 0..4 {
            renderer.update(&scene).unwrap();
        }
        assert_eq!(renderer.state(), RendererState::Accumulating);
        assert_eq!(renderer.frame_index(), 4);
        assert!(renderer.is_complete());

        renderer.reset();
        assert_eq!(renderer.frame_index(), 0);
        assert_eq!(renderer.state(), RendererState::Ready);
        assert!(renderer.average().iter().all(|c| *c == Color::ZERO));

        renderer.update(&scene).unwrap();
        renderer.on_resize(3, 2).unwrap();
        assert_eq!(renderer.frame_index(), 0);
        assert_eq!(renderer.average().len(), 6);
    }

    #[test]
    fn test_rejects_nonsense_configuration() {
        assert!(Renderer::new(RenderConfig {
            samples_per_pixel: 0,
            ..RenderConfig::default()
        })
        .is_err());
        assert!(Renderer::new(RenderConfig {
            max_depth: MAX_DEPTH_LIMIT + 1,
            ..RenderConfig::default()
        })
        .is_err());

        let mut renderer = Renderer::new(RenderConfig::default()).unwrap();
        assert!(matches!(
            renderer.on_resize(0, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(renderer.on_resize(MAX_DIMENSION + 1, 1).is_err());
        assert!(renderer
            .bind_camera(camera().with_lens(0.0, 0.0, 1.0), 4, 4)
            .is_err());
    }

    #[test]
    fn test_update_rejects_broken_camera_edit() {
        let scene = sphere_scene(Color::ONE);
        let mut renderer = Renderer::new(RenderConfig::default()).unwrap();
        renderer.bind_camera(camera(), 4, 4).unwrap();
        renderer.update(&scene).unwrap();

        if let Some(camera) = renderer.camera_mut() {
            camera.focus_distance = 0.0;
        }
        assert!(matches!(
            renderer.update(&scene),
            Err(RenderError::InvalidCamera(_))
        ));
        assert_eq!(renderer.frame_index(), 1);

        // Restoring the lens resumes the same accumulation
        if let Some(camera) = renderer.camera_mut() {
            camera.focus_distance = 1.0;
        }
        renderer.update(&scene).unwrap();
        assert_eq!(renderer.frame_index(), 2);
    }

    /// Diffuse floor lit by a 1x1 quad light two units above the origin.
    fn lit_floor() -> (Scene, crate::HittableId) {
        let mut scene = Scene::new(Color::ZERO);
        let floor_mat = scene.add_material(Material::Lambertian {
            albedo: Color::splat(0.5),
        });
        let emit = scene.add_texture(Texture::Solid(Color::splat(4.0)));
        let light_mat = scene.add_material(Material::DiffuseLight {
            texture: emit,
            double_sided: false,
        });
        let floor = scene.add(Quad::new(
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
            floor_mat,
        ));
        // u x v points down, toward the floor
        let light = scene.add(Quad::new(
            Vec3::new(-0.5, 2.0, -0.5),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            light_mat,
        ));
        let root = scene.build_bvh(vec![floor, light]);
        scene.set_root(root);
        (scene, light)
    }

    fn mean_radiance(scene: &Scene, samples: u32, seed: u64) -> f32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0).normalize(), 0.0);
        let total: f64 = (0..samples)
            .map(|_| ray_color(&ray, scene, 3, &mut rng).x as f64)
            .sum();
        (total / samples as f64) as f32
    }

    #[test]
    fn test_light_sampling_matches_material_sampling() {
        // albedo * radiance * form factor of the light seen from the origin
        let expected = 0.5 * 4.0 * 0.073_477_63;

        let (mut scene, light) = lit_floor();
        scene.set_lights(&[light]);
        assert!(scene.lights().is_some());
        let with_lights = mean_radiance(&scene, 100_000, 1);

        scene.set_lights(&[]);
        assert!(scene.lights().is_none());
        let without_lights = mean_radiance(&scene, 200_000, 2);

        for (label, mean) in [("lights", with_lights), ("no lights", without_lights)] {
            let relative = (mean - expected).abs() / expected;
            assert!(relative < 0.05, "{label}: {mean} vs {expected}");
        }
        assert!((with_lights - without_lights).abs() / expected < 0.06);
    }

    #[test]
    fn test_camera_change_restarts_accumulation() {
        let scene = sphere_scene(Color::ONE);
        let mut renderer = Renderer::new(RenderConfig::default()).unwrap();
        renderer.bind_camera(camera(), 4, 4).unwrap();
        renderer.update(&scene).unwrap();
        renderer.update(&scene).unwrap();
        assert_eq!(renderer.frame_index(), 2);

        // Touching the camera without changing it keeps the accumulation
        let _ = renderer.camera_mut();
        renderer.update(&scene).unwrap();
        assert_eq!(renderer.frame_index(), 3);

        if let Some(camera) = renderer.camera_mut() {
            camera.vfov = 60.0;
        }
        renderer.update(&scene).unwrap();
        assert_eq!(renderer.frame_index(), 1);
    }

    #[test]
    fn test_display_matches_average() {
        let scene = sphere_scene(Color::new(0.3, 0.6, 0.9));
        let mut renderer = Renderer::new(RenderConfig {
            samples_per_pixel: 9,
            max_depth: 8,
            seed: 3,
        })
        .unwrap();
        renderer.bind_camera(camera(), 5, 5).unwrap();
        for _ in 0..3 {
            renderer.update(&scene).unwrap();
        }
        for (avg, px) in renderer.average().iter().zip(renderer.display_pixels()) {
            assert_eq!(color_to_rgba(*avg), *px);
        }
    }
}
