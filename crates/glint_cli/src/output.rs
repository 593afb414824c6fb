//! Image encoding for finished renders.

use anyhow::{Context, Result};
use glint_renderer::Renderer;
use image::{ImageFormat, Rgb, Rgb32FImage, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// What gets written for a given file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Gamma-corrected 8-bit display buffer
    Display(ImageFormat),
    /// Linear f32 running average
    OpenExr,
    Radiance,
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Display(ImageFormat::Png)),
            "ppm" => Ok(Self::Display(ImageFormat::Pnm)),
            "jpg" | "jpeg" => Ok(Self::Display(ImageFormat::Jpeg)),
            "exr" => Ok(Self::OpenExr),
            "hdr" => Ok(Self::Radiance),
            _ => anyhow::bail!(
                "unsupported output extension {:?} (expected png, ppm, jpg, exr or hdr)",
                path.display()
            ),
        }
    }
}

/// Display buffer without alpha.
pub fn display_image(renderer: &Renderer) -> Result<RgbImage> {
    let data: Vec<u8> = renderer
        .display_pixels()
        .iter()
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();
    RgbImage::from_raw(renderer.width(), renderer.height(), data)
        .context("display buffer does not match image dimensions")
}

pub fn linear_image(renderer: &Renderer) -> Result<Rgb32FImage> {
    let data: Vec<f32> = renderer
        .average()
        .iter()
        .flat_map(|c| [c.x, c.y, c.z])
        .collect();
    Rgb32FImage::from_raw(renderer.width(), renderer.height(), data)
        .context("accumulation buffer does not match image dimensions")
}

pub fn save(renderer: &Renderer, path: &Path) -> Result<()> {
    match OutputKind::from_path(path)? {
        OutputKind::Display(format) => display_image(renderer)?
            .save_with_format(path, format)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        OutputKind::OpenExr => image::DynamicImage::ImageRgb32F(linear_image(renderer)?)
            .save_with_format(path, ImageFormat::OpenExr)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        OutputKind::Radiance => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let pixels: Vec<Rgb<f32>> = linear_image(renderer)?.pixels().copied().collect();
            image::codecs::hdr::HdrEncoder::new(BufWriter::new(file))
                .encode(&pixels, renderer.width() as usize, renderer.height() as usize)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_renderer::{Camera, RenderConfig, Scene, Vec3};

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            OutputKind::from_path(Path::new("out.PNG")).unwrap(),
            OutputKind::Display(ImageFormat::Png)
        );
        assert_eq!(
            OutputKind::from_path(Path::new("a/b.ppm")).unwrap(),
            OutputKind::Display(ImageFormat::Pnm)
        );
        assert_eq!(
            OutputKind::from_path(Path::new("x.exr")).unwrap(),
            OutputKind::OpenExr
        );
        assert_eq!(
            OutputKind::from_path(Path::new("x.hdr")).unwrap(),
            OutputKind::Radiance
        );
        assert!(OutputKind::from_path(Path::new("x.gif")).is_err());
        assert!(OutputKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_images_match_renderer() {
        let scene = Scene::new(Vec3::new(0.25, 0.5, 1.0));
        let mut renderer = Renderer::new(RenderConfig {
            samples_per_pixel: 1,
            max_depth: 4,
            seed: 0,
        })
        .unwrap();
        renderer.bind_camera(Camera::default(), 3, 2).unwrap();
        renderer.update(&scene).unwrap();

        let display = display_image(&renderer).unwrap();
        assert_eq!(display.dimensions(), (3, 2));
        // sqrt gamma: 0.25 -> 0.5, 0.5 -> ~0.707
        assert_eq!(display.get_pixel(2, 1).0, [128, 180, 255]);

        let linear = linear_image(&renderer).unwrap();
        assert_eq!(linear.get_pixel(0, 0).0, [0.25, 0.5, 1.0]);
    }
}
