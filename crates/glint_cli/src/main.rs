mod output;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::{load_scene, load_settings, RenderSettings, SceneDescription};
use glint_renderer::{RenderConfig, Renderer, Scene};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_OUTPUT: &str = "render.png";
const DEFAULT_WIDTH: u32 = 400;
const DEFAULT_HEIGHT: u32 = 225;

/// Progressive CPU path tracer
#[derive(Parser, Debug)]
#[command(name = "glint", version, about)]
struct Args {
    /// Scene description (JSON); renders the built-in scene when omitted
    scene: Option<PathBuf>,

    /// Output image (.png, .ppm, .jpg, .exr, .hdr)
    output: Option<PathBuf>,

    /// Render settings file (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Samples per pixel
    #[arg(long)]
    samples: Option<u32>,

    /// Maximum bounce depth
    #[arg(long)]
    depth: Option<u32>,

    /// Seed for the per-pixel generators
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, requires = "height")]
    width: Option<u32>,

    #[arg(long, requires = "width")]
    height: Option<u32>,
}

impl Args {
    /// Settings file first, then flags on top.
    fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(path)
                .with_context(|| format!("Failed to load settings {}", path.display()))?,
            None => RenderSettings::default(),
        };
        if let Some(samples) = self.samples {
            settings.num_samples = samples;
        }
        if let Some(depth) = self.depth {
            settings.max_depth = depth;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(output) = &self.output {
            settings.output = Some(output.clone());
        }
        settings.validate().context("Invalid render settings")?;
        Ok(settings)
    }

    fn description(&self) -> Result<SceneDescription> {
        match &self.scene {
            Some(path) => {
                load_scene(path).with_context(|| format!("Failed to load scene {}", path.display()))
            }
            None => {
                log::info!("No scene given, using the default scene");
                Ok(SceneDescription::default_scene())
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let settings = args.settings()?;
    let desc = args.description()?;
    let scene = Scene::from_description(&desc, settings.seed).context("Failed to build scene")?;

    let (width, height) = match (args.width, args.height) {
        (Some(w), Some(h)) => (w, h),
        _ => scene.dimensions.unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT)),
    };

    let mut renderer = Renderer::new(RenderConfig::from(&settings))?;
    renderer
        .bind_camera(scene.camera.clone(), width, height)
        .context("Failed to bind camera")?;

    if !settings.render_once {
        log::warn!("Continuous rendering needs a display; rendering once");
    }

    log::info!(
        "Rendering {}x{} at {} spp, depth {}",
        width,
        height,
        settings.num_samples,
        settings.max_depth
    );

    let progress = ProgressBar::new(settings.num_samples as u64);
    progress.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} samples ({eta})")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let start = Instant::now();
    while !renderer.is_complete() {
        renderer.update(&scene)?;
        progress.inc(1);
    }
    progress.finish_and_clear();
    log::info!(
        "Finished {} samples in {:.2?}",
        renderer.frame_index(),
        start.elapsed()
    );

    // An explicit output path always wins over the settings flag
    if settings.save_after_render_once || args.output.is_some() {
        let path = settings
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        output::save(&renderer, &path)?;
    } else {
        log::info!("save_after_render_once is off, not writing an image");
    }

    Ok(())
}
