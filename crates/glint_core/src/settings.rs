//! Render settings: sample budget, bounce depth, seed and output behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `max_depth`; the integrator recurses once per bounce.
pub const MAX_DEPTH_LIMIT: u32 = 1024;

/// Errors that can occur while loading render settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("num_samples must be at least 1")]
    NoSamples,

    #[error("max_depth must be between 1 and {MAX_DEPTH_LIMIT}, got {0}")]
    InvalidDepth(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Samples per pixel; one sample per pixel is taken per frame
    pub num_samples: u32,
    /// Maximum path length in bounces
    pub max_depth: u32,
    /// Stop accumulating once `num_samples` frames are done
    pub render_once: bool,
    /// Write the image when a render-once run completes
    pub save_after_render_once: bool,
    /// Base seed for per-pixel random streams
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            num_samples: 64,
            max_depth: 50,
            render_once: true,
            save_after_render_once: true,
            seed: 0,
            output: None,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.num_samples == 0 {
            return Err(SettingsError::NoSamples);
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(SettingsError::InvalidDepth(self.max_depth));
        }
        Ok(())
    }
}

/// Read and validate a settings file. Missing fields take their defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<RenderSettings, SettingsError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: RenderSettings = serde_json::from_str(&text)?;
    settings.validate()?;
    log::debug!("Loaded settings from {}: {:?}", path.display(), settings);
    Ok(settings)
}
