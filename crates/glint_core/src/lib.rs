//! Glint Core - scene description, loading and render settings.
//!
//! This crate provides:
//!
//! - **Scene description types**: camera, textures, materials, primitives and
//!   the transform/grouping node graph, all plain serde data
//! - **Loading**: JSON parsing plus validation of every handle, so a scene that
//!   loads is guaranteed to have no dangling material or texture references
//! - **Settings**: sample count, recursion depth and run mode
//!
//! Nothing here knows about rays; the renderer turns a validated
//! [`SceneDescription`] into its own acceleration structures.
//!
//! # Example
//!
//! ```ignore
//! use glint_core::load_scene;
//!
//! let scene = load_scene("data/cornell.json")?;
//! println!("{} primitives, {} materials",
//!     scene.primitives.len(),
//!     scene.materials.len());
//! ```

pub mod description;
pub mod loader;
pub mod settings;

pub use description::{
    CameraDesc, MaterialDesc, MaterialEntry, MediumDesc, NodeDesc, NoiseKind, PrimitiveDesc,
    Placement, SceneDescription, ShapeDesc, TextureDesc, TransformDesc,
    DEFAULT_POINT_COUNT,
};
pub use loader::{load_scene, load_scene_from_str, scene_to_string, write_scene, SceneError, SceneResult};
pub use settings::{load_settings, RenderSettings, SettingsError, MAX_DEPTH_LIMIT};
