//! JSON scene loading, validation and writing.

use crate::description::{
    MaterialDesc, MediumDesc, PrimitiveDesc, SceneDescription, ShapeDesc, TextureDesc, TransformDesc,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or validating a scene
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene has no primitives")]
    Empty,

    #[error("Material {index} declares id {id}; ids must match their array position")]
    MaterialIdMismatch { index: usize, id: usize },

    #[error("{owner} references material {material}, but the scene has {count} materials")]
    MaterialOutOfRange {
        owner: String,
        material: usize,
        count: usize,
    },

    #[error("{owner} references texture {texture}, but the scene has {count} textures")]
    TextureOutOfRange {
        owner: String,
        texture: usize,
        count: usize,
    },

    #[error("{owner} needs either a tex_idx or an albedo")]
    MissingColorSource { owner: String },

    #[error("Scene node references primitive {primitive}, but the scene has {count} primitives")]
    PrimitiveOutOfRange { primitive: usize, count: usize },

    #[error("Checker texture {texture} refers back to itself")]
    CheckerCycle { texture: usize },

    #[error("{owner}: {reason}")]
    InvalidValue { owner: String, reason: String },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Read, parse and validate a scene file.
pub fn load_scene(path: impl AsRef<Path>) -> SceneResult<SceneDescription> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scene = load_scene_from_str(&text)?;
    log::info!(
        "Loaded scene {}: {} primitives, {} materials, {} textures",
        path.display(),
        scene.primitives.len(),
        scene.materials.len(),
        scene.textures.len()
    );
    Ok(scene)
}

/// Parse and validate a scene from JSON text.
pub fn load_scene_from_str(text: &str) -> SceneResult<SceneDescription> {
    let scene: SceneDescription = serde_json::from_str(text)?;
    scene.validate()?;
    Ok(scene)
}

/// Serialize a scene to pretty-printed JSON.
pub fn scene_to_string(scene: &SceneDescription) -> SceneResult<String> {
    Ok(serde_json::to_string_pretty(scene)?)
}

/// Write a scene to disk in the same format [`load_scene`] reads.
pub fn write_scene(scene: &SceneDescription, path: impl AsRef<Path>) -> SceneResult<()> {
    let path = path.as_ref();
    let text = scene_to_string(scene)?;
    fs::write(path, text).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote scene to {}", path.display());
    Ok(())
}

impl SceneDescription {
    /// Check every cross-reference and value the builder relies on.
    pub fn validate(&self) -> SceneResult<()> {
        if self.primitives.is_empty() {
            return Err(SceneError::Empty);
        }

        for (index, texture) in self.textures.iter().enumerate() {
            self.validate_texture(index, texture)?;
        }
        self.check_checker_cycles()?;

        for (index, entry) in self.materials.iter().enumerate() {
            if let Some(id) = entry.id {
                if id != index {
                    return Err(SceneError::MaterialIdMismatch { index, id });
                }
            }
            self.validate_material(index, &entry.material)?;
        }

        for (index, primitive) in self.primitives.iter().enumerate() {
            self.validate_primitive(index, primitive)?;
        }

        if let Some(nodes) = &self.scene {
            let mut stack: Vec<_> = nodes.iter().collect();
            while let Some(node) = stack.pop() {
                if let Some(primitive) = node.primitive_idx {
                    if primitive >= self.primitives.len() {
                        return Err(SceneError::PrimitiveOutOfRange {
                            primitive,
                            count: self.primitives.len(),
                        });
                    }
                }
                if let Some(transform) = &node.transform {
                    validate_transform("Scene node", transform)?;
                }
                stack.extend(node.children.iter());
            }
        }

        Ok(())
    }

    fn texture_in_range(&self, owner: impl FnOnce() -> String, texture: usize) -> SceneResult<()> {
        if texture < self.textures.len() {
            Ok(())
        } else {
            Err(SceneError::TextureOutOfRange {
                owner: owner(),
                texture,
                count: self.textures.len(),
            })
        }
    }

    fn validate_texture(&self, index: usize, texture: &TextureDesc) -> SceneResult<()> {
        let owner = || format!("Texture {index}");
        match texture {
            TextureDesc::SolidColor { .. } => Ok(()),
            TextureDesc::Checker {
                scale,
                even_tex_idx,
                odd_tex_idx,
            } => {
                if !scale.is_finite() || *scale == 0.0 {
                    return Err(invalid(owner(), "checker scale must be finite and non-zero"));
                }
                self.texture_in_range(owner, *even_tex_idx)?;
                self.texture_in_range(owner, *odd_tex_idx)
            }
            TextureDesc::Noise {
                scale, point_count, ..
            } => {
                if !scale.is_finite() {
                    return Err(invalid(owner(), "noise scale must be finite"));
                }
                if *point_count == 0 {
                    return Err(invalid(owner(), "point_count must be at least 1"));
                }
                Ok(())
            }
        }
    }

    /// Checker textures reference other textures; a chain that loops back
    /// would recurse forever at shading time.
    fn check_checker_cycles(&self) -> SceneResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(scene: &SceneDescription, index: usize, marks: &mut [Mark]) -> SceneResult<()> {
            match marks[index] {
                Mark::Done => return Ok(()),
                Mark::InProgress => return Err(SceneError::CheckerCycle { texture: index }),
                Mark::Unvisited => {}
            }
            marks[index] = Mark::InProgress;
            if let TextureDesc::Checker {
                even_tex_idx,
                odd_tex_idx,
                ..
            } = &scene.textures[index]
            {
                visit(scene, *even_tex_idx, marks)?;
                visit(scene, *odd_tex_idx, marks)?;
            }
            marks[index] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.textures.len()];
        for index in 0..self.textures.len() {
            visit(self, index, &mut marks)?;
        }
        Ok(())
    }

    fn validate_material(&self, index: usize, material: &MaterialDesc) -> SceneResult<()> {
        let owner = || format!("Material {index} ({})", material.kind());
        match material {
            MaterialDesc::Lambertian { .. } => Ok(()),
            MaterialDesc::Metal { fuzz, .. } => {
                if !fuzz.is_finite() || *fuzz < 0.0 {
                    return Err(invalid(owner(), "fuzz must be a non-negative number"));
                }
                Ok(())
            }
            MaterialDesc::Dielectric { refraction_index } => {
                if !refraction_index.is_finite() || *refraction_index <= 0.0 {
                    return Err(invalid(owner(), "refraction_index must be positive"));
                }
                Ok(())
            }
            MaterialDesc::Texture { tex_idx, albedo }
            | MaterialDesc::DiffuseLight {
                tex_idx, albedo, ..
            }
            | MaterialDesc::Isotropic { tex_idx, albedo } => match (tex_idx, albedo) {
                (Some(texture), _) => self.texture_in_range(owner, *texture),
                (None, Some(_)) => Ok(()),
                (None, None) => Err(SceneError::MissingColorSource { owner: owner() }),
            },
        }
    }

    fn validate_primitive(&self, index: usize, primitive: &PrimitiveDesc) -> SceneResult<()> {
        let owner = || format!("Primitive {index}");

        if primitive.material >= self.materials.len() {
            return Err(SceneError::MaterialOutOfRange {
                owner: owner(),
                material: primitive.material,
                count: self.materials.len(),
            });
        }

        match &primitive.shape {
            ShapeDesc::Sphere { radius, .. } => {
                if !radius.is_finite() {
                    return Err(invalid(owner(), "sphere radius must be finite"));
                }
            }
            ShapeDesc::Quad { u, v, .. } => {
                if u.cross(*v).length_squared() <= f32::EPSILON * f32::EPSILON {
                    return Err(invalid(owner(), "quad edges u and v span zero area"));
                }
            }
            ShapeDesc::Cuboid { a, b } => {
                let extent = (*a - *b).abs();
                if extent.min_element() <= 0.0 {
                    return Err(invalid(owner(), "box has zero extent along an axis"));
                }
            }
        }

        if let Some(transform) = &primitive.transform {
            validate_transform(&owner(), transform)?;
        }

        if let Some(MediumDesc { density, .. }) = &primitive.constant_medium {
            if !density.is_finite() || *density <= 0.0 {
                return Err(invalid(owner(), "constant_medium density must be positive"));
            }
        }

        Ok(())
    }
}

fn validate_transform(owner: &str, transform: &TransformDesc) -> SceneResult<()> {
    if let Some(scale) = transform.scale {
        if !scale.is_finite() || scale.abs().min_element() == 0.0 {
            return Err(invalid(owner.to_string(), "transform scale must be finite and non-zero"));
        }
    }
    if let Some(rotation) = transform.rotation {
        if rotation.iter().any(|c| !c.is_finite()) {
            return Err(invalid(owner.to_string(), "transform rotation must be finite"));
        }
    }
    if let Some(translation) = transform.translation {
        if !translation.is_finite() {
            return Err(invalid(owner.to_string(), "transform translation must be finite"));
        }
    }
    Ok(())
}

fn invalid(owner: String, reason: &str) -> SceneError {
    SceneError::InvalidValue {
        owner,
        reason: reason.to_string(),
    }
}
