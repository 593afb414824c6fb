//! Scene description types.
//!
//! These mirror the JSON scene format one-to-one. Materials, textures and
//! primitives are referenced by their position in the respective arrays.

use glam::{Mat4, Quat, Vec3};
use glint_math::Mat4Ext;
use serde::{Deserialize, Serialize};

fn white() -> Vec3 {
    Vec3::ONE
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

fn default_radius() -> f32 {
    0.5
}

/// Gradient count of a noise texture when the scene leaves it out.
pub const DEFAULT_POINT_COUNT: u32 = 256;

fn default_point_count() -> u32 {
    DEFAULT_POINT_COUNT
}

fn unit_x() -> Vec3 {
    Vec3::X
}

fn unit_z() -> Vec3 {
    Vec3::Z
}

/// Camera placement and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub center: Vec3,
    pub look_at: Vec3,
    pub view_up: Vec3,
    /// Cone angle (degrees) of rays through each pixel; 0 disables depth of field
    pub defocus_angle: f32,
    /// Distance to the plane of perfect focus
    pub focus_distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            fov: 90.0,
            center: Vec3::new(0.0, 0.0, 1.0),
            look_at: Vec3::ZERO,
            view_up: Vec3::Y,
            defocus_angle: 0.0,
            focus_distance: 1.0,
            width: None,
            aspect_ratio: None,
        }
    }
}

impl CameraDesc {
    /// Explicit output size, when the scene pins one.
    ///
    /// Requires both `width` and `aspect_ratio` to be set and non-zero.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.aspect_ratio) {
            (Some(width), Some(aspect)) if width > 0 && aspect > 0.0 => {
                let height = (width as f32 / aspect).round().max(1.0) as u32;
                Some((width, height))
            }
            _ => None,
        }
    }
}

/// Procedural noise flavor. Serialized as an integer (0 = Perlin, 1 = Marble).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NoiseKind {
    Perlin,
    #[default]
    Marble,
}

impl TryFrom<u8> for NoiseKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NoiseKind::Perlin),
            1 => Ok(NoiseKind::Marble),
            other => Err(format!("unknown noise_type {other}, expected 0 or 1")),
        }
    }
}

impl From<NoiseKind> for u8 {
    fn from(kind: NoiseKind) -> Self {
        match kind {
            NoiseKind::Perlin => 0,
            NoiseKind::Marble => 1,
        }
    }
}

/// Entry of the texture table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextureDesc {
    SolidColor {
        #[serde(default = "white")]
        albedo: Vec3,
    },
    /// 3D checkerboard alternating between two other textures of the table
    Checker {
        #[serde(default = "one")]
        scale: f32,
        #[serde(default)]
        even_tex_idx: usize,
        #[serde(default)]
        odd_tex_idx: usize,
    },
    Noise {
        #[serde(default = "one")]
        scale: f32,
        #[serde(default)]
        noise_type: NoiseKind,
        #[serde(default = "white")]
        albedo: Vec3,
        #[serde(default = "default_point_count")]
        point_count: u32,
    },
}

/// Entry of the material table.
///
/// Texture-driven variants take either an explicit `tex_idx` or an `albedo`;
/// an `albedo` becomes an implicit solid-color texture when the scene is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Lambertian {
        #[serde(default = "white")]
        albedo: Vec3,
    },
    Metal {
        #[serde(default = "white")]
        albedo: Vec3,
        #[serde(default)]
        fuzz: f32,
    },
    Dielectric {
        #[serde(default = "one", alias = "refraction_idx")]
        refraction_index: f32,
    },
    Texture {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tex_idx: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        albedo: Option<Vec3>,
    },
    DiffuseLight {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tex_idx: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        albedo: Option<Vec3>,
        /// Emit from the back face too
        #[serde(default = "yes")]
        double_sided: bool,
    },
    Isotropic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tex_idx: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        albedo: Option<Vec3>,
    },
}

impl MaterialDesc {
    /// Short type tag, used in log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MaterialDesc::Lambertian { .. } => "lambertian",
            MaterialDesc::Metal { .. } => "metal",
            MaterialDesc::Dielectric { .. } => "dielectric",
            MaterialDesc::Texture { .. } => "texture",
            MaterialDesc::DiffuseLight { .. } => "diffuse_light",
            MaterialDesc::Isotropic { .. } => "isotropic",
        }
    }
}

/// A material plus the optional explicit `id` older scene files carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    #[serde(flatten)]
    pub material: MaterialDesc,
}

impl From<MaterialDesc> for MaterialEntry {
    fn from(material: MaterialDesc) -> Self {
        Self { id: None, material }
    }
}

/// Rigid/similarity transform: scale, then rotate, then translate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformDesc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<Vec3>,
    /// `[angle_degrees, axis_x, axis_y, axis_z]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
}

impl TransformDesc {
    /// True when no component is given.
    pub fn is_identity(&self) -> bool {
        self.translation.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    pub fn rotation_quat(&self) -> Quat {
        match self.rotation {
            Some([angle, x, y, z]) => {
                let axis = Vec3::new(x, y, z);
                if axis.length_squared() > 0.0 {
                    Quat::from_axis_angle(axis.normalize(), angle.to_radians())
                } else {
                    Quat::IDENTITY
                }
            }
            None => Quat::IDENTITY,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_trs(
            self.translation.unwrap_or(Vec3::ZERO),
            self.rotation_quat(),
            self.scale.unwrap_or(Vec3::ONE),
        )
    }
}

/// Participating-medium wrapper around a primitive's boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumDesc {
    pub density: f32,
    #[serde(default = "white")]
    pub albedo: Vec3,
}

/// Geometric shape of a primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    /// Sphere at `center` at time 0, moving to `center + displacement` at time 1
    Sphere {
        #[serde(default)]
        center: Vec3,
        #[serde(default = "default_radius")]
        radius: f32,
        #[serde(default)]
        displacement: Vec3,
    },
    /// Parallelogram with corner `q` and edges `u`, `v`
    Quad {
        #[serde(default)]
        q: Vec3,
        #[serde(default = "unit_x")]
        u: Vec3,
        #[serde(default = "unit_z")]
        v: Vec3,
    },
    /// Axis-aligned box between opposite corners `a` and `b`
    #[serde(rename = "box")]
    Cuboid {
        #[serde(default)]
        a: Vec3,
        #[serde(default = "white")]
        b: Vec3,
    },
}

/// Entry of the primitive table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDesc {
    #[serde(flatten)]
    pub shape: ShapeDesc,
    #[serde(default, alias = "material_id")]
    pub material: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDesc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_medium: Option<MediumDesc>,
}

impl PrimitiveDesc {
    pub fn new(shape: ShapeDesc, material: usize) -> Self {
        Self {
            shape,
            material,
            transform: None,
            constant_medium: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformDesc) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_medium(mut self, density: f32, albedo: Vec3) -> Self {
        self.constant_medium = Some(MediumDesc { density, albedo });
        self
    }

    /// Own transform as a matrix, `None` when absent or empty.
    pub fn local_matrix(&self) -> Option<Mat4> {
        self.transform
            .as_ref()
            .filter(|t| !t.is_identity())
            .map(TransformDesc::to_matrix)
    }
}

/// Scene graph node: either a primitive reference or a transformed group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDesc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDesc>,
    #[serde(default, alias = "primitive", skip_serializing_if = "Option::is_none")]
    pub primitive_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDesc>,
}

/// One placed copy of a primitive: its index and the full model matrix
/// (node chain composed with the primitive's own transform).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub primitive: usize,
    pub transform: Option<Mat4>,
}

/// A complete scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub camera: CameraDesc,
    #[serde(default = "white")]
    pub background_color: Vec3,
    #[serde(default)]
    pub textures: Vec<TextureDesc>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveDesc>,
    /// Node graph; when absent every primitive is placed once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<Vec<NodeDesc>>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            camera: CameraDesc::default(),
            background_color: Vec3::ONE,
            textures: Vec::new(),
            materials: Vec::new(),
            primitives: Vec::new(),
            scene: None,
        }
    }
}

impl SceneDescription {
    /// Append a material and return its handle.
    pub fn add_material(&mut self, material: MaterialDesc) -> usize {
        self.materials.push(material.into());
        self.materials.len() - 1
    }

    /// Append a texture and return its handle.
    pub fn add_texture(&mut self, texture: TextureDesc) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Append a primitive and return its index.
    pub fn add_primitive(&mut self, primitive: PrimitiveDesc) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Every primitive instance the scene graph places, in traversal order.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out = Vec::new();
        match &self.scene {
            None => {
                for (index, primitive) in self.primitives.iter().enumerate() {
                    out.push(Placement {
                        primitive: index,
                        transform: primitive.local_matrix(),
                    });
                }
            }
            Some(nodes) => {
                for node in nodes {
                    self.collect_placements(node, None, &mut out);
                }
            }
        }
        out
    }

    fn collect_placements(&self, node: &NodeDesc, parent: Option<Mat4>, out: &mut Vec<Placement>) {
        let own = node
            .transform
            .as_ref()
            .filter(|t| !t.is_identity())
            .map(TransformDesc::to_matrix);
        let chain = compose(parent, own);

        if let Some(index) = node.primitive_idx {
            // Out-of-range indices are rejected by validation; skip defensively.
            if let Some(primitive) = self.primitives.get(index) {
                out.push(Placement {
                    primitive: index,
                    transform: compose(chain, primitive.local_matrix()),
                });
            }
        }
        for child in &node.children {
            self.collect_placements(child, chain, out);
        }
    }

    /// The built-in scene used when no scene file is given: a ground sphere,
    /// a matte sphere flanked by two metal spheres, under a pale sky.
    pub fn default_scene() -> Self {
        let mut scene = SceneDescription {
            camera: CameraDesc {
                fov: 90.0,
                center: Vec3::ZERO,
                look_at: Vec3::new(0.0, 0.0, -1.0),
                width: Some(400),
                aspect_ratio: Some(16.0 / 9.0),
                ..CameraDesc::default()
            },
            background_color: Vec3::new(0.7, 0.8, 1.0),
            ..SceneDescription::default()
        };

        let ground = scene.add_material(MaterialDesc::Lambertian {
            albedo: Vec3::new(0.8, 0.8, 0.0),
        });
        let center = scene.add_material(MaterialDesc::Lambertian {
            albedo: Vec3::new(0.1, 0.2, 0.5),
        });
        let left = scene.add_material(MaterialDesc::Metal {
            albedo: Vec3::splat(0.8),
            fuzz: 0.0,
        });
        let right = scene.add_material(MaterialDesc::Metal {
            albedo: Vec3::new(0.8, 0.6, 0.2),
            fuzz: 0.3,
        });

        for (center_pos, radius, material) in [
            (Vec3::new(0.0, -100.5, -1.0), 100.0, ground),
            (Vec3::new(0.0, 0.0, -1.2), 0.5, center),
            (Vec3::new(-1.0, 0.0, -1.0), 0.5, left),
            (Vec3::new(1.0, 0.0, -1.0), 0.5, right),
        ] {
            scene.add_primitive(PrimitiveDesc::new(
                ShapeDesc::Sphere {
                    center: center_pos,
                    radius,
                    displacement: Vec3::ZERO,
                },
                material,
            ));
        }
        scene
    }
}

fn compose(parent: Option<Mat4>, child: Option<Mat4>) -> Option<Mat4> {
    match (parent, child) {
        (Some(p), Some(c)) => Some(p * c),
        (Some(p), None) => Some(p),
        (None, c) => c,
    }
}
