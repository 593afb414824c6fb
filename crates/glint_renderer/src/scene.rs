//! Runtime scene: geometry arena, material and texture tables, camera.

use crate::{
    BvhNode, Camera, Color, ConstantMedium, HitRecord, Hittable, HittableArena, HittableId,
    HittableList, Material, MaterialId, Perlin, Quad, RenderError, Sphere, Texture, TextureId,
    Transformed,
};
use glint_core::{MaterialDesc, SceneDescription, ShapeDesc, TextureDesc};
use glint_math::{Interval, Mat4, Ray, Vec3};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;

/// Everything the renderer reads during a frame.
///
/// Built once, either by hand through the `add_*` methods or from a
/// [`SceneDescription`], and never mutated while rendering.
#[derive(Debug)]
pub struct Scene {
    objects: HittableArena,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    root: HittableId,
    lights: Option<HittableId>,
    /// Radiance of rays that escape the scene
    pub background: Color,
    pub camera: Camera,
    /// Output size pinned by the scene, if any
    pub dimensions: Option<(u32, u32)>,
}

impl Scene {
    /// Empty scene; the root is an empty list until [`Scene::set_root`].
    pub fn new(background: Color) -> Self {
        let mut objects = HittableArena::new();
        let root = objects.push(HittableList::new());
        Self {
            objects,
            materials: Vec::new(),
            textures: Vec::new(),
            root,
            lights: None,
            background,
            camera: Camera::default(),
            dimensions: None,
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Store a hittable in the arena.
    pub fn add(&mut self, hittable: impl Into<Hittable>) -> HittableId {
        self.objects.push(hittable)
    }

    /// List of existing objects.
    pub fn add_list(&mut self, ids: &[HittableId]) -> HittableId {
        let mut list = HittableList::new();
        for &id in ids {
            list.add(id, self.objects.get(id).bounding_box());
        }
        self.objects.push(list)
    }

    /// Axis-aligned box between opposite corners `a` and `b`, as a list of six quads.
    pub fn add_box(&mut self, a: Vec3, b: Vec3, material: MaterialId) -> HittableId {
        let min = a.min(b);
        let max = a.max(b);

        let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, max.y - min.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, max.z - min.z);

        let faces = [
            Quad::new(Vec3::new(min.x, min.y, max.z), dx, dy, material), // front
            Quad::new(Vec3::new(max.x, min.y, max.z), -dz, dy, material), // right
            Quad::new(Vec3::new(max.x, min.y, min.z), -dx, dy, material), // back
            Quad::new(Vec3::new(min.x, min.y, min.z), dz, dy, material), // left
            Quad::new(Vec3::new(min.x, max.y, max.z), dx, -dz, material), // top
            Quad::new(Vec3::new(min.x, min.y, min.z), dx, dz, material), // bottom
        ];
        let ids: Vec<_> = faces.into_iter().map(|face| self.add(face)).collect();
        self.add_list(&ids)
    }

    /// Fog of `density` inside `boundary`, colored by `texture`.
    pub fn add_constant_medium(
        &mut self,
        boundary: HittableId,
        density: f32,
        texture: TextureId,
    ) -> HittableId {
        let phase = self.add_material(Material::Isotropic { texture });
        let bbox = self.objects.get(boundary).bounding_box();
        self.add(ConstantMedium::new(boundary, bbox, density, phase))
    }

    /// `object` placed by `model`.
    pub fn add_transformed(&mut self, object: HittableId, model: Mat4) -> HittableId {
        let bbox = self.objects.get(object).bounding_box();
        self.add(Transformed::new(object, &bbox, model))
    }

    /// Build a BVH over `objects` and return its root (not yet the scene root).
    pub fn build_bvh(&mut self, mut objects: Vec<HittableId>) -> HittableId {
        BvhNode::build(&mut self.objects, &mut objects)
    }

    pub fn set_root(&mut self, root: HittableId) {
        self.root = root;
    }

    /// Objects sampled directly for importance sampling. An empty slice clears them.
    pub fn set_lights(&mut self, lights: &[HittableId]) {
        self.lights = if lights.is_empty() {
            None
        } else {
            Some(self.add_list(lights))
        };
    }

    /// Nearest hit against the root.
    pub fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord<'_>> {
        self.objects.get(self.root).hit(self, ray, ray_t, rng)
    }

    #[inline]
    pub fn object(&self, id: HittableId) -> &Hittable {
        self.objects.get(id)
    }

    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn root(&self) -> HittableId {
        self.root
    }

    /// Light list handle, if the scene has importance-sampled lights.
    pub fn lights(&self) -> Option<HittableId> {
        self.lights
    }

    /// Build the runtime scene from a description.
    ///
    /// The description is validated first. `seed` drives the Perlin tables.
    pub fn from_description(desc: &SceneDescription, seed: u64) -> Result<Self, RenderError> {
        desc.validate()?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut scene = Scene::new(desc.background_color);
        scene.camera = Camera::from(&desc.camera);
        scene.dimensions = desc.camera.dimensions();

        for texture in &desc.textures {
            let texture = match texture {
                TextureDesc::SolidColor { albedo } => Texture::Solid(*albedo),
                TextureDesc::Checker {
                    scale,
                    even_tex_idx,
                    odd_tex_idx,
                } => Texture::checker(*scale, *even_tex_idx, *odd_tex_idx),
                TextureDesc::Noise {
                    scale,
                    noise_type,
                    albedo,
                    point_count,
                } => Texture::Noise {
                    noise: Perlin::new(*point_count as usize, &mut rng),
                    albedo: *albedo,
                    scale: *scale,
                    kind: *noise_type,
                },
            };
            scene.add_texture(texture);
        }

        for entry in &desc.materials {
            let material = match &entry.material {
                MaterialDesc::Lambertian { albedo } => Material::Lambertian { albedo: *albedo },
                MaterialDesc::Metal { albedo, fuzz } => Material::Metal {
                    albedo: *albedo,
                    fuzz: *fuzz,
                },
                MaterialDesc::Dielectric { refraction_index } => Material::Dielectric {
                    refraction_index: *refraction_index,
                },
                MaterialDesc::Texture { tex_idx, albedo } => Material::Textured {
                    texture: scene.texture_or_solid(*tex_idx, *albedo),
                },
                MaterialDesc::DiffuseLight {
                    tex_idx,
                    albedo,
                    double_sided,
                } => Material::DiffuseLight {
                    texture: scene.texture_or_solid(*tex_idx, *albedo),
                    double_sided: *double_sided,
                },
                MaterialDesc::Isotropic { tex_idx, albedo } => Material::Isotropic {
                    texture: scene.texture_or_solid(*tex_idx, *albedo),
                },
            };
            scene.add_material(material);
        }

        // Shape plus medium, shared by every placement of the same primitive
        let mut bases: HashMap<usize, HittableId> = HashMap::new();
        let mut top_level = Vec::new();
        let mut lights = Vec::new();

        for placement in desc.placements() {
            let primitive = &desc.primitives[placement.primitive];
            let base = match bases.get(&placement.primitive) {
                Some(&id) => id,
                None => {
                    let mut id = match &primitive.shape {
                        ShapeDesc::Sphere {
                            center,
                            radius,
                            displacement,
                        } => scene.add(Sphere::moving(
                            *center,
                            *displacement,
                            *radius,
                            primitive.material,
                        )),
                        ShapeDesc::Quad { q, u, v } => {
                            scene.add(Quad::new(*q, *u, *v, primitive.material))
                        }
                        ShapeDesc::Cuboid { a, b } => scene.add_box(*a, *b, primitive.material),
                    };
                    if let Some(medium) = &primitive.constant_medium {
                        let texture = scene.add_texture(Texture::Solid(medium.albedo));
                        id = scene.add_constant_medium(id, medium.density, texture);
                    }
                    bases.insert(placement.primitive, id);
                    id
                }
            };

            let placed = match placement.transform {
                Some(model) => scene.add_transformed(base, model),
                None => base,
            };
            top_level.push(placed);

            if scene.material(primitive.material).is_emissive() {
                let moving = matches!(
                    primitive.shape,
                    ShapeDesc::Sphere { displacement, .. } if displacement != Vec3::ZERO
                );
                if placement.transform.is_none() && primitive.constant_medium.is_none() && !moving {
                    lights.push(placed);
                } else {
                    log::warn!(
                        "Primitive {} emits light but is transformed, moving or a medium; it is not importance sampled",
                        placement.primitive
                    );
                }
            }
        }

        let instance_count = top_level.len();
        let root = scene.build_bvh(top_level);
        scene.set_root(root);
        scene.set_lights(&lights);

        log::info!(
            "Built scene: {} instances, {} lights, {} materials, {} textures, {} arena objects",
            instance_count,
            lights.len(),
            scene.materials.len(),
            scene.textures.len(),
            scene.objects.len()
        );
        Ok(scene)
    }

    /// The built-in three-sphere scene.
    pub fn default_scene() -> Result<Self, RenderError> {
        Self::from_description(&SceneDescription::default_scene(), 0)
    }

    /// Existing texture handle, or a new solid texture for `albedo`.
    fn texture_or_solid(&mut self, tex_idx: Option<usize>, albedo: Option<Vec3>) -> TextureId {
        match tex_idx {
            Some(index) => index,
            None => self.add_texture(Texture::Solid(albedo.unwrap_or(Vec3::ONE))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray_color;
    use glint_core::load_scene_from_str;
    use rand::rngs::StdRng;

    fn interval() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_default_scene_builds() {
        let scene = Scene::default_scene().unwrap();
        assert_eq!(scene.materials().len(), 4);
        assert_eq!(scene.dimensions, Some((400, 225)));
        assert!(scene.lights().is_none());

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z, 0.0);
        let rec = scene.hit(&ray, interval(), &mut rng).unwrap();
        // Centre sphere at z = -1.2, radius 0.5
        assert!((rec.t - 0.7).abs() < 1e-4);
    }

    #[test]
    fn test_box_faces_enclose_volume() {
        let mut scene = Scene::new(Vec3::ZERO);
        let mat = scene.add_material(Material::Lambertian { albedo: Vec3::ONE });
        let cube = scene.add_box(Vec3::ONE, Vec3::ZERO, mat);
        scene.set_root(cube);

        let bbox = scene.object(cube).bounding_box();
        assert!((bbox.min() - Vec3::ZERO).length() < 1e-3);
        assert!((bbox.max() - Vec3::ONE).length() < 1e-3);

        let mut rng = StdRng::seed_from_u64(0);
        let center = Vec3::splat(0.5);
        for dir in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
            // From outside: hits the near face at distance 1.5, front face
            let rec = scene.hit(&Ray::new(center + dir * 2.0, -dir, 0.0), interval(), &mut rng).unwrap();
            assert!((rec.t - 1.5).abs() < 1e-4, "{dir:?}");
            assert!(rec.front_face, "{dir:?}");
            assert!((rec.normal - dir).length() < 1e-5, "{dir:?}");

            // From inside: back face
            let rec = scene.hit(&Ray::new(center, dir, 0.0), interval(), &mut rng).unwrap();
            assert!((rec.t - 0.5).abs() < 1e-4);
            assert!(!rec.front_face, "{dir:?}");
        }
    }

    const LIT_SCENE: &str = r#"{
        "background_color": [0, 0, 0],
        "textures": [{"type": "checker", "scale": 0.5, "even_tex_idx": 1, "odd_tex_idx": 2},
                     {"type": "solid_color", "albedo": [1, 1, 1]},
                     {"type": "solid_color", "albedo": [0, 0, 0]},
                     {"type": "noise", "scale": 2, "point_count": 64}],
        "materials": [
            {"type": "texture", "tex_idx": 0},
            {"type": "diffuse_light", "albedo": [4, 4, 4]},
            {"type": "isotropic", "albedo": [0.5, 0.5, 0.5]},
            {"type": "texture", "tex_idx": 3}
        ],
        "primitives": [
            {"type": "quad", "q": [-5, 0, -5], "u": [10, 0, 0], "v": [0, 0, 10], "material": 0},
            {"type": "quad", "q": [-1, 4, -1], "u": [2, 0, 0], "v": [0, 0, 2], "material": 1},
            {"type": "box", "a": [-0.5, 0, -0.5], "b": [0.5, 1, 0.5], "material": 2,
             "constant_medium": {"density": 0.5, "albedo": [0.9, 0.9, 0.9]}},
            {"type": "sphere", "center": [0, 1, 0], "radius": 1, "material": 3,
             "transform": {"translation": [3, 0, 0]}},
            {"type": "quad", "q": [-1, 6, -1], "u": [2, 0, 0], "v": [0, 0, 2], "material": 1,
             "transform": {"translation": [0, 1, 0]}}
        ]
    }"#;

    #[test]
    fn test_from_description_assembly() {
        let desc = load_scene_from_str(LIT_SCENE).unwrap();
        let scene = Scene::from_description(&desc, 7).unwrap();

        // Light material's albedo became an implicit texture
        assert!(matches!(
            scene.material(1),
            Material::DiffuseLight { texture: 4, double_sided: true }
        ));
        assert!(matches!(scene.textures()[4], Texture::Solid(c) if c == Vec3::splat(4.0)));

        // Only the untransformed light quad is importance sampled
        let lights = scene.lights().unwrap();
        match scene.object(lights) {
            Hittable::List(list) => assert_eq!(list.len(), 1),
            other => panic!("expected light list, got {other:?}"),
        }

        // The medium added an isotropic phase material
        assert!(scene
            .materials()
            .iter()
            .skip(desc.materials.len())
            .any(|m| matches!(m, Material::Isotropic { .. })));

        // Straight down from above the translated sphere
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::new(3.0, 10.0, 0.0), Vec3::NEG_Y, 0.0);
        let rec = scene.hit(&ray, interval(), &mut rng).unwrap();
        assert!((rec.p.y - 2.0).abs() < 1e-4);
        assert!(matches!(rec.material, Material::Textured { texture: 3 }));
    }

    #[test]
    fn test_lights_emit_from_both_faces_by_default() {
        // Quad normal u x v points down
        let desc = load_scene_from_str(
            r#"{
                "background_color": [0, 0, 0],
                "materials": [
                    {"type": "diffuse_light", "albedo": [4, 4, 4]},
                    {"type": "diffuse_light", "albedo": [2, 2, 2], "double_sided": false}
                ],
                "primitives": [
                    {"type": "quad", "q": [-1, 0, -1], "u": [2, 0, 0], "v": [0, 0, 2], "material": 0},
                    {"type": "quad", "q": [9, 0, -1], "u": [2, 0, 0], "v": [0, 0, 2], "material": 1}
                ]
            }"#,
        )
        .unwrap();
        let scene = Scene::from_description(&desc, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let radiance = |x: f32, y: f32, dir: Vec3, rng: &mut StdRng| {
            ray_color(&Ray::new(Vec3::new(x, y, 0.0), dir, 0.0), &scene, 4, rng)
        };

        assert_eq!(radiance(0.0, 5.0, Vec3::NEG_Y, &mut rng), Vec3::splat(4.0));
        assert_eq!(radiance(0.0, -5.0, Vec3::Y, &mut rng), Vec3::splat(4.0));

        // An explicit single-sided light stays dark from behind
        assert_eq!(radiance(10.0, 5.0, Vec3::NEG_Y, &mut rng), Vec3::ZERO);
        assert_eq!(radiance(10.0, -5.0, Vec3::Y, &mut rng), Vec3::splat(2.0));
    }

    #[test]
    fn test_moving_emitters_are_not_sampled() {
        let desc = load_scene_from_str(
            r#"{
                "materials": [{"type": "lambertian"}, {"type": "diffuse_light", "albedo": [3, 3, 3]}],
                "primitives": [
                    {"type": "sphere", "center": [0, -100, 0], "radius": 99, "material": 0},
                    {"type": "sphere", "center": [0, 2, 0], "radius": 0.5, "material": 1},
                    {"type": "sphere", "center": [3, 2, 0], "radius": 0.5, "material": 1,
                     "displacement": [0, 1, 0]}
                ]
            }"#,
        )
        .unwrap();
        let scene = Scene::from_description(&desc, 0).unwrap();

        let lights = scene.lights().unwrap();
        match scene.object(lights) {
            Hittable::List(list) => assert_eq!(list.len(), 1),
            other => panic!("expected light list, got {other:?}"),
        }
    }

    #[test]
    fn test_scene_graph_instances_share_geometry() {
        let desc = load_scene_from_str(
            r#"{
                "materials": [{"type": "lambertian"}],
                "primitives": [{"type": "sphere", "radius": 0.5}],
                "scene": [
                    {"primitive_idx": 0},
                    {"transform": {"translation": [5, 0, 0]}, "children": [
                        {"primitive": 0},
                        {"transform": {"translation": [0, 5, 0]}, "primitive_idx": 0}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let scene = Scene::from_description(&desc, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        for (x, y) in [(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)] {
            let ray = Ray::new(Vec3::new(x, y, 10.0), Vec3::NEG_Z, 0.0);
            let rec = scene.hit(&ray, interval(), &mut rng).unwrap();
            assert!((rec.t - 9.5).abs() < 1e-4, "instance at ({x}, {y})");
        }
        let ray = Ray::new(Vec3::new(0.0, 5.0, 10.0), Vec3::NEG_Z, 0.0);
        assert!(scene.hit(&ray, interval(), &mut rng).is_none());
    }

    #[test]
    fn test_invalid_description_is_rejected() {
        let mut desc = SceneDescription::default_scene();
        desc.primitives[0].material = 99;
        assert!(matches!(
            Scene::from_description(&desc, 0),
            Err(RenderError::Scene(_))
        ));
    }

    #[test]
    fn test_perlin_tables_follow_seed() {
        let desc = load_scene_from_str(LIT_SCENE).unwrap();
        let a = Scene::from_description(&desc, 1).unwrap();
        let b = Scene::from_description(&desc, 1).unwrap();
        let p = Vec3::new(0.3, 0.7, -1.1);
        let uv = glint_math::Vec2::ZERO;
        assert_eq!(
            a.textures()[3].value(a.textures(), uv, p),
            b.textures()[3].value(b.textures(), uv, p)
        );
    }
}
