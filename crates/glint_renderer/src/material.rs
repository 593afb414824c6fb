//! Surface and volume scattering models.

use crate::{random::gen_f32, random_unit_vector, HitRecord, Pdf, Texture, TextureId};
use glint_math::{Onb, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

/// Color type alias (linear RGB, usually 0-1 except for emitters)
pub type Color = Vec3;

/// Index into the scene's material table.
pub type MaterialId = usize;

/// Outcome of a successful scatter.
#[derive(Debug, Clone, Copy)]
pub struct ScatterRecord {
    pub attenuation: Color,
    /// The sampled outgoing ray
    pub scattered: Ray,
    /// Sampling density for diffuse lobes; `None` for specular materials,
    /// whose `scattered` ray is followed as-is
    pub pdf: Option<Pdf<'static>>,
}

/// Closed set of materials, dispatched by `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Lambertian {
        albedo: Color,
    },
    /// Mirror reflection perturbed by `fuzz` (0 = perfect mirror)
    Metal {
        albedo: Color,
        fuzz: f32,
    },
    Dielectric {
        refraction_index: f32,
    },
    /// Lambertian with the albedo looked up from a texture
    Textured {
        texture: TextureId,
    },
    DiffuseLight {
        texture: TextureId,
        double_sided: bool,
    },
    /// Phase function of participating media
    Isotropic {
        texture: TextureId,
    },
}

impl Material {
    /// Sample an outgoing direction. `None` means the path is absorbed.
    pub fn scatter(
        &self,
        textures: &[Texture],
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian { albedo } => Some(diffuse_scatter(*albedo, ray_in, rec, rng)),
            Material::Textured { texture } => {
                let albedo = texture_value(textures, *texture, rec);
                Some(diffuse_scatter(albedo, ray_in, rec, rng))
            }
            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction.normalize(), rec.normal);
                let direction = reflected + fuzz.clamp(0.0, 1.0) * random_unit_vector(rng);

                // Fuzz can push the ray below the surface; absorb it
                if direction.dot(rec.normal) <= 0.0 {
                    return None;
                }
                Some(ScatterRecord {
                    attenuation: *albedo,
                    scattered: Ray::new(rec.p, direction, ray_in.time),
                    pdf: None,
                })
            }
            Material::Dielectric { refraction_index } => {
                let ri = if rec.front_face {
                    1.0 / refraction_index
                } else {
                    *refraction_index
                };

                let unit_direction = ray_in.direction.normalize();
                let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

                // Check for total internal reflection
                let cannot_refract = ri * sin_theta > 1.0;
                let direction = if cannot_refract || reflectance(cos_theta, ri) > gen_f32(rng) {
                    reflect(unit_direction, rec.normal)
                } else {
                    refract(unit_direction, rec.normal, ri)
                };

                Some(ScatterRecord {
                    attenuation: Color::ONE,
                    scattered: Ray::new(rec.p, direction, ray_in.time),
                    pdf: None,
                })
            }
            Material::DiffuseLight { .. } => None,
            Material::Isotropic { texture } => Some(ScatterRecord {
                attenuation: texture_value(textures, *texture, rec),
                scattered: Ray::new(rec.p, random_unit_vector(rng), ray_in.time),
                pdf: Some(Pdf::Sphere),
            }),
        }
    }

    /// Light emitted at the hit point.
    ///
    /// Single-sided lights only emit from their front face.
    pub fn emitted(&self, textures: &[Texture], rec: &HitRecord) -> Color {
        match self {
            Material::DiffuseLight {
                texture,
                double_sided,
            } => {
                if !rec.front_face && !double_sided {
                    return Color::ZERO;
                }
                texture_value(textures, *texture, rec)
            }
            _ => Color::ZERO,
        }
    }

    /// Density of this material scattering `ray_in` into `scattered`.
    ///
    /// Zero for specular materials, which never use it.
    pub fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        match self {
            Material::Lambertian { .. } | Material::Textured { .. } => {
                let cos_theta = rec.normal.dot(scattered.direction.normalize());
                if cos_theta < 0.0 {
                    0.0
                } else {
                    cos_theta / PI
                }
            }
            Material::Isotropic { .. } => 1.0 / (4.0 * PI),
            _ => 0.0,
        }
    }

    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::DiffuseLight { .. })
    }
}

fn diffuse_scatter(albedo: Color, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterRecord {
    let mut direction = rec.normal + random_unit_vector(rng);

    // Catch degenerate scatter direction
    if direction.length_squared() < 1e-8 {
        direction = rec.normal;
    }

    ScatterRecord {
        attenuation: albedo,
        scattered: Ray::new(rec.p, direction, ray_in.time),
        pdf: Some(Pdf::Cosine(Onb::new(rec.normal))),
    }
}

fn texture_value(textures: &[Texture], texture: TextureId, rec: &HitRecord) -> Color {
    textures
        .get(texture)
        .map_or(Color::ZERO, |tex| tex.value(textures, rec.uv, rec.p))
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance
fn reflectance(cosine: f32, refraction_index: f32) -> f32 {
    let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
