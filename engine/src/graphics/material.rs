//! Surface material of a drawable
//!
//! Colors act on their own when textures are disabled. With textures enabled
//! each present texture is sampled and its color vector becomes a tint.

use std::rc::Rc;

use glam::Vec3;

use crate::graphics::texture::Texture2D;

/// Texture unit sampled for the diffuse map
pub const DIFFUSE_TEXTURE_UNIT: u32 = 0;
/// Texture unit sampled for the specular map
pub const SPECULAR_TEXTURE_UNIT: u32 = 1;
/// Texture unit sampled for the emission map
pub const EMISSION_TEXTURE_UNIT: u32 = 2;

/// Material properties uploaded with every draw
#[derive(Debug, Clone)]
pub struct Material {
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub emission_color: Vec3,
    pub diffuse_texture: Option<Rc<Texture2D>>,
    pub specular_texture: Option<Rc<Texture2D>>,
    pub emission_texture: Option<Rc<Texture2D>>,
    /// Master opacity, 1 for fully opaque
    pub opacity: f32,
    pub shininess: f32,
    /// Sample the textures that are present
    pub use_textures: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::splat(0.5),
            emission_color: Vec3::ZERO,
            diffuse_texture: None,
            specular_texture: None,
            emission_texture: None,
            opacity: 1.0,
            shininess: 32.0,
            use_textures: false,
        }
    }
}

impl Material {
    /// Untextured material with matching ambient and diffuse color
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        let color = Vec3::new(r, g, b);
        Self {
            ambient_color: color,
            diffuse_color: color,
            ..Self::default()
        }
    }

    /// Material sampling `texture` for its diffuse color
    pub fn textured(texture: Rc<Texture2D>) -> Self {
        Self {
            diffuse_texture: Some(texture),
            use_textures: true,
            ..Self::default()
        }
    }

    pub fn white() -> Self {
        Self::default()
    }

    pub fn gray(value: f32) -> Self {
        Self::from_rgb(value, value, value)
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn diffuse_texture_enabled(&self) -> bool {
        self.use_textures && self.diffuse_texture.is_some()
    }

    pub fn specular_texture_enabled(&self) -> bool {
        self.use_textures && self.specular_texture.is_some()
    }

    pub fn emission_texture_enabled(&self) -> bool {
        self.use_textures && self.emission_texture.is_some()
    }

    /// Present textures with the unit each one is bound to
    pub fn texture_slots(&self) -> impl Iterator<Item = (u32, &Rc<Texture2D>)> {
        [
            (DIFFUSE_TEXTURE_UNIT, self.diffuse_texture.as_ref()),
            (SPECULAR_TEXTURE_UNIT, self.specular_texture.as_ref()),
            (EMISSION_TEXTURE_UNIT, self.emission_texture.as_ref()),
        ]
        .into_iter()
        .filter_map(|(unit, texture)| texture.map(|texture| (unit, texture)))
    }
}
