//! Scene light sources

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Point lights uploaded per draw; the shader array has this many slots
pub const MAX_POINT_LIGHTS: usize = 4;
/// Spot lights uploaded per draw; the shader array has this many slots
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Light arriving from one direction everywhere in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient_intensity: Vec3,
    pub diffuse_intensity: Vec3,
    pub specular_intensity: Vec3,
    pub enabled: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -1.0, 1.0),
            ambient_intensity: Vec3::splat(0.1),
            diffuse_intensity: Vec3::ONE,
            specular_intensity: Vec3::ONE,
            enabled: true,
        }
    }
}

/// Light emitted in all directions from a position, fading with distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient_intensity: Vec3,
    pub diffuse_intensity: Vec3,
    pub specular_intensity: Vec3,
    /// Attenuation = 1 / (constant + linear d + quadratic d²)
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub enabled: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        // Covers roughly 50 units
        Self {
            position: Vec3::ZERO,
            ambient_intensity: Vec3::splat(0.05),
            diffuse_intensity: Vec3::ONE,
            specular_intensity: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            enabled: true,
        }
    }
}

impl PointLight {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Intensity factor at `distance` from the light
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Point light restricted to a cone with a soft edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient_intensity: Vec3,
    pub diffuse_intensity: Vec3,
    pub specular_intensity: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Half-angle of the fully lit cone, in degrees
    pub inner_cutoff: f32,
    /// Half-angle where the light reaches zero, in degrees
    pub outer_cutoff: f32,
    pub enabled: bool,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            ambient_intensity: Vec3::ZERO,
            diffuse_intensity: Vec3::ONE,
            specular_intensity: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            inner_cutoff: 12.5,
            outer_cutoff: 17.5,
            enabled: true,
        }
    }
}

impl SpotLight {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
            ..Self::default()
        }
    }

    /// Cosines of the inner and outer cutoff angles, as the shader expects
    pub fn cutoff_cosines(&self) -> (f32, f32) {
        (
            self.inner_cutoff.to_radians().cos(),
            self.outer_cutoff.to_radians().cos(),
        )
    }
}

/// Every light affecting a draw
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLighting {
    pub global_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub spot_lights: Vec<SpotLight>,
}

impl SceneLighting {
    pub fn with_point_light(mut self, light: PointLight) -> Self {
        self.point_lights.push(light);
        self
    }

    pub fn with_spot_light(mut self, light: SpotLight) -> Self {
        self.spot_lights.push(light);
        self
    }
}
