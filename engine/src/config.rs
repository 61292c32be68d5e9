//! Configuration types for the engine
//!
//! [`EngineConfig`] is read from a JSON file. Every section and field is
//! optional; missing values fall back to their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::graphics::camera::Camera;
use crate::graphics::lighting::SceneLighting;
use crate::time::{FixedTimestep, DEFAULT_TIMESTEP};

/// Configuration for asset paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// Directory name for shader sources (relative to asset_root)
    pub shaders_dir: String,
    /// Directory name for texture images (relative to asset_root)
    pub textures_dir: String,
}

impl AssetConfig {
    pub fn new(asset_root: PathBuf, shaders_dir: String, textures_dir: String) -> Self {
        debug!(
            asset_root = ?asset_root,
            shaders_dir = shaders_dir,
            textures_dir = textures_dir,
            "Creating new AssetConfig"
        );
        Self {
            asset_root,
            shaders_dir,
            textures_dir,
        }
    }

    /// Full path to a shader source file, `file` including its extension
    pub fn shader_path(&self, file: &str) -> Result<PathBuf> {
        let path = self
            .asset_root
            .join(&self.shaders_dir)
            .join(checked_file_name(file, "shader")?);
        debug!(file = file, path = ?path, "Generated shader path");
        Ok(path)
    }

    /// Full path to a texture image file, `file` including its extension
    pub fn texture_path(&self, file: &str) -> Result<PathBuf> {
        let path = self
            .asset_root
            .join(&self.textures_dir)
            .join(checked_file_name(file, "texture")?);
        debug!(file = file, path = ?path, "Generated texture path");
        Ok(path)
    }

    /// Check if the asset directories exist
    pub fn validate(&self) -> Result<()> {
        let dirs = [
            self.asset_root.clone(),
            self.asset_root.join(&self.shaders_dir),
            self.asset_root.join(&self.textures_dir),
        ];
        match dirs.iter().find(|dir| !dir.is_dir()) {
            Some(missing) => Err(EngineError::Config(format!(
                "asset directory not found: {}",
                missing.display()
            ))),
            None => Ok(()),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            shaders_dir: "shaders".to_string(),
            textures_dir: "textures".to_string(),
        }
    }
}

/// Rejects names that would leave the asset directory
fn checked_file_name<'a>(file: &'a str, kind: &str) -> Result<&'a str> {
    if file.is_empty() || file.contains("..") || file.contains('/') || file.contains('\\') {
        return Err(EngineError::Config(format!("invalid {kind} file name: {file}")));
    }
    Ok(file)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    pub fn viewport_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            width: 1600,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Logic step length in seconds
    pub fixed_timestep: f32,
    pub max_steps_per_frame: Option<u32>,
}

impl TimingConfig {
    pub fn build(&self) -> FixedTimestep {
        let mut timestep = FixedTimestep::new(self.fixed_timestep);
        timestep.max_steps_per_frame = self.max_steps_per_frame;
        timestep
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: DEFAULT_TIMESTEP,
            max_steps_per_frame: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub sensitivity: f32,
    pub speed: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraConfig {
    /// Camera at `position` looking down -Z with these settings
    pub fn build(&self, position: Vec3, viewport: Vec2) -> Camera {
        Camera::new(position, viewport, Vec3::NEG_Z, self.fov)
            .with_sensitivity(self.sensitivity)
            .with_speed(self.speed)
            .with_clip_planes(self.near, self.far)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            sensitivity: 0.14,
            speed: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub timing: TimingConfig,
    pub camera: CameraConfig,
    pub assets: AssetConfig,
    /// Scene lights; `None` renders unlit
    pub lighting: Option<SceneLighting>,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = ?path, "Loading engine config");

        let json = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = serde_json::from_str(&json).map_err(|e| {
            EngineError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;

        debug!(config = ?config, "Engine config loaded");
        Ok(config)
    }
}
