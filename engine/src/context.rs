//! Render context
//!
//! Owns the graphics device handle, the resource cache and the renderer for
//! one graphics context, and resolves asset file names through the
//! configured [`AssetConfig`].

use glam::Vec4;
use tracing::info;

use crate::assets::cache::ResourceCache;
use crate::config::AssetConfig;
use crate::error::Result;
use crate::graphics::camera::CameraProjection;
use crate::graphics::device::{ClearFlags, Gpu};
use crate::graphics::geometry::Geometry;
use crate::graphics::lighting::SceneLighting;
use crate::graphics::renderer::Renderer;

/// Everything needed to load assets and draw on one graphics context
#[derive(Debug)]
pub struct RenderContext {
    pub device: Gpu,
    pub cache: ResourceCache,
    pub renderer: Renderer,
    pub assets: AssetConfig,
}

impl RenderContext {
    /// Creates the cache and renderer over `device` and initializes the
    /// renderer, which loads the built-in shader programs
    pub fn new(device: Gpu) -> Result<Self> {
        Self::with_assets(device, AssetConfig::default())
    }

    pub fn with_assets(device: Gpu, assets: AssetConfig) -> Result<Self> {
        let mut cache = ResourceCache::new(&device);
        let renderer = Renderer::new(&device);
        renderer.init(&mut cache)?;

        info!(asset_root = ?assets.asset_root, "Render context created");
        Ok(Self {
            device,
            cache,
            renderer,
            assets,
        })
    }

    /// Loads a texture from the configured textures directory
    pub fn load_texture(
        &mut self,
        id: &str,
        file: &str,
        flip_on_load: bool,
        srgb: bool,
    ) -> Result<()> {
        let path = self.assets.texture_path(file)?;
        self.cache.load_texture(id, &path, flip_on_load, srgb)
    }

    /// Loads a shader program from the configured shaders directory
    pub fn load_shader(
        &mut self,
        id: &str,
        vertex_file: &str,
        fragment_file: &str,
    ) -> Result<()> {
        let vertex_path = self.assets.shader_path(vertex_file)?;
        let fragment_path = self.assets.shader_path(fragment_file)?;
        self.cache.load_shader(id, &vertex_path, &fragment_path)
    }

    pub fn clear(&self, flags: ClearFlags, color: Vec4) {
        self.renderer.clear(flags, color);
    }

    pub fn render(
        &self,
        camera: &dyn CameraProjection,
        geometry: &Geometry,
        lighting: Option<&SceneLighting>,
    ) -> Result<()> {
        self.renderer.render(&self.cache, camera, geometry, lighting)
    }
}
