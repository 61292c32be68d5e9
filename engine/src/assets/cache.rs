//! Identifier-keyed cache of GPU resources
//!
//! Shaders, textures and geometry buffer pairs each live in their own
//! namespace. Loading an identifier that is already taken is a warning and a
//! no-op: the stored resource is kept and the new source is never read.
//! Resources are handed out as `Rc` clones and released when the last holder
//! drops them.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::assets::image::{DecodedImage, ImageDecoder, ImageFileDecoder};
use crate::error::{EngineError, Result};
use crate::graphics::buffer::{IndexBuffer, VertexAttribute, VertexBuffer};
use crate::graphics::device::{BufferUsage, Gpu};
use crate::graphics::shader::ShaderProgram;
use crate::graphics::texture::Texture2D;

/// Vertex buffer and optional index buffer shared by every drawable of one
/// shape
#[derive(Debug, Clone)]
pub struct GeometryBuffers {
    pub vertex_buffer: Rc<VertexBuffer>,
    pub index_buffer: Option<Rc<IndexBuffer>>,
}

/// Registry of shared shader, texture and geometry buffer resources
pub struct ResourceCache {
    gpu: Gpu,
    decoder: Box<dyn ImageDecoder>,
    shaders: HashMap<String, Rc<ShaderProgram>>,
    textures: HashMap<String, Rc<Texture2D>>,
    geometry_buffers: HashMap<String, GeometryBuffers>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("shaders", &self.shaders.len())
            .field("textures", &self.textures.len())
            .field("geometry_buffers", &self.geometry_buffers.len())
            .finish()
    }
}

fn check_id(id: &str, namespace: &'static str) -> Result<()> {
    if id.is_empty() {
        return Err(EngineError::EmptyIdentifier { namespace });
    }
    Ok(())
}

impl ResourceCache {
    /// Cache decoding image files with the `image` crate
    pub fn new(gpu: &Gpu) -> Self {
        Self::with_decoder(gpu, Box::new(ImageFileDecoder))
    }

    pub fn with_decoder(gpu: &Gpu, decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            gpu: gpu.clone(),
            decoder,
            shaders: HashMap::new(),
            textures: HashMap::new(),
            geometry_buffers: HashMap::new(),
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    // Shaders

    /// Compile and store the program read from two source files
    pub fn load_shader(
        &mut self,
        id: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<()> {
        check_id(id, "shader")?;
        if self.shaders.contains_key(id) {
            warn!(id, "Skipped shader load operation, the ID has already been used");
            return Ok(());
        }

        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        let program = ShaderProgram::from_files(&self.gpu, vertex_path, fragment_path)?;
        info!(
            id,
            vertex = %vertex_path.display(),
            fragment = %fragment_path.display(),
            "Loaded shader"
        );
        self.shaders.insert(id.to_owned(), Rc::new(program));
        Ok(())
    }

    /// Compile and store a program from in-memory source text
    pub fn load_shader_from_source(
        &mut self,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<()> {
        check_id(id, "shader")?;
        if self.shaders.contains_key(id) {
            warn!(id, "Skipped shader load operation, the ID has already been used");
            return Ok(());
        }

        let program = ShaderProgram::from_sources(&self.gpu, vertex_source, fragment_source)?;
        info!(id, "Loaded shader from source");
        self.shaders.insert(id.to_owned(), Rc::new(program));
        Ok(())
    }

    /// Stored shader; a missing shader is an error
    pub fn get_shader(&self, id: &str) -> Result<Rc<ShaderProgram>> {
        self.shaders
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::ShaderNotFound { id: id.to_owned() })
    }

    /// Drop the cache's reference; returns whether the ID was stored
    pub fn remove_shader(&mut self, id: &str) -> bool {
        let removed = self.shaders.remove(id).is_some();
        debug!(id, removed, "Removed shader");
        removed
    }

    pub fn contains_shader(&self, id: &str) -> bool {
        self.shaders.contains_key(id)
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    // Textures

    /// Decode an image file and store it as a 2D texture
    pub fn load_texture(
        &mut self,
        id: &str,
        path: impl AsRef<Path>,
        flip_on_load: bool,
        srgb: bool,
    ) -> Result<()> {
        check_id(id, "texture")?;
        if self.textures.contains_key(id) {
            warn!(id, "Skipped texture image load operation, the ID has already been used");
            return Ok(());
        }

        let path = path.as_ref();
        let image = self.decoder.decode(path, flip_on_load)?;
        let texture = Texture2D::from_image(&self.gpu, &image, srgb, path)?;
        info!(
            id,
            path = %path.display(),
            width = image.width,
            height = image.height,
            "Loaded texture"
        );
        self.textures.insert(id.to_owned(), Rc::new(texture));
        Ok(())
    }

    /// Store already decoded pixels as a 2D texture
    pub fn load_texture_from_image(
        &mut self,
        id: &str,
        image: &DecodedImage,
        srgb: bool,
    ) -> Result<()> {
        check_id(id, "texture")?;
        if self.textures.contains_key(id) {
            warn!(id, "Skipped texture image load operation, the ID has already been used");
            return Ok(());
        }

        let texture = Texture2D::from_image(&self.gpu, image, srgb, Path::new(id))?;
        info!(id, width = image.width, height = image.height, "Loaded texture from memory");
        self.textures.insert(id.to_owned(), Rc::new(texture));
        Ok(())
    }

    /// Stored texture, or `None` with a warning
    pub fn get_texture(&self, id: &str) -> Option<Rc<Texture2D>> {
        let texture = self.textures.get(id).cloned();
        if texture.is_none() {
            warn!(id, "No texture image exists with the ID");
        }
        texture
    }

    pub fn remove_texture(&mut self, id: &str) -> bool {
        let removed = self.textures.remove(id).is_some();
        debug!(id, removed, "Removed texture");
        removed
    }

    pub fn contains_texture(&self, id: &str) -> bool {
        self.textures.contains_key(id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // Geometry buffers

    /// Store a buffer pair under `id`; a vertex buffer is required
    pub fn store_geometry_buffers(
        &mut self,
        id: &str,
        vertex_buffer: Option<Rc<VertexBuffer>>,
        index_buffer: Option<Rc<IndexBuffer>>,
    ) -> Result<()> {
        check_id(id, "geometry buffers")?;
        let Some(vertex_buffer) = vertex_buffer else {
            return Err(EngineError::MissingVertexBuffer { id: id.to_owned() });
        };
        if self.geometry_buffers.contains_key(id) {
            warn!(
                id,
                "Skipped geometry buffer objects storage operation, the ID has already been used"
            );
            return Ok(());
        }

        debug!(id, indexed = index_buffer.is_some(), "Stored geometry buffers");
        self.geometry_buffers.insert(
            id.to_owned(),
            GeometryBuffers {
                vertex_buffer,
                index_buffer,
            },
        );
        Ok(())
    }

    /// Stored buffer pair, or `None` with a warning
    pub fn get_geometry_buffers(&self, id: &str) -> Option<GeometryBuffers> {
        let buffers = self.geometry_buffers.get(id).cloned();
        if buffers.is_none() {
            warn!(id, "No geometry buffers exist with the ID");
        }
        buffers
    }

    pub fn remove_geometry_buffers(&mut self, id: &str) -> bool {
        let removed = self.geometry_buffers.remove(id).is_some();
        debug!(id, removed, "Removed geometry buffers");
        removed
    }

    pub fn contains_geometry_buffers(&self, id: &str) -> bool {
        self.geometry_buffers.contains_key(id)
    }

    pub fn geometry_buffers_count(&self) -> usize {
        self.geometry_buffers.len()
    }

    /// Shared vertex buffer with its attribute layout
    pub fn create_vertex_buffer(
        &self,
        data: &[u8],
        usage: BufferUsage,
        layout: impl IntoIterator<Item = VertexAttribute>,
    ) -> Result<Rc<VertexBuffer>> {
        let buffer = VertexBuffer::new(&self.gpu, data, usage)?.with_layout(layout)?;
        Ok(Rc::new(buffer))
    }

    /// Shared 32-bit index buffer
    pub fn create_index_buffer(&self, indices: &[u32], usage: BufferUsage) -> Result<Rc<IndexBuffer>> {
        Ok(Rc::new(IndexBuffer::new(&self.gpu, indices, usage)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::device::ShaderStage;
    use crate::graphics::headless::HeadlessDevice;
    use std::cell::Cell;
    use std::path::PathBuf;

    const VERTEX: &str = "uniform mat4 v_modelMatrix;";
    const FRAGMENT: &str = "uniform float f_opacity;";

    /// Decoder returning a fixed image and counting calls
    struct FixedDecoder {
        image: DecodedImage,
        calls: Rc<Cell<usize>>,
    }

    impl ImageDecoder for FixedDecoder {
        fn decode(&self, _path: &Path, _flip: bool) -> Result<DecodedImage> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.image.clone())
        }
    }

    fn cache_with(image: DecodedImage) -> (Rc<HeadlessDevice>, ResourceCache, Rc<Cell<usize>>) {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();
        let calls = Rc::new(Cell::new(0));
        let decoder = FixedDecoder {
            image,
            calls: calls.clone(),
        };
        (device, ResourceCache::with_decoder(&gpu, Box::new(decoder)), calls)
    }

    #[test]
    fn test_duplicate_shader_load_is_noop() {
        let (device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        cache.load_shader_from_source("Geometry", VERTEX, FRAGMENT).unwrap();
        let first = cache.get_shader("Geometry").unwrap();

        // Would fail to compile if it were evaluated
        device.queue_compile_log(ShaderStage::Vertex, "error");
        cache.load_shader_from_source("Geometry", "", "").unwrap();

        assert!(Rc::ptr_eq(&first, &cache.get_shader("Geometry").unwrap()));
        assert_eq!(cache.shader_count(), 1);
        assert_eq!(device.live_programs(), 1);
    }

    #[test]
    fn test_duplicate_file_shader_load_reads_nothing() {
        let (_device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        cache.load_shader_from_source("Geometry", VERTEX, FRAGMENT).unwrap();

        let missing = PathBuf::from("no/such/shader.vert");
        cache.load_shader("Geometry", &missing, &missing).unwrap();
        assert!(cache.contains_shader("Geometry"));
    }

    #[test]
    fn test_missing_shader_is_error() {
        let (_device, cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        let err = cache.get_shader("Nope").unwrap_err();
        assert!(matches!(err, EngineError::ShaderNotFound { ref id } if id == "Nope"));
    }

    #[test]
    fn test_texture_loaded_once() {
        let (_device, mut cache, calls) = cache_with(DecodedImage::solid(8, 4, [1, 2, 3, 4]));
        cache.load_texture("Grass", "grass.png", true, true).unwrap();
        cache.load_texture("Grass", "other.png", false, false).unwrap();

        assert_eq!(calls.get(), 1);
        let texture = cache.get_texture("Grass").unwrap();
        assert_eq!(texture.size(), glam::UVec2::new(8, 4));
        assert!(Rc::ptr_eq(&texture, &cache.get_texture("Grass").unwrap()));
    }

    #[test]
    fn test_texture_miss_returns_none() {
        let (_device, cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        assert!(cache.get_texture("Missing").is_none());
    }

    #[test]
    fn test_unsupported_channels_not_stored() {
        let gray = DecodedImage::new(2, 2, 1, vec![0; 4]);
        let (device, mut cache, _) = cache_with(gray);

        let err = cache.load_texture("Gray", "gray.png", false, false).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedPixelFormat { channels: 1, .. }));
        assert!(!cache.contains_texture("Gray"));
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_removed_texture_outlives_cache_entry() {
        let (device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        cache.load_texture("Held", "held.png", false, false).unwrap();

        let held = cache.get_texture("Held").unwrap();
        assert!(cache.remove_texture("Held"));
        assert!(!cache.remove_texture("Held"));
        assert_eq!(device.live_textures(), 1);

        drop(held);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_geometry_buffers_require_vertex_buffer() {
        let (_device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        let indices = cache.create_index_buffer(&[0, 1, 2], BufferUsage::StaticDraw).unwrap();

        let err = cache
            .store_geometry_buffers("Broken", None, Some(indices))
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingVertexBuffer { ref id } if id == "Broken"));
        assert!(cache.get_geometry_buffers("Broken").is_none());
    }

    #[test]
    fn test_geometry_buffers_first_store_wins() {
        let (_device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        let first = cache
            .create_vertex_buffer(&[0; 12], BufferUsage::StaticDraw, [])
            .unwrap();
        let second = cache
            .create_vertex_buffer(&[0; 24], BufferUsage::StaticDraw, [])
            .unwrap();

        cache.store_geometry_buffers("Shape", Some(first.clone()), None).unwrap();
        cache.store_geometry_buffers("Shape", Some(second), None).unwrap();

        let stored = cache.get_geometry_buffers("Shape").unwrap();
        assert!(Rc::ptr_eq(&stored.vertex_buffer, &first));
        assert!(stored.index_buffer.is_none());
        assert_eq!(cache.geometry_buffers_count(), 1);
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let (_device, mut cache, _) = cache_with(DecodedImage::solid(1, 1, [0; 4]));
        let err = cache.load_shader_from_source("", VERTEX, FRAGMENT).unwrap_err();
        assert!(matches!(err, EngineError::EmptyIdentifier { namespace: "shader" }));
    }
}
