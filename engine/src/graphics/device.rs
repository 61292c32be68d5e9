//! Graphics device abstraction
//!
//! [`GraphicsDevice`] is the single seam between the engine and a graphics
//! backend. It mirrors the stateful bind-then-operate model of OpenGL: most
//! operations act on whatever object is currently bound, so callers are
//! responsible for binding order. Every call must happen on the thread that
//! owns the graphics context; the shared [`Gpu`] handle is `Rc`-based and
//! therefore cannot leave that thread.

use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use bitflags::bitflags;
use glam::{Mat3, Mat4, UVec2, Vec2, Vec3, Vec4};

use crate::graphics::buffer::VertexAttribute;

/// Shared handle to the graphics device used by every GPU-backed object
pub type Gpu = Rc<dyn GraphicsDevice>;

macro_rules! backend_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw backend name of the object
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

backend_handle!(
    /// Backend name of a buffer object
    BufferId
);
backend_handle!(
    /// Backend name of a vertex array object
    VertexArrayId
);
backend_handle!(
    /// Backend name of a texture object
    TextureId
);
backend_handle!(
    /// Backend name of a single compiled shader stage
    ShaderId
);
backend_handle!(
    /// Backend name of a linked shader program
    ProgramId
);

/// Resolved location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Error reported by a backend when it cannot create an object
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct DeviceError {
    pub operation: &'static str,
    pub message: String,
}

impl DeviceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Binding point of a buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index data, captured by the bound vertex array
    ElementArray,
}

/// Expected update frequency of a buffer's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// Kind of texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// GPU-side storage format of texture texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalFormat {
    Rgb8,
    Rgba8,
    Srgb8,
    Srgb8Alpha8,
}

impl InternalFormat {
    /// Whether the format stores an alpha channel
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba8 | Self::Srgb8Alpha8)
    }

    /// Whether texels are stored gamma-corrected
    pub const fn is_srgb(self) -> bool {
        matches!(self, Self::Srgb8 | Self::Srgb8Alpha8)
    }
}

/// Layout of the pixel data handed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub const fn channels(self) -> u8 {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Primitive topology used to assemble vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

bitflags! {
    /// Framebuffer attachments cleared by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u8 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Value written to a uniform location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Int(value as i32)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<Mat3> for UniformValue {
    fn from(value: Mat3) -> Self {
        Self::Mat3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// Backend operations required by the engine
///
/// Object creation is fallible; every other call follows the OpenGL model of
/// silently acting on the currently bound object.
pub trait GraphicsDevice: fmt::Debug {
    // Buffers
    fn create_buffer(
        &self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>);
    /// Overwrites part of the buffer bound to `target`
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferId);

    // Vertex arrays
    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);
    /// Enables and configures one attribute slot of the bound vertex array
    fn configure_attribute(&self, attribute: &VertexAttribute);
    /// Disables one attribute slot of the bound vertex array
    fn disable_attribute(&self, index: u32);
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    // Textures
    fn create_texture(&self) -> Result<TextureId, DeviceError>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>);
    /// Allocates and fills level 0 of the bound texture
    fn tex_image_2d(
        &self,
        target: TextureTarget,
        size: UVec2,
        internal_format: InternalFormat,
        format: PixelFormat,
        pixels: &[u8],
    );
    /// Overwrites a region of level 0 of the bound texture
    fn tex_sub_image_2d(
        &self,
        target: TextureTarget,
        offset: UVec2,
        size: UVec2,
        format: PixelFormat,
        pixels: &[u8],
    );
    fn set_texture_filter(&self, target: TextureTarget, min: TextureFilter, mag: TextureFilter);
    fn set_texture_wrap(&self, target: TextureTarget, s: TextureWrap, t: TextureWrap);
    fn delete_texture(&self, texture: TextureId);

    // Shaders
    /// Compiles one stage and returns it together with the backend's info log
    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(ShaderId, String), DeviceError>;
    fn delete_shader(&self, shader: ShaderId);
    fn create_program(&self) -> Result<ProgramId, DeviceError>;
    /// Attaches and links the stages, returning the backend's info log
    fn link_program(&self, program: ProgramId, shaders: &[ShaderId]) -> String;
    fn use_program(&self, program: Option<ProgramId>);
    fn delete_program(&self, program: ProgramId);
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Writes to the bound program; an absent location is a no-op
    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue);

    // Pipeline state and drawing
    fn set_blending(&self, enabled: bool);
    fn set_depth_test(&self, enabled: bool);
    fn clear(&self, flags: ClearFlags, color: Vec4);
    fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32);
    /// Draws `count` 32-bit indices from the bound vertex array's index buffer
    fn draw_elements(&self, primitive: Primitive, count: u32);
}
