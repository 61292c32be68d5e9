//! Graphics module
//!
//! GPU-backed resources (buffers, vertex arrays, textures, shader programs)
//! built on the [`GraphicsDevice`] seam, the drawable geometry types, the
//! camera and the renderer.

pub mod buffer;
pub mod camera;
pub mod device;
pub mod geometry;
#[cfg(feature = "gl")]
pub mod gl;
pub mod headless;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod uniforms;
pub mod vertex_array;

// Re-export commonly used types
pub use buffer::{IndexBuffer, VertexAttribute, VertexBuffer};
pub use camera::{Camera, CameraInput, CameraProjection, MovementKeys};
pub use device::{ClearFlags, GraphicsDevice, Gpu};
pub use geometry::{Geometry, GeometryKind, RenderMode, Transform};
#[cfg(feature = "gl")]
pub use gl::GlowDevice;
pub use headless::HeadlessDevice;
pub use lighting::{DirectionalLight, PointLight, SceneLighting, SpotLight};
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use renderer::{RenderStats, Renderer};
pub use shader::ShaderProgram;
pub use texture::{Texture2D, TextureBuffer};
pub use vertex_array::VertexArray;
