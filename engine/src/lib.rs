//! Lumen rendering core
//!
//! This crate provides an OpenGL-style resource cache and renderer: GPU
//! buffers, vertex arrays, textures and shader programs owned by a
//! reference-counted [`assets::ResourceCache`], drawable primitives, a
//! first-person camera and a renderer with optional scene lighting.

pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod graphics;
pub mod shaders;
pub mod time;

// Re-export commonly used types
pub mod prelude {
    // Math types
    pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

    // Asset types
    pub use crate::assets::{DecodedImage, ImageDecoder, ResourceCache};

    // Graphics types
    pub use crate::graphics::{
        Camera, CameraInput, CameraProjection, ClearFlags, Geometry, GeometryKind, Gpu,
        GraphicsDevice, HeadlessDevice, Material, MovementKeys, PointLight, Renderer,
        SceneLighting, SpotLight, Transform,
    };

    #[cfg(feature = "gl")]
    pub use crate::graphics::GlowDevice;

    // Engine types
    pub use crate::config::{AssetConfig, EngineConfig};
    pub use crate::context::RenderContext;
    pub use crate::error::{EngineError, Result};
    pub use crate::time::FixedTimestep;
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
