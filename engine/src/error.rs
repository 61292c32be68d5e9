//! Engine error types
//!
//! Every fatal condition in the engine surfaces as an [`EngineError`] and is
//! propagated with `?` up to the caller's top-level handler. Recoverable
//! conditions (duplicate registration, texture/geometry lookup misses) are
//! reported through `tracing` warnings instead.

use std::path::PathBuf;

use crate::graphics::device::{DeviceError, ShaderStage};

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Fatal engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program linkage failed: {log}")]
    ShaderLink { log: String },

    #[error("failed to read shader source at path: {}", path.display())]
    ShaderSourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no shader exists with the ID \"{id}\"")]
    ShaderNotFound { id: String },

    #[error("the channel format ({channels} channels) of the texture image at path: {}, is not supported", path.display())]
    UnsupportedPixelFormat { path: PathBuf, channels: u8 },

    #[error("failed to load the texture image at path: {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("pixel data holds {actual} bytes but {expected} are required")]
    PixelDataSize { expected: usize, actual: usize },

    #[error("no vertex buffer was given for geometry assigned with ID \"{id}\"")]
    MissingVertexBuffer { id: String },

    #[error("vertex attribute index {index} is already used by this buffer")]
    AttributeIndexCollision { index: u32 },

    #[error("vertex attribute {index} reads past its {stride} byte stride (offset {offset}, {size} bytes)")]
    AttributeExceedsStride {
        index: u32,
        offset: usize,
        size: usize,
        stride: usize,
    },

    #[error("resource identifiers must not be empty ({namespace})")]
    EmptyIdentifier { namespace: &'static str },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
