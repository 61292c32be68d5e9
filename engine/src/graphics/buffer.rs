//! Vertex and index buffer objects
//!
//! Both buffer kinds own exactly one backend buffer and release it when
//! dropped. They are move-only; shared ownership goes through `Rc`.

use bytemuck::Pod;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::graphics::device::{BufferId, BufferTarget, BufferUsage, ComponentType, Gpu};

/// How one shader attribute is sourced from an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader attribute location
    pub index: u32,
    pub component_type: ComponentType,
    /// Components per vertex, 1 to 4
    pub components: u8,
    /// Distance in bytes between consecutive vertices
    pub stride: usize,
    /// Offset in bytes of the first component
    pub offset: usize,
    /// Instances drawn per attribute advance, 0 for per-vertex data
    pub divisor: u32,
    pub normalized: bool,
}

impl VertexAttribute {
    /// Per-vertex float attribute
    pub const fn float(index: u32, components: u8, stride: usize, offset: usize) -> Self {
        Self {
            index,
            component_type: ComponentType::Float,
            components,
            stride,
            offset,
            divisor: 0,
            normalized: false,
        }
    }

    pub const fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    pub const fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    /// Bytes read per vertex for this attribute
    pub const fn size_bytes(&self) -> usize {
        self.components as usize * self.component_type.size_bytes()
    }
}

/// Backend buffer shared by both buffer kinds
#[derive(Debug)]
struct RawBuffer {
    gpu: Gpu,
    id: BufferId,
    target: BufferTarget,
    size: usize,
    usage: BufferUsage,
}

impl RawBuffer {
    fn new(gpu: &Gpu, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<Self> {
        let id = gpu.create_buffer(target, data, usage)?;
        debug!(buffer = id.raw(), ?target, size = data.len(), "Created buffer");
        Ok(Self {
            gpu: gpu.clone(),
            id,
            target,
            size: data.len(),
            usage,
        })
    }

    fn modify_data(&self, offset: usize, data: &[u8]) {
        debug_assert!(
            offset + data.len() <= self.size,
            "buffer write of {} bytes at {offset} overruns a {} byte buffer",
            data.len(),
            self.size
        );
        self.gpu.bind_buffer(self.target, Some(self.id));
        self.gpu.buffer_sub_data(self.target, offset, data);
        self.gpu.bind_buffer(self.target, None);
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        debug!(buffer = self.id.raw(), "Deleting buffer");
        self.gpu.delete_buffer(self.id);
    }
}

/// Vertex data buffer with its attribute layout
#[derive(Debug)]
pub struct VertexBuffer {
    buffer: RawBuffer,
    layout: Vec<VertexAttribute>,
}

impl VertexBuffer {
    /// Create a vertex buffer holding `data`
    pub fn new(gpu: &Gpu, data: &[u8], usage: BufferUsage) -> Result<Self> {
        Ok(Self {
            buffer: RawBuffer::new(gpu, BufferTarget::Array, data, usage)?,
            layout: Vec::new(),
        })
    }

    /// Create a vertex buffer from plain-old-data vertices
    pub fn from_vertices<T: Pod>(gpu: &Gpu, vertices: &[T], usage: BufferUsage) -> Result<Self> {
        Self::new(gpu, bytemuck::cast_slice(vertices), usage)
    }

    /// Append an attribute description
    ///
    /// Attribute indices must be unique and each attribute must fit inside
    /// its stride. A zero stride means tightly packed.
    pub fn push_layout(&mut self, attribute: VertexAttribute) -> Result<()> {
        let size = attribute.size_bytes();
        if attribute.stride != 0 && attribute.offset + size > attribute.stride {
            return Err(EngineError::AttributeExceedsStride {
                index: attribute.index,
                offset: attribute.offset,
                size,
                stride: attribute.stride,
            });
        }
        if self.layout.iter().any(|a| a.index == attribute.index) {
            return Err(EngineError::AttributeIndexCollision {
                index: attribute.index,
            });
        }
        self.layout.push(attribute);
        Ok(())
    }

    /// Builder form of [`push_layout`](Self::push_layout)
    pub fn with_layout(
        mut self,
        attributes: impl IntoIterator<Item = VertexAttribute>,
    ) -> Result<Self> {
        for attribute in attributes {
            self.push_layout(attribute)?;
        }
        Ok(self)
    }

    /// Overwrite `data.len()` bytes starting at `offset`
    pub fn modify_data(&self, offset: usize, data: &[u8]) {
        self.buffer.modify_data(offset, data);
    }

    pub fn bind(&self) {
        self.buffer.gpu.bind_buffer(BufferTarget::Array, Some(self.buffer.id));
    }

    pub fn unbind(&self) {
        self.buffer.gpu.bind_buffer(BufferTarget::Array, None);
    }

    pub fn layout(&self) -> &[VertexAttribute] {
        &self.layout
    }

    pub fn id(&self) -> BufferId {
        self.buffer.id
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.buffer.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.buffer.usage
    }
}

/// 32-bit index buffer
#[derive(Debug)]
pub struct IndexBuffer {
    buffer: RawBuffer,
}

impl IndexBuffer {
    pub fn new(gpu: &Gpu, indices: &[u32], usage: BufferUsage) -> Result<Self> {
        Ok(Self {
            buffer: RawBuffer::new(
                gpu,
                BufferTarget::ElementArray,
                bytemuck::cast_slice(indices),
                usage,
            )?,
        })
    }

    /// Overwrite `data.len()` bytes starting at `offset`
    pub fn modify_data(&self, offset: usize, data: &[u8]) {
        self.buffer.modify_data(offset, data);
    }

    pub fn bind(&self) {
        self.buffer
            .gpu
            .bind_buffer(BufferTarget::ElementArray, Some(self.buffer.id));
    }

    pub fn unbind(&self) {
        self.buffer.gpu.bind_buffer(BufferTarget::ElementArray, None);
    }

    pub fn id(&self) -> BufferId {
        self.buffer.id
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.buffer.size
    }

    /// Number of indices stored
    pub fn count(&self) -> u32 {
        (self.buffer.size / std::mem::size_of::<u32>()) as u32
    }

    pub fn usage(&self) -> BufferUsage {
        self.buffer.usage
    }
}
