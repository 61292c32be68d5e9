//! Vertex array objects

use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::graphics::buffer::{IndexBuffer, VertexBuffer};
use crate::graphics::device::{BufferTarget, Gpu, VertexArrayId};

/// Binds a vertex buffer, its layout and an optional index buffer into one
/// drawable unit
///
/// The attached buffers are kept alive for as long as they are attached.
#[derive(Debug)]
pub struct VertexArray {
    gpu: Gpu,
    id: VertexArrayId,
    vertex_buffer: Option<Rc<VertexBuffer>>,
    index_buffer: Option<Rc<IndexBuffer>>,
    enabled_attributes: Vec<u32>,
}

impl VertexArray {
    pub fn new(gpu: &Gpu) -> Result<Self> {
        let id = gpu.create_vertex_array()?;
        debug!(vertex_array = id.raw(), "Created vertex array");
        Ok(Self {
            gpu: gpu.clone(),
            id,
            vertex_buffer: None,
            index_buffer: None,
            enabled_attributes: Vec::new(),
        })
    }

    /// Attach buffers and configure every attribute of the vertex buffer's
    /// layout, replacing any previous configuration
    ///
    /// The vertex array is unbound before the buffers so the element buffer
    /// binding stays recorded in it. Without an index buffer the element
    /// binding is cleared while the vertex array is bound, and slots enabled
    /// by a previous layout but absent from this one are disabled.
    pub fn attach_buffers(
        &mut self,
        vertex_buffer: Rc<VertexBuffer>,
        index_buffer: Option<Rc<IndexBuffer>>,
    ) {
        self.bind();
        vertex_buffer.bind();
        match &index_buffer {
            Some(index_buffer) => index_buffer.bind(),
            None => self.gpu.bind_buffer(BufferTarget::ElementArray, None),
        }

        let layout = vertex_buffer.layout();
        for &index in &self.enabled_attributes {
            if !layout.iter().any(|a| a.index == index) {
                self.gpu.disable_attribute(index);
            }
        }
        for attribute in layout {
            self.gpu.configure_attribute(attribute);
        }
        self.enabled_attributes = layout.iter().map(|a| a.index).collect();

        self.unbind();
        vertex_buffer.unbind();
        if let Some(index_buffer) = &index_buffer {
            index_buffer.unbind();
        }

        debug!(
            vertex_array = self.id.raw(),
            vertex_buffer = vertex_buffer.id().raw(),
            indexed = index_buffer.is_some(),
            attributes = vertex_buffer.layout().len(),
            "Attached buffers to vertex array"
        );

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = index_buffer;
    }

    pub fn bind(&self) {
        self.gpu.bind_vertex_array(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_vertex_array(None);
    }

    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    pub fn vertex_buffer(&self) -> Option<&Rc<VertexBuffer>> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&Rc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        debug!(vertex_array = self.id.raw(), "Deleting vertex array");
        self.gpu.delete_vertex_array(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::buffer::VertexAttribute;
    use crate::graphics::device::BufferUsage;
    use crate::graphics::headless::{GpuCommand, HeadlessDevice};

    #[test]
    fn test_attach_binding_order() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let vbo = VertexBuffer::new(&gpu, &[0u8; 80], BufferUsage::StaticDraw)
            .unwrap()
            .with_layout([
                VertexAttribute::float(0, 3, 20, 0),
                VertexAttribute::float(1, 2, 20, 12),
            ])
            .unwrap();
        let vbo = Rc::new(vbo);
        let ibo = Rc::new(IndexBuffer::new(&gpu, &[0, 1, 2, 0, 2, 3], BufferUsage::StaticDraw).unwrap());
        let mut vao = VertexArray::new(&gpu).unwrap();
        device.take_commands();

        vao.attach_buffers(vbo.clone(), Some(ibo.clone()));

        assert_eq!(
            device.take_commands(),
            vec![
                GpuCommand::BindVertexArray(Some(vao.id())),
                GpuCommand::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: Some(vbo.id()),
                },
                GpuCommand::BindBuffer {
                    target: BufferTarget::ElementArray,
                    buffer: Some(ibo.id()),
                },
                GpuCommand::ConfigureAttribute(VertexAttribute::float(0, 3, 20, 0)),
                GpuCommand::ConfigureAttribute(VertexAttribute::float(1, 2, 20, 12)),
                GpuCommand::BindVertexArray(None),
                GpuCommand::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: None,
                },
                GpuCommand::BindBuffer {
                    target: BufferTarget::ElementArray,
                    buffer: None,
                },
            ]
        );
    }

    #[test]
    fn test_vertex_array_keeps_buffers_alive() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let vbo = Rc::new(VertexBuffer::new(&gpu, &[0u8; 12], BufferUsage::StaticDraw).unwrap());
        let mut vao = VertexArray::new(&gpu).unwrap();
        vao.attach_buffers(vbo.clone(), None);
        drop(vbo);
        assert_eq!(device.live_buffers(), 1);

        drop(vao);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_vertex_arrays(), 0);
    }

    #[test]
    fn test_reattach_replaces_buffers() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let first = Rc::new(VertexBuffer::new(&gpu, &[0u8; 12], BufferUsage::StaticDraw).unwrap());
        let second = Rc::new(VertexBuffer::new(&gpu, &[0u8; 24], BufferUsage::StaticDraw).unwrap());
        let mut vao = VertexArray::new(&gpu).unwrap();

        vao.attach_buffers(first.clone(), None);
        vao.attach_buffers(second.clone(), None);

        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(vao.vertex_buffer().map(|b| b.id()), Some(second.id()));
    }

    #[test]
    fn test_reattach_clears_previous_state() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let wide = VertexBuffer::new(&gpu, &[0u8; 80], BufferUsage::StaticDraw)
            .unwrap()
            .with_layout([
                VertexAttribute::float(0, 3, 20, 0),
                VertexAttribute::float(1, 2, 20, 12),
            ])
            .unwrap();
        let narrow = VertexBuffer::new(&gpu, &[0u8; 48], BufferUsage::StaticDraw)
            .unwrap()
            .with_layout([VertexAttribute::float(0, 3, 12, 0)])
            .unwrap();
        let narrow = Rc::new(narrow);
        let ibo = Rc::new(IndexBuffer::new(&gpu, &[0, 1, 2], BufferUsage::StaticDraw).unwrap());
        let mut vao = VertexArray::new(&gpu).unwrap();

        vao.attach_buffers(Rc::new(wide), Some(ibo.clone()));
        device.take_commands();
        vao.attach_buffers(narrow.clone(), None);

        assert_eq!(Rc::strong_count(&ibo), 1);
        assert!(vao.index_buffer().is_none());
        assert_eq!(
            device.take_commands(),
            vec![
                GpuCommand::BindVertexArray(Some(vao.id())),
                GpuCommand::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: Some(narrow.id()),
                },
                GpuCommand::BindBuffer {
                    target: BufferTarget::ElementArray,
                    buffer: None,
                },
                GpuCommand::DisableAttribute(1),
                GpuCommand::ConfigureAttribute(VertexAttribute::float(0, 3, 12, 0)),
                GpuCommand::BindVertexArray(None),
                GpuCommand::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: None,
                },
            ]
        );
    }
}
