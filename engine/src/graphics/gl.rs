//! OpenGL backend built on `glow`
//!
//! The caller creates the window and makes its context current, then wraps
//! the loaded [`glow::Context`] in a [`GlowDevice`]. Every call must happen on
//! that context's thread.

use std::fmt;

use glam::{UVec2, Vec4};
use glow::HasContext;
use tracing::debug;

use crate::graphics::buffer::VertexAttribute;
use crate::graphics::device::{
    BufferId, BufferTarget, BufferUsage, ClearFlags, ComponentType, DeviceError,
    GraphicsDevice, InternalFormat, PixelFormat, Primitive, ProgramId, ShaderId, ShaderStage,
    TextureFilter, TextureId, TextureTarget, TextureWrap, UniformLocation, UniformValue,
    VertexArrayId,
};

/// [`GraphicsDevice`] issuing OpenGL 3.3 core calls
pub struct GlowDevice {
    gl: glow::Context,
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDevice").finish_non_exhaustive()
    }
}

impl GlowDevice {
    /// Wraps a context that is current on this thread
    pub fn new(gl: glow::Context) -> Self {
        // SAFETY: the context is current on this thread.
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        debug!(version = %version, "Created OpenGL device");
        Self { gl }
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn component_type(ty: ComponentType) -> u32 {
    match ty {
        ComponentType::Byte => glow::BYTE,
        ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
        ComponentType::Short => glow::SHORT,
        ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
        ComponentType::Int => glow::INT,
        ComponentType::UnsignedInt => glow::UNSIGNED_INT,
        ComponentType::Float => glow::FLOAT,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
    }
}

fn texture_filter(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR as i32,
    }
}

fn texture_wrap(wrap: TextureWrap) -> i32 {
    match wrap {
        TextureWrap::Repeat => glow::REPEAT as i32,
        TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT as i32,
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
    }
}

fn internal_format(format: InternalFormat) -> i32 {
    match format {
        InternalFormat::Rgb8 => glow::RGB8 as i32,
        InternalFormat::Rgba8 => glow::RGBA8 as i32,
        InternalFormat::Srgb8 => glow::SRGB8 as i32,
        InternalFormat::Srgb8Alpha8 => glow::SRGB8_ALPHA8 as i32,
    }
}

fn pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
    }
}

fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn primitive(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Points => glow::POINTS,
        Primitive::Lines => glow::LINES,
        Primitive::LineLoop => glow::LINE_LOOP,
        Primitive::LineStrip => glow::LINE_STRIP,
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

// SAFETY (all blocks below): `GlowDevice::new` requires a context current on
// this thread and `Gpu` is `!Send`, so the context stays current for every
// call. Handles passed in were created by this device.
impl GraphicsDevice for GlowDevice {
    fn create_buffer(
        &self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError> {
        let target = buffer_target(target);
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| DeviceError::new("create_buffer", e))?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, buffer_usage(usage));
            self.gl.bind_buffer(target, None);
            Ok(BufferId(buffer.0))
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>) {
        unsafe {
            self.gl
                .bind_buffer(buffer_target(target), buffer.map(|b| glow::NativeBuffer(b.0)));
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(target), offset as i32, data);
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError> {
        unsafe {
            self.gl
                .create_vertex_array()
                .map(|vao| VertexArrayId(vao.0))
                .map_err(|e| DeviceError::new("create_vertex_array", e))
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)));
        }
    }

    fn configure_attribute(&self, attribute: &VertexAttribute) {
        let size = i32::from(attribute.components);
        let ty = component_type(attribute.component_type);
        let stride = attribute.stride as i32;
        let offset = attribute.offset as i32;
        unsafe {
            self.gl.enable_vertex_attrib_array(attribute.index);
            match attribute.component_type {
                ComponentType::Float => self.gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    size,
                    ty,
                    attribute.normalized,
                    stride,
                    offset,
                ),
                _ if attribute.normalized => self.gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    size,
                    ty,
                    true,
                    stride,
                    offset,
                ),
                _ => self
                    .gl
                    .vertex_attrib_pointer_i32(attribute.index, size, ty, stride, offset),
            }
            self.gl
                .vertex_attrib_divisor(attribute.index, attribute.divisor);
        }
    }

    fn disable_attribute(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0))
        }
    }

    fn create_texture(&self) -> Result<TextureId, DeviceError> {
        unsafe {
            self.gl
                .create_texture()
                .map(|texture| TextureId(texture.0))
                .map_err(|e| DeviceError::new("create_texture", e))
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        unsafe {
            self.gl.bind_texture(
                texture_target(target),
                texture.map(|t| glow::NativeTexture(t.0)),
            );
        }
    }

    fn tex_image_2d(
        &self,
        target: TextureTarget,
        size: UVec2,
        format: InternalFormat,
        pixels_format: PixelFormat,
        pixels: &[u8],
    ) {
        unsafe {
            // Rows of RGB data are not 4-byte aligned in general
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                texture_target(target),
                0,
                internal_format(format),
                size.x as i32,
                size.y as i32,
                0,
                pixel_format(pixels_format),
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    fn tex_sub_image_2d(
        &self,
        target: TextureTarget,
        offset: UVec2,
        size: UVec2,
        format: PixelFormat,
        pixels: &[u8],
    ) {
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_sub_image_2d(
                texture_target(target),
                0,
                offset.x as i32,
                offset.y as i32,
                size.x as i32,
                size.y as i32,
                pixel_format(format),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn set_texture_filter(&self, target: TextureTarget, min: TextureFilter, mag: TextureFilter) {
        let target = texture_target(target);
        unsafe {
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, texture_filter(min));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, texture_filter(mag));
        }
    }

    fn set_texture_wrap(&self, target: TextureTarget, s: TextureWrap, t: TextureWrap) {
        let target = texture_target(target);
        unsafe {
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, texture_wrap(s));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, texture_wrap(t));
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(ShaderId, String), DeviceError> {
        unsafe {
            let shader = self
                .gl
                .create_shader(shader_stage(stage))
                .map_err(|e| DeviceError::new("create_shader", e))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            // Any diagnostic output counts as a failure, warnings included
            let mut log = self.gl.get_shader_info_log(shader);
            if log.trim().is_empty() && !self.gl.get_shader_compile_status(shader) {
                log = format!("{stage} shader failed to compile");
            }
            Ok((ShaderId(shader.0), log))
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn create_program(&self) -> Result<ProgramId, DeviceError> {
        unsafe {
            self.gl
                .create_program()
                .map(|program| ProgramId(program.0))
                .map_err(|e| DeviceError::new("create_program", e))
        }
    }

    fn link_program(&self, program: ProgramId, shaders: &[ShaderId]) -> String {
        let program = glow::NativeProgram(program.0);
        unsafe {
            for shader in shaders {
                self.gl.attach_shader(program, glow::NativeShader(shader.0));
            }
            self.gl.link_program(program);
            for shader in shaders {
                self.gl.detach_shader(program, glow::NativeShader(shader.0));
            }

            let log = self.gl.get_program_info_log(program);
            if log.trim().is_empty() && !self.gl.get_program_link_status(program) {
                return "program failed to link".to_owned();
            }
            log
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat3(m) => {
                    self.gl
                        .uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn set_blending(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
                self.gl
                    .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn clear(&self, flags: ClearFlags, color: Vec4) {
        unsafe {
            self.gl.clear_color(color.x, color.y, color.z, color.w);
            self.gl.clear(clear_mask(flags));
        }
    }

    fn draw_arrays(&self, mode: Primitive, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(primitive(mode), first as i32, count as i32);
        }
    }

    fn draw_elements(&self, mode: Primitive, count: u32) {
        unsafe {
            self.gl
                .draw_elements(primitive(mode), count as i32, glow::UNSIGNED_INT, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_mask() {
        assert_eq!(clear_mask(ClearFlags::empty()), 0);
        assert_eq!(
            clear_mask(ClearFlags::COLOR | ClearFlags::DEPTH),
            glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT
        );
    }

    #[test]
    fn test_srgb_formats_map_to_srgb_storage() {
        assert_eq!(internal_format(InternalFormat::Srgb8), glow::SRGB8 as i32);
        assert_eq!(
            internal_format(InternalFormat::Srgb8Alpha8),
            glow::SRGB8_ALPHA8 as i32
        );
    }

    #[test]
    fn test_fan_topology() {
        assert_eq!(primitive(Primitive::TriangleFan), glow::TRIANGLE_FAN);
    }
}
