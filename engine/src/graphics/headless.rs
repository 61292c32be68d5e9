//! Recording graphics backend without a GPU
//!
//! [`HeadlessDevice`] hands out object names, keeps track of which objects
//! are alive and what is bound, and records every call as a [`GpuCommand`].
//! Uniform names resolve only when every identifier in the name occurs in the
//! program's shader sources, which mimics a driver dropping unknown uniforms.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use glam::{UVec2, Vec4};
use tracing::{trace, warn};

use crate::graphics::buffer::VertexAttribute;
use crate::graphics::device::{
    BufferId, BufferTarget, BufferUsage, ClearFlags, DeviceError, GraphicsDevice, InternalFormat,
    PixelFormat, Primitive, ProgramId, ShaderId, ShaderStage, TextureFilter, TextureId,
    TextureTarget, TextureWrap, UniformLocation, UniformValue, VertexArrayId,
};

/// A single recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateBuffer {
        buffer: BufferId,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    },
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferId>,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        size: usize,
    },
    DeleteBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    ConfigureAttribute(VertexAttribute),
    DisableAttribute(u32),
    DeleteVertexArray(VertexArrayId),
    CreateTexture(TextureId),
    ActiveTexture(u32),
    BindTexture {
        target: TextureTarget,
        texture: Option<TextureId>,
    },
    TexImage2D {
        size: UVec2,
        internal_format: InternalFormat,
        format: PixelFormat,
        bytes: usize,
    },
    TexSubImage2D {
        offset: UVec2,
        size: UVec2,
        format: PixelFormat,
        bytes: usize,
    },
    TextureFilter {
        min: TextureFilter,
        mag: TextureFilter,
    },
    TextureWrap {
        s: TextureWrap,
        t: TextureWrap,
    },
    DeleteTexture(TextureId),
    CompileShader {
        shader: ShaderId,
        stage: ShaderStage,
    },
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    LinkProgram {
        program: ProgramId,
        shaders: Vec<ShaderId>,
    },
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    QueryUniform {
        program: ProgramId,
        name: String,
    },
    SetUniform {
        location: UniformLocation,
        value: UniformValue,
    },
    SetBlending(bool),
    SetDepthTest(bool),
    Clear {
        flags: ClearFlags,
        color: Vec4,
    },
    DrawArrays {
        primitive: Primitive,
        first: u32,
        count: u32,
    },
    DrawElements {
        primitive: Primitive,
        count: u32,
    },
}

impl GpuCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawArrays { .. } | Self::DrawElements { .. })
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_name: u32,
    commands: Vec<GpuCommand>,

    live_buffers: HashSet<BufferId>,
    live_vertex_arrays: HashSet<VertexArrayId>,
    live_textures: HashSet<TextureId>,
    live_shaders: HashSet<ShaderId>,
    live_programs: HashSet<ProgramId>,

    shader_sources: HashMap<ShaderId, String>,
    program_sources: HashMap<ProgramId, String>,
    uniform_locations: HashMap<(ProgramId, String), UniformLocation>,
    uniform_names: HashMap<UniformLocation, String>,
    uniform_values: HashMap<String, UniformValue>,
    uniform_queries: usize,

    bound_program: Option<ProgramId>,
    bound_vertex_array: Option<VertexArrayId>,
    active_unit: u32,
    unit_textures: HashMap<u32, TextureId>,

    pending_compile_logs: HashMap<ShaderStage, String>,
    pending_link_log: Option<String>,
}

impl HeadlessState {
    fn allocate(&mut self) -> NonZeroU32 {
        let name = NonZeroU32::MIN.saturating_add(self.next_name);
        self.next_name += 1;
        name
    }
}

/// Graphics device that records calls instead of talking to a driver
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<HeadlessState>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next compilation of `stage` report `log`
    pub fn queue_compile_log(&self, stage: ShaderStage, log: impl Into<String>) {
        self.state
            .borrow_mut()
            .pending_compile_logs
            .insert(stage, log.into());
    }

    /// Makes the next program link report `log`
    pub fn queue_link_log(&self, log: impl Into<String>) {
        self.state.borrow_mut().pending_link_log = Some(log.into());
    }

    /// Copy of every command recorded so far
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.state.borrow().commands.clone()
    }

    /// Drains the recorded commands
    pub fn take_commands(&self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Recorded draw calls, in issue order
    pub fn draw_calls(&self) -> Vec<GpuCommand> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|command| command.is_draw())
            .cloned()
            .collect()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().live_buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().live_vertex_arrays.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().live_textures.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().live_shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().live_programs.len()
    }

    /// Number of uniform location lookups that reached the device
    pub fn uniform_queries(&self) -> usize {
        self.state.borrow().uniform_queries
    }

    /// Last value written to the uniform called `name`
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        self.state.borrow().uniform_values.get(name).copied()
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.state.borrow().bound_program
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.state.borrow().bound_vertex_array
    }

    /// Texture currently bound to a texture unit
    pub fn texture_on_unit(&self, unit: u32) -> Option<TextureId> {
        self.state.borrow().unit_textures.get(&unit).copied()
    }

    fn record(&self, command: GpuCommand) {
        trace!(?command, "headless command");
        self.state.borrow_mut().commands.push(command);
    }
}

/// Whether every identifier of a uniform name occurs in the shader sources
fn declared_in(source: &str, name: &str) -> bool {
    name.split(|c: char| c == '.' || c == '[' || c == ']')
        .filter(|segment| !segment.is_empty() && !segment.chars().all(|c| c.is_ascii_digit()))
        .all(|segment| source.contains(segment))
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(
        &self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError> {
        let buffer = {
            let mut state = self.state.borrow_mut();
            let buffer = BufferId(state.allocate());
            state.live_buffers.insert(buffer);
            buffer
        };
        self.record(GpuCommand::CreateBuffer {
            buffer,
            target,
            size: data.len(),
            usage,
        });
        Ok(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>) {
        self.record(GpuCommand::BindBuffer { target, buffer });
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.record(GpuCommand::BufferSubData {
            target,
            offset,
            size: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        if !self.state.borrow_mut().live_buffers.remove(&buffer) {
            warn!(buffer = buffer.raw(), "deleting a buffer that is not alive");
        }
        self.record(GpuCommand::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, DeviceError> {
        let vertex_array = {
            let mut state = self.state.borrow_mut();
            let vertex_array = VertexArrayId(state.allocate());
            state.live_vertex_arrays.insert(vertex_array);
            vertex_array
        };
        self.record(GpuCommand::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
        self.record(GpuCommand::BindVertexArray(vertex_array));
    }

    fn configure_attribute(&self, attribute: &VertexAttribute) {
        self.record(GpuCommand::ConfigureAttribute(*attribute));
    }

    fn disable_attribute(&self, index: u32) {
        self.record(GpuCommand::DisableAttribute(index));
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        {
            let mut state = self.state.borrow_mut();
            if !state.live_vertex_arrays.remove(&vertex_array) {
                warn!(
                    vertex_array = vertex_array.raw(),
                    "deleting a vertex array that is not alive"
                );
            }
            if state.bound_vertex_array == Some(vertex_array) {
                state.bound_vertex_array = None;
            }
        }
        self.record(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn create_texture(&self) -> Result<TextureId, DeviceError> {
        let texture = {
            let mut state = self.state.borrow_mut();
            let texture = TextureId(state.allocate());
            state.live_textures.insert(texture);
            texture
        };
        self.record(GpuCommand::CreateTexture(texture));
        Ok(texture)
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
        self.record(GpuCommand::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        {
            let mut state = self.state.borrow_mut();
            let unit = state.active_unit;
            match texture {
                Some(texture) => state.unit_textures.insert(unit, texture),
                None => state.unit_textures.remove(&unit),
            };
        }
        self.record(GpuCommand::BindTexture { target, texture });
    }

    fn tex_image_2d(
        &self,
        _target: TextureTarget,
        size: UVec2,
        internal_format: InternalFormat,
        format: PixelFormat,
        pixels: &[u8],
    ) {
        self.record(GpuCommand::TexImage2D {
            size,
            internal_format,
            format,
            bytes: pixels.len(),
        });
    }

    fn tex_sub_image_2d(
        &self,
        _target: TextureTarget,
        offset: UVec2,
        size: UVec2,
        format: PixelFormat,
        pixels: &[u8],
    ) {
        self.record(GpuCommand::TexSubImage2D {
            offset,
            size,
            format,
            bytes: pixels.len(),
        });
    }

    fn set_texture_filter(&self, _target: TextureTarget, min: TextureFilter, mag: TextureFilter) {
        self.record(GpuCommand::TextureFilter { min, mag });
    }

    fn set_texture_wrap(&self, _target: TextureTarget, s: TextureWrap, t: TextureWrap) {
        self.record(GpuCommand::TextureWrap { s, t });
    }

    fn delete_texture(&self, texture: TextureId) {
        {
            let mut state = self.state.borrow_mut();
            if !state.live_textures.remove(&texture) {
                warn!(texture = texture.raw(), "deleting a texture that is not alive");
            }
            state.unit_textures.retain(|_, bound| *bound != texture);
        }
        self.record(GpuCommand::DeleteTexture(texture));
    }

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(ShaderId, String), DeviceError> {
        let (shader, log) = {
            let mut state = self.state.borrow_mut();
            let shader = ShaderId(state.allocate());
            state.live_shaders.insert(shader);
            state.shader_sources.insert(shader, source.to_owned());
            let log = state.pending_compile_logs.remove(&stage).unwrap_or_default();
            (shader, log)
        };
        self.record(GpuCommand::CompileShader { shader, stage });
        Ok((shader, log))
    }

    fn delete_shader(&self, shader: ShaderId) {
        {
            let mut state = self.state.borrow_mut();
            if !state.live_shaders.remove(&shader) {
                warn!(shader = shader.raw(), "deleting a shader that is not alive");
            }
            state.shader_sources.remove(&shader);
        }
        self.record(GpuCommand::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<ProgramId, DeviceError> {
        let program = {
            let mut state = self.state.borrow_mut();
            let program = ProgramId(state.allocate());
            state.live_programs.insert(program);
            program
        };
        self.record(GpuCommand::CreateProgram(program));
        Ok(program)
    }

    fn link_program(&self, program: ProgramId, shaders: &[ShaderId]) -> String {
        let log = {
            let mut state = self.state.borrow_mut();
            let combined = shaders
                .iter()
                .filter_map(|shader| state.shader_sources.get(shader))
                .fold(String::new(), |mut acc, source| {
                    acc.push_str(source);
                    acc.push('\n');
                    acc
                });
            state.program_sources.insert(program, combined);
            state.pending_link_log.take().unwrap_or_default()
        };
        self.record(GpuCommand::LinkProgram {
            program,
            shaders: shaders.to_vec(),
        });
        log
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.state.borrow_mut().bound_program = program;
        self.record(GpuCommand::UseProgram(program));
    }

    fn delete_program(&self, program: ProgramId) {
        {
            let mut state = self.state.borrow_mut();
            if !state.live_programs.remove(&program) {
                warn!(program = program.raw(), "deleting a program that is not alive");
            }
            state.program_sources.remove(&program);
            if state.bound_program == Some(program) {
                state.bound_program = None;
            }
        }
        self.record(GpuCommand::DeleteProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let location = {
            let mut state = self.state.borrow_mut();
            state.uniform_queries += 1;

            let key = (program, name.to_owned());
            if let Some(location) = state.uniform_locations.get(&key).copied() {
                Some(location)
            } else {
                let declared = state
                    .program_sources
                    .get(&program)
                    .is_some_and(|source| declared_in(source, name));
                if declared {
                    let location = UniformLocation(state.allocate().get());
                    state.uniform_locations.insert(key, location);
                    state.uniform_names.insert(location, name.to_owned());
                    Some(location)
                } else {
                    None
                }
            }
        };
        self.record(GpuCommand::QueryUniform {
            program,
            name: name.to_owned(),
        });
        location
    }

    fn set_uniform(&self, location: Option<UniformLocation>, value: UniformValue) {
        let Some(location) = location else {
            return;
        };
        {
            let mut state = self.state.borrow_mut();
            if let Some(name) = state.uniform_names.get(&location).cloned() {
                state.uniform_values.insert(name, value);
            }
        }
        self.record(GpuCommand::SetUniform { location, value });
    }

    fn set_blending(&self, enabled: bool) {
        self.record(GpuCommand::SetBlending(enabled));
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(GpuCommand::SetDepthTest(enabled));
    }

    fn clear(&self, flags: ClearFlags, color: Vec4) {
        self.record(GpuCommand::Clear { flags, color });
    }

    fn draw_arrays(&self, primitive: Primitive, first: u32, count: u32) {
        self.record(GpuCommand::DrawArrays {
            primitive,
            first,
            count,
        });
    }

    fn draw_elements(&self, primitive: Primitive, count: u32) {
        self.record(GpuCommand::DrawElements { primitive, count });
    }
}
