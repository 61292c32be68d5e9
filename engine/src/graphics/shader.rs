//! Shader programs
//!
//! A [`ShaderProgram`] compiles a vertex and a fragment stage, links them and
//! caches uniform locations by name. Any diagnostic emitted by the backend,
//! warnings included, is treated as a failure.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::graphics::device::{Gpu, ProgramId, ShaderId, ShaderStage, UniformLocation, UniformValue};

/// Linked vertex and fragment shader pair
#[derive(Debug)]
pub struct ShaderProgram {
    gpu: Gpu,
    id: ProgramId,
    uniform_cache: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl ShaderProgram {
    /// Compile and link a program from GLSL source text
    pub fn from_sources(gpu: &Gpu, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let vertex = compile_stage(gpu, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile_stage(gpu, ShaderStage::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                gpu.delete_shader(vertex);
                return Err(e);
            }
        };

        let program = match gpu.create_program() {
            Ok(program) => program,
            Err(e) => {
                gpu.delete_shader(vertex);
                gpu.delete_shader(fragment);
                return Err(e.into());
            }
        };
        let log = gpu.link_program(program, &[vertex, fragment]);

        gpu.delete_shader(vertex);
        gpu.delete_shader(fragment);

        if !log.is_empty() {
            gpu.delete_program(program);
            return Err(EngineError::ShaderLink { log });
        }

        debug!(program = program.raw(), "Linked shader program");
        Ok(Self {
            gpu: gpu.clone(),
            id: program,
            uniform_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Read both stages from disk, then compile and link them
    pub fn from_files(gpu: &Gpu, vertex_path: &Path, fragment_path: &Path) -> Result<Self> {
        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;
        Self::from_sources(gpu, &vertex_source, &fragment_source)
    }

    /// Location of a uniform, resolved once per name
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return *location;
        }

        let location = self.gpu.uniform_location(self.id, name);
        if location.is_none() {
            trace!(program = self.id.raw(), uniform = name, "Uniform not active in program");
        }
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_owned(), location);
        location
    }

    /// Write a uniform of the bound program; unknown names are ignored
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        let location = self.uniform_location(name);
        self.gpu.set_uniform(location, value.into());
    }

    pub fn bind(&self) {
        self.gpu.use_program(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.use_program(None);
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Number of distinct uniform names looked up so far
    pub fn cached_uniforms(&self) -> usize {
        self.uniform_cache.borrow().len()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        debug!(program = self.id.raw(), "Deleting shader program");
        self.gpu.delete_program(self.id);
    }
}

fn compile_stage(gpu: &Gpu, stage: ShaderStage, source: &str) -> Result<ShaderId> {
    let (shader, log) = gpu.compile_shader(stage, source)?;
    if !log.is_empty() {
        gpu.delete_shader(shader);
        return Err(EngineError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| EngineError::ShaderSourceRead {
        path: path.to_path_buf(),
        source,
    })
}
