//! Main renderer implementation
//!
//! The [`Renderer`] draws one [`Geometry`] at a time. Every call selects the
//! lit or unlit built-in program, uploads transform, material and light
//! uniforms, binds the material textures and the vertex array, and issues a
//! single draw.

use std::cell::Cell;

use glam::{Mat3, Vec4};
use tracing::{debug, info, warn};

use crate::assets::cache::ResourceCache;
use crate::error::Result;
use crate::graphics::camera::CameraProjection;
use crate::graphics::device::{ClearFlags, Gpu};
use crate::graphics::geometry::{Geometry, RenderMode};
use crate::graphics::lighting::{SceneLighting, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
use crate::graphics::material::{
    Material, DIFFUSE_TEXTURE_UNIT, EMISSION_TEXTURE_UNIT, SPECULAR_TEXTURE_UNIT,
};
use crate::graphics::shader::ShaderProgram;
use crate::graphics::uniforms::{self, global_light, light_field};
use crate::shaders;

/// Counters for the frame started by the last [`Renderer::clear`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
}

/// Draws geometries through the built-in shader programs
#[derive(Debug)]
pub struct Renderer {
    gpu: Gpu,
    draw_calls: Cell<u32>,
    /// Set once a frame dropped lights beyond the shader arrays
    light_overflow_reported: Cell<bool>,
}

impl Renderer {
    pub fn new(gpu: &Gpu) -> Self {
        Self {
            gpu: gpu.clone(),
            draw_calls: Cell::new(0),
            light_overflow_reported: Cell::new(false),
        }
    }

    /// Enables alpha blending and depth testing and loads the built-in
    /// programs into `cache`
    pub fn init(&self, cache: &mut ResourceCache) -> Result<()> {
        self.gpu.set_blending(true);
        self.gpu.set_depth_test(true);

        cache.load_shader_from_source(
            shaders::UNLIT_SHADER_ID,
            shaders::UNLIT_VERTEX,
            shaders::UNLIT_FRAGMENT,
        )?;
        cache.load_shader_from_source(
            shaders::LIT_SHADER_ID,
            shaders::LIT_VERTEX,
            shaders::LIT_FRAGMENT,
        )?;

        info!("Renderer initialized");
        Ok(())
    }

    /// Clears the selected framebuffer planes and starts a new frame
    pub fn clear(&self, flags: ClearFlags, color: Vec4) {
        self.gpu.clear(flags, color);
        self.draw_calls.set(0);
    }

    /// Draws `geometry` as seen by `camera`
    ///
    /// Passing `lighting` switches to the lit program and uploads the normal
    /// matrix, the camera position and every light.
    pub fn render(
        &self,
        cache: &ResourceCache,
        camera: &dyn CameraProjection,
        geometry: &Geometry,
        lighting: Option<&SceneLighting>,
    ) -> Result<()> {
        let shader_id = if lighting.is_some() {
            shaders::LIT_SHADER_ID
        } else {
            shaders::UNLIT_SHADER_ID
        };
        let shader = cache.get_shader(shader_id)?;
        shader.bind();

        let model = geometry.compute_model_matrix();
        shader.set_uniform(uniforms::MODEL_MATRIX, model);
        shader.set_uniform(uniforms::CAMERA_MATRIX, camera.view_projection_matrix());

        Self::upload_material(&shader, geometry.material());

        if let Some(lighting) = lighting {
            let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
            shader.set_uniform(uniforms::NORMAL_MATRIX, normal_matrix);
            shader.set_uniform(uniforms::CAMERA_POSITION, camera.position());
            self.upload_lighting(&shader, lighting);
        }

        geometry.vertex_array().bind();

        match geometry.render_mode() {
            RenderMode::Arrays => self.gpu.draw_arrays(geometry.primitive(), 0, geometry.count()),
            RenderMode::Elements => self.gpu.draw_elements(geometry.primitive(), geometry.count()),
        }
        self.draw_calls.set(self.draw_calls.get() + 1);

        debug!(
            shader = shader_id,
            count = geometry.count(),
            mode = ?geometry.render_mode(),
            "Rendered geometry"
        );
        Ok(())
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            draw_calls: self.draw_calls.get(),
        }
    }

    fn upload_material(shader: &ShaderProgram, material: &Material) {
        shader.set_uniform(uniforms::material::DIFFUSE_COLOR, material.diffuse_color);
        shader.set_uniform(uniforms::material::OPACITY, material.opacity);
        shader.set_uniform(uniforms::material::AMBIENT_COLOR, material.ambient_color);
        shader.set_uniform(uniforms::material::SPECULAR_COLOR, material.specular_color);
        shader.set_uniform(uniforms::material::EMISSION_COLOR, material.emission_color);
        shader.set_uniform(uniforms::material::SHININESS, material.shininess);

        shader.set_uniform(
            uniforms::material::ENABLE_DIFFUSE_TEXTURE,
            material.diffuse_texture_enabled(),
        );
        shader.set_uniform(
            uniforms::material::ENABLE_SPECULAR_TEXTURE,
            material.specular_texture_enabled(),
        );
        shader.set_uniform(
            uniforms::material::ENABLE_EMISSION_TEXTURE,
            material.emission_texture_enabled(),
        );

        for (unit, texture) in material.texture_slots() {
            let sampler = match unit {
                DIFFUSE_TEXTURE_UNIT => uniforms::material::DIFFUSE_TEXTURE,
                SPECULAR_TEXTURE_UNIT => uniforms::material::SPECULAR_TEXTURE,
                EMISSION_TEXTURE_UNIT => uniforms::material::EMISSION_TEXTURE,
                _ => continue,
            };
            shader.set_uniform(sampler, unit as i32);
            texture.bind_to_unit(unit);
        }
    }

    fn upload_lighting(&self, shader: &ShaderProgram, lighting: &SceneLighting) {
        let global = &lighting.global_light;
        shader.set_uniform(global_light::DIRECTION, global.direction);
        shader.set_uniform(global_light::AMBIENT_INTENSITY, global.ambient_intensity);
        shader.set_uniform(global_light::DIFFUSE_INTENSITY, global.diffuse_intensity);
        shader.set_uniform(global_light::SPECULAR_INTENSITY, global.specular_intensity);
        shader.set_uniform(global_light::ENABLED, global.enabled);

        if (lighting.point_lights.len() > MAX_POINT_LIGHTS
            || lighting.spot_lights.len() > MAX_SPOT_LIGHTS)
            && !self.light_overflow_reported.replace(true)
        {
            warn!(
                point_lights = lighting.point_lights.len(),
                spot_lights = lighting.spot_lights.len(),
                max_point = MAX_POINT_LIGHTS,
                max_spot = MAX_SPOT_LIGHTS,
                "Scene has more lights than the shader supports, extra lights are ignored"
            );
        }

        let points = &lighting.point_lights[..lighting.point_lights.len().min(MAX_POINT_LIGHTS)];
        shader.set_uniform(uniforms::POINT_LIGHT_COUNT, points.len() as i32);
        for (i, light) in points.iter().enumerate() {
            let field = |name| uniforms::point_light(i, name);
            shader.set_uniform(&field(light_field::POSITION), light.position);
            shader.set_uniform(&field(light_field::AMBIENT_INTENSITY), light.ambient_intensity);
            shader.set_uniform(&field(light_field::DIFFUSE_INTENSITY), light.diffuse_intensity);
            shader.set_uniform(&field(light_field::SPECULAR_INTENSITY), light.specular_intensity);
            shader.set_uniform(&field(light_field::CONSTANT), light.constant);
            shader.set_uniform(&field(light_field::LINEAR), light.linear);
            shader.set_uniform(&field(light_field::QUADRATIC), light.quadratic);
            shader.set_uniform(&field(light_field::ENABLED), light.enabled);
        }

        let spots = &lighting.spot_lights[..lighting.spot_lights.len().min(MAX_SPOT_LIGHTS)];
        shader.set_uniform(uniforms::SPOT_LIGHT_COUNT, spots.len() as i32);
        for (i, light) in spots.iter().enumerate() {
            let field = |name| uniforms::spot_light(i, name);
            let (inner, outer) = light.cutoff_cosines();
            shader.set_uniform(&field(light_field::POSITION), light.position);
            shader.set_uniform(&field(light_field::DIRECTION), light.direction);
            shader.set_uniform(&field(light_field::AMBIENT_INTENSITY), light.ambient_intensity);
            shader.set_uniform(&field(light_field::DIFFUSE_INTENSITY), light.diffuse_intensity);
            shader.set_uniform(&field(light_field::SPECULAR_INTENSITY), light.specular_intensity);
            shader.set_uniform(&field(light_field::CONSTANT), light.constant);
            shader.set_uniform(&field(light_field::LINEAR), light.linear);
            shader.set_uniform(&field(light_field::QUADRATIC), light.quadratic);
            shader.set_uniform(&field(light_field::INNER_CUTOFF), inner);
            shader.set_uniform(&field(light_field::OUTER_CUTOFF), outer);
            shader.set_uniform(&field(light_field::ENABLED), light.enabled);
        }
    }
}
