//! Drawable shapes
//!
//! A [`Geometry`] pairs a transform and a material with a vertex array over
//! shared buffers. The buffers for each [`GeometryKind`] are created once and
//! stored in the [`ResourceCache`]; every further geometry of that kind only
//! creates its own vertex array over them.

use std::mem;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::cache::{GeometryBuffers, ResourceCache};
use crate::error::Result;
use crate::graphics::device::{BufferUsage, Primitive};
use crate::graphics::material::Material;
use crate::graphics::mesh::{Mesh, Vertex};
use crate::graphics::texture::Texture2D;
use crate::graphics::vertex_array::VertexArray;

/// Fan segments of [`GeometryKind::circle`]
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 32;

/// Placement of a drawable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    /// Non-uniform scale
    pub size: Vec3,
    pub rotation_axis: Vec3,
    /// Rotation around `rotation_axis` in degrees
    pub rotation_angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec3::ONE,
            rotation_axis: Vec3::ONE,
            rotation_angle: 0.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// `scale * rotate * translate`
    ///
    /// Vertices are translated first, then rotated and scaled about the
    /// origin, so the position itself is rotated and scaled. A zero rotation
    /// axis means no rotation.
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = match self.rotation_axis.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, self.rotation_angle.to_radians()),
            None => Mat4::IDENTITY,
        };
        Mat4::from_scale(self.size) * rotation * Mat4::from_translation(self.position)
    }
}

/// Which draw call a geometry needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Draw `count` vertices in order
    Arrays,
    /// Draw `count` indices from the index buffer
    Elements,
}

/// Built-in shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Square,
    Triangle,
    Circle { segments: u32 },
    Cube,
}

impl GeometryKind {
    pub const fn circle() -> Self {
        Self::Circle {
            segments: DEFAULT_CIRCLE_SEGMENTS,
        }
    }

    /// Identifier of this shape's buffers in the resource cache
    pub fn cache_id(&self) -> String {
        match self {
            Self::Square => "Square".to_owned(),
            Self::Triangle => "Triangle".to_owned(),
            Self::Circle { segments } => format!("Circle-{segments}"),
            Self::Cube => "Cube".to_owned(),
        }
    }

    pub fn mesh(&self) -> Mesh {
        match *self {
            Self::Square => Mesh::square(),
            Self::Triangle => Mesh::triangle(),
            Self::Circle { segments } => Mesh::circle(segments),
            Self::Cube => Mesh::cube(1.0),
        }
    }
}

/// A shape instance ready to be rendered
#[derive(Debug)]
pub struct Geometry {
    kind: GeometryKind,
    transform: Transform,
    material: Material,
    render_mode: RenderMode,
    primitive: Primitive,
    count: u32,
    vertex_array: VertexArray,
}

impl Geometry {
    /// Build a geometry, uploading the shape's buffers on first use
    pub fn new(
        kind: GeometryKind,
        transform: Transform,
        material: Material,
        cache: &mut ResourceCache,
    ) -> Result<Self> {
        let id = kind.cache_id();
        let mesh = kind.mesh();
        let cached = if cache.contains_geometry_buffers(&id) {
            cache.get_geometry_buffers(&id)
        } else {
            None
        };
        let buffers = match cached {
            Some(buffers) => buffers,
            None => {
                let vertex_buffer = cache.create_vertex_buffer(
                    bytemuck::cast_slice(&mesh.vertices),
                    BufferUsage::StaticDraw,
                    Vertex::layout(),
                )?;
                let index_buffer = if mesh.is_indexed() {
                    Some(cache.create_index_buffer(&mesh.indices, BufferUsage::StaticDraw)?)
                } else {
                    None
                };
                cache.store_geometry_buffers(
                    &id,
                    Some(vertex_buffer.clone()),
                    index_buffer.clone(),
                )?;
                debug!(id = %id, vertices = mesh.vertices.len(), "Uploaded geometry buffers");
                GeometryBuffers {
                    vertex_buffer,
                    index_buffer,
                }
            }
        };

        let (render_mode, count) = match &buffers.index_buffer {
            Some(index_buffer) => (RenderMode::Elements, index_buffer.count()),
            None => (
                RenderMode::Arrays,
                (buffers.vertex_buffer.size() / mem::size_of::<Vertex>()) as u32,
            ),
        };

        let mut vertex_array = VertexArray::new(cache.gpu())?;
        vertex_array.attach_buffers(buffers.vertex_buffer, buffers.index_buffer);

        Ok(Self {
            kind,
            transform,
            material,
            render_mode,
            primitive: mesh.primitive,
            count,
            vertex_array,
        })
    }

    /// Geometry with the default transform and material
    pub fn with_defaults(kind: GeometryKind, cache: &mut ResourceCache) -> Result<Self> {
        Self::new(kind, Transform::default(), Material::default(), cache)
    }

    /// Model matrix of the current transform; no side effects
    pub fn compute_model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn set_size(&mut self, size: Vec3) {
        self.transform.size = size;
    }

    /// Rotate by `angle` degrees around `axis`
    pub fn set_rotation(&mut self, axis: Vec3, angle: f32) {
        self.transform.rotation_axis = axis;
        self.transform.rotation_angle = angle;
    }

    pub fn set_ambient(&mut self, color: Vec3) {
        self.material.ambient_color = color;
    }

    pub fn set_diffuse(&mut self, color: Vec3) {
        self.material.diffuse_color = color;
    }

    pub fn set_diffuse_texture(&mut self, texture: Option<Rc<Texture2D>>) {
        self.material.diffuse_texture = texture;
    }

    pub fn set_specular(&mut self, color: Vec3) {
        self.material.specular_color = color;
    }

    pub fn set_specular_texture(&mut self, texture: Option<Rc<Texture2D>>) {
        self.material.specular_texture = texture;
    }

    pub fn set_emission(&mut self, color: Vec3) {
        self.material.emission_color = color;
    }

    pub fn set_emission_texture(&mut self, texture: Option<Rc<Texture2D>>) {
        self.material.emission_texture = texture;
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.material.shininess = shininess;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.material.opacity = opacity;
    }

    /// Whether present material textures are sampled
    pub fn set_textures_usage(&mut self, enabled: bool) {
        self.material.use_textures = enabled;
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Vertices drawn in array mode, indices in element mode
    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::device::Gpu;
    use crate::graphics::headless::HeadlessDevice;
    use glam::Vec4;

    const EPSILON: f32 = 1e-5;

    fn cache() -> (Rc<HeadlessDevice>, ResourceCache) {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();
        (device, ResourceCache::new(&gpu))
    }

    #[test]
    fn test_model_matrix_order() {
        let transform = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            size: Vec3::new(2.0, 1.0, 1.0),
            rotation_axis: Vec3::Y,
            rotation_angle: 90.0,
        };
        let moved = transform.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);

        // Translate, then rotate, then scale
        assert!(moved.truncate().distance(Vec3::new(0.0, 0.0, -2.0)) < EPSILON);
    }

    #[test]
    fn test_identity_transform() {
        assert_eq!(Transform::default().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_zero_axis_means_no_rotation() {
        let transform = Transform {
            rotation_axis: Vec3::ZERO,
            rotation_angle: 45.0,
            ..Transform::from_position(Vec3::new(0.0, 3.0, 0.0))
        };
        assert_eq!(transform.model_matrix(), Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_cache_ids() {
        assert_eq!(GeometryKind::Square.cache_id(), "Square");
        assert_eq!(GeometryKind::circle().cache_id(), "Circle-32");
        assert_ne!(
            GeometryKind::Circle { segments: 8 }.cache_id(),
            GeometryKind::Circle { segments: 16 }.cache_id()
        );
    }

    #[test]
    fn test_square_draws_elements() {
        let (_device, mut cache) = cache();
        let square = Geometry::with_defaults(GeometryKind::Square, &mut cache).unwrap();
        assert_eq!(square.render_mode(), RenderMode::Elements);
        assert_eq!(square.count(), 6);
        assert_eq!(square.primitive(), Primitive::Triangles);
    }

    #[test]
    fn test_triangle_and_circle_draw_arrays() {
        let (_device, mut cache) = cache();
        let triangle = Geometry::with_defaults(GeometryKind::Triangle, &mut cache).unwrap();
        assert_eq!(triangle.render_mode(), RenderMode::Arrays);
        assert_eq!(triangle.count(), 3);

        let circle = Geometry::with_defaults(GeometryKind::Circle { segments: 12 }, &mut cache).unwrap();
        assert_eq!(circle.render_mode(), RenderMode::Arrays);
        assert_eq!(circle.count(), 14);
        assert_eq!(circle.primitive(), Primitive::TriangleFan);

        let cached = Geometry::with_defaults(GeometryKind::Circle { segments: 12 }, &mut cache).unwrap();
        assert_eq!(cached.primitive(), Primitive::TriangleFan);
        assert_eq!(cached.count(), 14);
    }

    #[test]
    fn test_buffers_shared_between_instances() {
        let (device, mut cache) = cache();
        let a = Geometry::with_defaults(GeometryKind::Cube, &mut cache).unwrap();
        let b = Geometry::with_defaults(GeometryKind::Cube, &mut cache).unwrap();

        assert_eq!(cache.geometry_buffers_count(), 1);
        assert_eq!(device.live_buffers(), 2);
        assert_eq!(device.live_vertex_arrays(), 2);
        assert_ne!(a.vertex_array().id(), b.vertex_array().id());
        assert_eq!(a.count(), 36);
    }

    #[test]
    fn test_setters_update_transform_and_material() {
        let (_device, mut cache) = cache();
        let mut geometry = Geometry::with_defaults(GeometryKind::Square, &mut cache).unwrap();
        geometry.set_position(Vec3::new(1.0, 2.0, 3.0));
        geometry.set_rotation(Vec3::Z, 30.0);
        geometry.set_opacity(0.5);
        geometry.set_textures_usage(true);

        assert_eq!(geometry.transform().position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(geometry.transform().rotation_angle, 30.0);
        assert_eq!(geometry.material().opacity, 0.5);
        assert!(geometry.material().use_textures);
    }
}
