//! Vertex data and primitive mesh generation
//!
//! Provides the interleaved vertex format used by every built-in shape and
//! generators for the unit square, triangle, circle and cube.

use std::f32::consts::TAU;
use std::mem;

use bytemuck::{Pod, Zeroable};

use crate::graphics::buffer::VertexAttribute;
use crate::graphics::device::Primitive;

/// Attribute location of [`Vertex::position`]
pub const POSITION_LOCATION: u32 = 0;
/// Attribute location of [`Vertex::normal`]
pub const NORMAL_LOCATION: u32 = 1;
/// Attribute location of [`Vertex::uv`]
pub const UV_LOCATION: u32 = 2;

/// Vertex data structure for GPU rendering
///
/// This struct is tightly packed for efficient GPU transfer using bytemuck.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],
    /// Surface normal vector (normalized)
    pub normal: [f32; 3],
    /// Texture coordinates (UV mapping)
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a new vertex with the given attributes
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Attribute layout of an interleaved `Vertex` buffer
    pub const fn layout() -> [VertexAttribute; 3] {
        let stride = mem::size_of::<Vertex>();
        [
            VertexAttribute::float(POSITION_LOCATION, 3, stride, 0),
            VertexAttribute::float(NORMAL_LOCATION, 3, stride, mem::size_of::<[f32; 3]>()),
            VertexAttribute::float(UV_LOCATION, 2, stride, mem::size_of::<[f32; 6]>()),
        ]
    }
}

/// Generated vertex data and how to assemble it
///
/// An empty index list means the vertices are drawn in order.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub primitive: Primitive,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, primitive: Primitive) -> Self {
        Self {
            vertices,
            indices,
            primitive,
        }
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of elements a draw call consumes: indices when indexed,
    /// vertices otherwise
    pub fn draw_count(&self) -> u32 {
        if self.is_indexed() {
            self.indices.len() as u32
        } else {
            self.vertices.len() as u32
        }
    }

    /// Unit square on the XY plane facing +Z, drawn with 6 indices
    pub fn square() -> Self {
        const N: [f32; 3] = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex::new([-0.5, -0.5, 0.0], N, [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], N, [1.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.0], N, [1.0, 1.0]),
            Vertex::new([-0.5, 0.5, 0.0], N, [0.0, 1.0]),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];

        Self::new(vertices, indices, Primitive::Triangles)
    }

    /// Unit triangle on the XY plane facing +Z, drawn as 3 vertices
    pub fn triangle() -> Self {
        const N: [f32; 3] = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex::new([-0.5, -0.5, 0.0], N, [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], N, [1.0, 0.0]),
            Vertex::new([0.0, 0.5, 0.0], N, [0.5, 1.0]),
        ];

        Self::new(vertices, Vec::new(), Primitive::Triangles)
    }

    /// Circle of radius 0.5 on the XY plane, drawn as a triangle fan
    ///
    /// The fan starts at the center and repeats the first rim vertex at the
    /// end to close the shape. `segments` is raised to at least 3.
    pub fn circle(segments: u32) -> Self {
        const N: [f32; 3] = [0.0, 0.0, 1.0];
        let segments = segments.max(3);

        let mut vertices = Vec::with_capacity(segments as usize + 2);
        vertices.push(Vertex::new([0.0, 0.0, 0.0], N, [0.5, 0.5]));
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * TAU;
            let (x, y) = (angle.cos() * 0.5, angle.sin() * 0.5);
            vertices.push(Vertex::new([x, y, 0.0], N, [x + 0.5, y + 0.5]));
        }

        Self::new(vertices, Vec::new(), Primitive::TriangleFan)
    }

    /// Create a cube mesh with the given size
    ///
    /// The cube is centered at the origin with each side having length `size`.
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;

        let positions = [
            [-half, -half, -half], // 0: left bottom back
            [half, -half, -half],  // 1: right bottom back
            [half, half, -half],   // 2: right top back
            [-half, half, -half],  // 3: left top back
            [-half, -half, half],  // 4: left bottom front
            [half, -half, half],   // 5: right bottom front
            [half, half, half],    // 6: right top front
            [-half, half, half],   // 7: left top front
        ];

        // (corner indices, normal) per face, counter-clockwise seen from outside
        let faces: [([usize; 4], [f32; 3]); 6] = [
            ([4, 5, 6, 7], [0.0, 0.0, 1.0]),
            ([1, 0, 3, 2], [0.0, 0.0, -1.0]),
            ([7, 6, 2, 3], [0.0, 1.0, 0.0]),
            ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
            ([5, 1, 2, 6], [1.0, 0.0, 0.0]),
            ([0, 4, 7, 3], [-1.0, 0.0, 0.0]),
        ];
        const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (corners, normal) in faces {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(UVS) {
                vertices.push(Vertex::new(positions[corner], normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices, Primitive::Triangles)
    }
}
