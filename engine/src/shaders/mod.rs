//! Built-in GLSL programs
//!
//! Both programs share the uniform names in [`crate::graphics::uniforms`].

/// Shader identifier of the unlit program in the resource cache
pub const UNLIT_SHADER_ID: &str = "Geometry";
/// Shader identifier of the lit program in the resource cache
pub const LIT_SHADER_ID: &str = "GeometryLit";

/// Vertex stage of the unlit program
pub const UNLIT_VERTEX: &str = include_str!("unlit.vert");
/// Fragment stage of the unlit program, material colors and textures only
pub const UNLIT_FRAGMENT: &str = include_str!("unlit.frag");

/// Vertex stage of the lit program, also outputs world position and normal
pub const LIT_VERTEX: &str = include_str!("lit.vert");
/// Fragment stage of the lit program with directional, point and spot lights
pub const LIT_FRAGMENT: &str = include_str!("lit.frag");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::lighting::{MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
    use crate::graphics::uniforms;

    #[test]
    fn test_light_array_sizes_match() {
        assert!(LIT_FRAGMENT.contains(&format!("#define MAX_POINT_LIGHTS {MAX_POINT_LIGHTS}")));
        assert!(LIT_FRAGMENT.contains(&format!("#define MAX_SPOT_LIGHTS {MAX_SPOT_LIGHTS}")));
    }

    #[test]
    fn test_sources_declare_shared_uniforms() {
        for source in [UNLIT_VERTEX, LIT_VERTEX] {
            assert!(source.contains(uniforms::MODEL_MATRIX));
            assert!(source.contains(uniforms::CAMERA_MATRIX));
        }
        assert!(LIT_VERTEX.contains(uniforms::NORMAL_MATRIX));
        assert!(LIT_FRAGMENT.contains(uniforms::CAMERA_POSITION));
        assert!(LIT_FRAGMENT.contains(uniforms::POINT_LIGHT_COUNT));
        assert!(LIT_FRAGMENT.contains(uniforms::SPOT_LIGHT_COUNT));
    }

    #[test]
    fn test_sources_target_glsl_330() {
        for source in [UNLIT_VERTEX, UNLIT_FRAGMENT, LIT_VERTEX, LIT_FRAGMENT] {
            assert!(source.starts_with("#version 330 core"));
        }
    }
}
