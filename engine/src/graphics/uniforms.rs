//! Uniform names shared by the renderer and the built-in shaders

pub const MODEL_MATRIX: &str = "v_modelMatrix";
pub const CAMERA_MATRIX: &str = "v_cameraMatrix";
pub const NORMAL_MATRIX: &str = "v_normalMatrix";

pub const CAMERA_POSITION: &str = "f_cameraPosition";

pub mod material {
    pub const AMBIENT_COLOR: &str = "f_material.m_ambientColor";
    pub const DIFFUSE_COLOR: &str = "f_material.m_diffuseColor";
    pub const SPECULAR_COLOR: &str = "f_material.m_specularColor";
    pub const EMISSION_COLOR: &str = "f_material.m_emissionColor";
    pub const OPACITY: &str = "f_material.m_opacity";
    pub const SHININESS: &str = "f_material.m_shininess";

    pub const ENABLE_DIFFUSE_TEXTURE: &str = "f_material.m_enableDiffuseTexture";
    pub const ENABLE_SPECULAR_TEXTURE: &str = "f_material.m_enableSpecularTexture";
    pub const ENABLE_EMISSION_TEXTURE: &str = "f_material.m_enableEmissionTexture";

    pub const DIFFUSE_TEXTURE: &str = "f_material.m_diffuseTexture";
    pub const SPECULAR_TEXTURE: &str = "f_material.m_specularTexture";
    pub const EMISSION_TEXTURE: &str = "f_material.m_emissionTexture";
}

pub mod global_light {
    pub const DIRECTION: &str = "f_globalLight.m_direction";
    pub const AMBIENT_INTENSITY: &str = "f_globalLight.m_ambientIntensity";
    pub const DIFFUSE_INTENSITY: &str = "f_globalLight.m_diffuseIntensity";
    pub const SPECULAR_INTENSITY: &str = "f_globalLight.m_specularIntensity";
    pub const ENABLED: &str = "f_globalLight.m_enabled";
}

pub const POINT_LIGHT_COUNT: &str = "f_pointLightCount";
pub const SPOT_LIGHT_COUNT: &str = "f_spotLightCount";

/// Field names shared by point and spot light structs
pub mod light_field {
    pub const POSITION: &str = "m_position";
    pub const DIRECTION: &str = "m_direction";
    pub const AMBIENT_INTENSITY: &str = "m_ambientIntensity";
    pub const DIFFUSE_INTENSITY: &str = "m_diffuseIntensity";
    pub const SPECULAR_INTENSITY: &str = "m_specularIntensity";
    pub const CONSTANT: &str = "m_constant";
    pub const LINEAR: &str = "m_linear";
    pub const QUADRATIC: &str = "m_quadratic";
    pub const INNER_CUTOFF: &str = "m_innerCutoff";
    pub const OUTER_CUTOFF: &str = "m_outerCutoff";
    pub const ENABLED: &str = "m_enabled";
}

/// `f_pointLights[index].field`
pub fn point_light(index: usize, field: &str) -> String {
    format!("f_pointLights[{index}].{field}")
}

/// `f_spotLights[index].field`
pub fn spot_light(index: usize, field: &str) -> String {
    format!("f_spotLights[{index}].{field}")
}
