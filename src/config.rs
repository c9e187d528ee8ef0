/// Contains configuration options for the driver core like validation and implementation limits
pub struct GloveConfig {
    pub application_name: String,
    pub enable_validation_layers: bool,
    pub max_texture_units: usize,
    pub max_vertex_attribs: usize,
    pub max_mip_levels: u32,
}

impl Default for GloveConfig {
    fn default() -> Self {
        Self {
            application_name: "glove".into(),
            enable_validation_layers: cfg!(debug_assertions),
            max_texture_units: 8,
            max_vertex_attribs: 16,
            // 8192x8192 is the largest texture the driver advertises
            max_mip_levels: 14,
        }
    }
}
