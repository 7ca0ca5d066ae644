//! Import/export settings

use serde::{Deserialize, Serialize};

/// Flags controlling import and export
///
/// Every field is defaulted, so a partial TOML table is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyOptions {
    /// Write ASCII instead of native binary
    #[serde(default)]
    pub ascii_format: bool,
    #[serde(default)]
    pub export_normals: bool,
    #[serde(default = "default_true")]
    pub export_uvs: bool,
    #[serde(default = "default_true")]
    pub export_colors: bool,
    /// Only export meshes the scene reports as selected
    #[serde(default)]
    pub export_selected_only: bool,
    /// Also store imported normals as a `Normal` vertex attribute
    #[serde(default)]
    pub import_normals_as_attribute: bool,
    /// Weld vertices closer than [`crate::MERGE_DISTANCE`] after import
    #[serde(default)]
    pub merge_verts_on_import: bool,
    /// Uniform scale applied to exported positions
    #[serde(default = "default_scale")]
    pub global_scale: f32,
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    1.0
}

impl Default for PlyOptions {
    fn default() -> Self {
        Self {
            ascii_format: false,
            export_normals: false,
            export_uvs: true,
            export_colors: true,
            export_selected_only: false,
            import_normals_as_attribute: false,
            merge_verts_on_import: false,
            global_scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let options: PlyOptions = toml::from_str("").unwrap();
        assert_eq!(options, PlyOptions::default());
    }

    #[test]
    fn test_partial_toml() {
        let options: PlyOptions = toml::from_str(
            r#"
ascii_format = true
export_colors = false
global_scale = 0.01
"#,
        )
        .unwrap();
        assert!(options.ascii_format);
        assert!(!options.export_colors);
        assert!(options.export_uvs);
        assert_eq!(options.global_scale, 0.01);
    }

    #[test]
    fn test_toml_round_trip() {
        let options = PlyOptions {
            merge_verts_on_import: true,
            export_normals: true,
            ..Default::default()
        };
        let text = toml::to_string(&options).unwrap();
        let parsed: PlyOptions = toml::from_str(&text).unwrap();
        assert_eq!(parsed, options);
    }
}
