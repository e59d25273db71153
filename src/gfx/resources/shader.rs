//! Shader assets
//!
//! A shader asset is a WGSL source file holding both stages of one program,
//! with `vs_main` and `fs_main` entry points.

use super::resource_manager::{Resource, ResourceError};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderAsset {
    label: String,
    source: String,
}

impl ShaderAsset {
    pub fn new(label: &str, source: &str) -> Result<Self, ResourceError> {
        for entry in [VERTEX_ENTRY, FRAGMENT_ENTRY] {
            if !source.contains(&format!("fn {entry}")) {
                return Err(ResourceError::Invalid {
                    name: label.to_owned(),
                    reason: format!("missing entry point '{entry}'"),
                });
            }
        }
        Ok(Self {
            label: label.to_owned(),
            source: source.to_owned(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Resource for ShaderAsset {
    fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, ResourceError> {
        let source = String::from_utf8(bytes).map_err(|e| ResourceError::Invalid {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        Self::new(name, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_entry_points() {
        assert!(ShaderAsset::new("ok", "fn vs_main() {} fn fs_main() {}").is_ok());
        assert!(matches!(
            ShaderAsset::new("no_fragment", "fn vs_main() {}"),
            Err(ResourceError::Invalid { .. })
        ));
    }

    #[test]
    fn bundled_shader_is_valid() {
        let source = include_str!("../../../assets/diffuse_shader.wgsl");
        let asset = ShaderAsset::new("diffuse_shader.wgsl", source).unwrap();
        assert!(asset.source().contains("@binding(2)"));
    }
}
