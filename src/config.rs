//! Scene configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Without a file the built-in "Match Cards" scene is used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gfx::rendering::render_pass::Rgb;
use crate::gfx::resources::uniforms::{Light, Material};

/// Environment variable naming the config file when no CLI argument is given
pub const CONFIG_ENV: &str = "DIORAMA_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Match Cards".to_owned(),
            width: 1024,
            height: 768,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the other asset paths are relative to
    pub root: PathBuf,
    pub mesh: String,
    pub shader: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            mesh: "match_cards.obj".to_owned(),
            shader: "diffuse_shader.wgsl".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: Rgb,
    pub depth_test: bool,
    pub multisample: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.047, 0.485, 0.598],
            depth_test: true,
            multisample: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: 60.0,
            position: [0.0, 0.0, -20.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub render: RenderConfig,
    pub camera: CameraConfig,
    pub material: Material,
    pub light: Light,
    /// Index of the submesh drawn every frame
    pub submesh: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            assets: AssetConfig::default(),
            render: RenderConfig::default(),
            camera: CameraConfig::default(),
            material: Material::new([1.0, 0.0, 0.0]),
            light: Light::new([0.0, 0.0, 5.0], [1.0, 1.0, 1.0]),
            submesh: 0,
        }
    }
}

impl SceneConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parses TOML `contents`; `origin` names the source in errors.
    pub fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_owned(),
            source,
        })
    }

    /// Loads the config named by the first CLI argument or by
    /// [`CONFIG_ENV`], falling back to the defaults when neither is set.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let path = args
            .into_iter()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        match path {
            Some(path) => {
                log::info!("loading config from '{}'", path);
                Self::load(path)
            }
            None => {
                log::info!("no config given, using the built-in scene");
                Ok(Self::default())
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn mesh_path(&self) -> PathBuf {
        self.assets.root.join(&self.assets.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_match_cards_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.window.title, "Match Cards");
        assert_eq!((config.window.width, config.window.height), (1024, 768));
        assert_eq!(config.render.clear_color, [0.047, 0.485, 0.598]);
        assert_eq!(config.material.color, [1.0, 0.0, 0.0]);
        assert_eq!(config.light.position, [0.0, 0.0, 5.0]);
        assert_eq!(config.camera.fov_y, 60.0);
        assert_eq!(config.camera.position, [0.0, 0.0, -20.0]);
        assert!(config.render.depth_test && config.render.multisample);
        assert_eq!(config.submesh, 0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = SceneConfig::parse(
            "submesh = 1\n[window]\nwidth = 640\n[material]\ncolor = [0.0, 1.0, 0.0]\n",
            "inline",
        )
        .unwrap();

        assert_eq!(config.submesh, 1);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.window.title, "Match Cards");
        assert_eq!(config.material.color, [0.0, 1.0, 0.0]);
        assert_eq!(config.light, SceneConfig::default().light);
    }

    #[test]
    fn rejects_wrong_types() {
        let err = SceneConfig::parse("[window]\nwidth = \"wide\"\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let config = SceneConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(SceneConfig::parse(&text, "roundtrip").unwrap(), config);
    }

    #[test]
    fn cli_argument_wins() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/diorama.toml");
        let config =
            SceneConfig::from_args(["diorama".to_owned(), path.to_owned()]).unwrap();
        assert_eq!(config.window.title, "Match Cards");
    }

    #[test]
    fn bundled_config_paths_resolve() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/diorama.toml");
        let config = SceneConfig::load(path).unwrap();
        assert_eq!(config.mesh_path(), PathBuf::from("assets/match_cards.obj"));
    }
}
