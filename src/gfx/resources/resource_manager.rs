//! File-backed asset loading
//!
//! Resolves asset names against a root directory and caches each loaded asset by
//! type and path, so repeated loads hand out the same [`Arc`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("cannot read asset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// An asset type that can be built from the bytes of a file.
pub trait Resource: Sized + Send + Sync + 'static {
    fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, ResourceError>;
}

pub struct ResourceManager {
    root: PathBuf,
    cache: HashMap<(TypeId, PathBuf), Arc<dyn Any + Send + Sync>>,
}

impl ResourceManager {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the asset `name` under the root directory
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Loads (or returns the cached) asset `name` as `T`.
    pub fn load<T: Resource>(&mut self, name: &str) -> Result<Arc<T>, ResourceError> {
        let path = self.resolve(name);
        let key = (TypeId::of::<T>(), path.clone());

        if let Some(cached) = self.cache.get(&key) {
            if let Ok(asset) = Arc::clone(cached).downcast::<T>() {
                return Ok(asset);
            }
        }

        let bytes = std::fs::read(&path).map_err(|source| ResourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let asset = Arc::new(T::from_bytes(name, bytes)?);
        log::info!("loaded asset '{}'", path.display());

        self.cache.insert(key, asset.clone());
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::shader::ShaderAsset;

    fn assets() -> ResourceManager {
        ResourceManager::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
    }

    #[test]
    fn loads_and_caches_shader() {
        let mut resources = assets();
        let first = resources.load::<ShaderAsset>("diffuse_shader.wgsl").unwrap();
        let second = resources.load::<ShaderAsset>("diffuse_shader.wgsl").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_asset_is_io_error() {
        let mut resources = assets();
        assert!(matches!(
            resources.load::<ShaderAsset>("missing.wgsl"),
            Err(ResourceError::Io { .. })
        ));
    }

    #[test]
    fn wrong_contents_are_invalid() {
        let mut resources = assets();
        assert!(matches!(
            resources.load::<ShaderAsset>("match_cards.obj"),
            Err(ResourceError::Invalid { .. })
        ));
    }
}
