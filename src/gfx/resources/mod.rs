// src/gfx/resources/mod.rs
//! Asset and GPU resource types
//!
//! Cached asset loading, shader sources, uniform payloads and render attachments.

pub mod resource_manager;
pub mod shader;
pub mod texture_resource;
pub mod uniforms;

// Re-export main types
pub use resource_manager::{Resource, ResourceError, ResourceManager};
pub use shader::ShaderAsset;
pub use texture_resource::TextureResource;
pub use uniforms::{FrameMatrices, Light, Material};
