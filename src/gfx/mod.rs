//! # Graphics Module
//!
//! Everything between the imported mesh file and the pixels on screen.
//!
//! - **Camera** ([`camera`]) - perspective projection
//! - **Geometry** ([`geometry`]) - OBJ import and merging into one index buffer
//! - **Rendering** ([`rendering`]) - render pass state and the wgpu backend
//! - **Resources** ([`resources`]) - asset loading, shaders and uniform payloads
//! - **Scene** ([`scene`]) - transforms, vertex format and the scene's GPU objects
//!
//! The frame loop drives these through [`crate::gpu::GpuContext`], so the same
//! scene code runs on [`WgpuBackend`] and on the headless backend.

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::WgpuBackend;
