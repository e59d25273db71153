// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Render pass state, pipeline caching and the wgpu implementation of
//! [`GpuBackend`](crate::gpu::GpuBackend).

pub mod pipeline_manager;
pub mod render_engine;
pub mod render_pass;

// Re-export main types
pub use pipeline_manager::{PipelineKey, PipelineManager};
pub use render_engine::WgpuBackend;
pub use render_pass::{Capabilities, ClearMask, RenderPass};
