// src/gpu/mod.rs
//! GPU object layer
//!
//! Two-phase buffer, vertex array and shader objects on top of an explicit
//! binding context. The graphics API behind them is a [`GpuBackend`]: the wgpu
//! renderer in [`crate::gfx::rendering`] or the recording [`HeadlessBackend`].

pub mod backend;
pub mod buffer;
pub mod context;
pub mod error;
pub mod headless;
pub mod layout;
pub mod shader;
pub mod vertex_array;

// Re-export main types
pub use backend::{BufferId, BufferKind, BufferUsage, GpuBackend, ShaderId, VertexArrayId};
pub use buffer::GpuBuffer;
pub use context::GpuContext;
pub use error::GpuError;
pub use headless::HeadlessBackend;
pub use layout::{ComponentType, VertexAttributeDescriptor, VertexLayout, VertexRecord};
pub use shader::Shader;
pub use vertex_array::VertexArray;
