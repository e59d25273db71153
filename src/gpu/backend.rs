//! GPU backend seam
//!
//! The command surface the scene pipeline needs from a graphics API. Handles are
//! allocated by [`GpuContext`](super::GpuContext) and handed to the backend, so a
//! backend only maps ids onto its own objects.

use std::ops::Range;

use crate::gfx::{rendering::render_pass::RenderPassState, resources::shader::ShaderAsset};

use super::{error::GpuError, layout::VertexLayout};

/// Handle of a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u64);

/// Handle of a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub(crate) u64);

/// Handle of a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u64);

/// What a buffer holds and where it can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Write-frequency hint. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once
    Static,
    /// Rewritten every frame
    Dynamic,
}

/// Creation parameters of a buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub kind: BufferKind,
    pub usage: BufferUsage,
    pub label: &'a str,
}

/// A uniform buffer visible to the shader at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBinding {
    pub slot: u32,
    pub buffer: BufferId,
}

/// One indexed triangle-list draw with everything the backend has to bind.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub shader: ShaderId,
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub layout: &'a VertexLayout,
    /// Sorted by slot
    pub uniforms: &'a [UniformBinding],
    /// Element range inside the index buffer
    pub indices: Range<u32>,
}

/// Graphics API implementation driven by [`GpuContext`](super::GpuContext).
///
/// All calls happen on the render thread, in the order the frame loop issues
/// them. `clear` opens a frame, `present` closes it.
pub trait GpuBackend {
    fn name(&self) -> &'static str;

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), GpuError>;

    /// Replaces the whole contents of the buffer.
    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), GpuError>;

    fn release_buffer(&mut self, id: BufferId);

    fn create_shader(&mut self, id: ShaderId, asset: &ShaderAsset) -> Result<(), GpuError>;

    fn release_shader(&mut self, id: ShaderId);

    /// Clears the attachments selected by the pass's clear mask.
    fn clear(&mut self, pass: &RenderPassState) -> Result<(), GpuError>;

    fn draw_indexed(&mut self, call: &DrawCall<'_>) -> Result<(), GpuError>;

    /// Submits the frame's work and presents it.
    fn present(&mut self) -> Result<(), GpuError>;
}
