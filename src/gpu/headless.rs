//! Headless GPU backend
//!
//! Performs no GPU work. Every command is recorded in order and buffer contents
//! are kept in memory, so the frame loop can run (and be checked) without a
//! window or an adapter. Draws snapshot the uniform buffers they read.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::gfx::{
    rendering::render_pass::{ClearMask, RenderPassState, Rgb, Viewport},
    resources::shader::ShaderAsset,
};

use super::{
    backend::{BufferDesc, BufferId, BufferKind, BufferUsage, DrawCall, GpuBackend, ShaderId},
    context::INDEX_SIZE,
    error::GpuError,
};

/// A command as the headless backend received it.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        id: BufferId,
        kind: BufferKind,
        usage: BufferUsage,
        label: String,
    },
    WriteBuffer {
        id: BufferId,
        bytes: Vec<u8>,
    },
    ReleaseBuffer {
        id: BufferId,
    },
    CreateShader {
        id: ShaderId,
        label: String,
    },
    ReleaseShader {
        id: ShaderId,
    },
    Clear {
        mask: ClearMask,
        color: Rgb,
        viewport: Viewport,
    },
    DrawIndexed {
        shader: ShaderId,
        index_buffer: BufferId,
        indices: Range<u32>,
        /// `(slot, bytes)` of every uniform buffer at the time of the draw
        uniforms: Vec<(u32, Vec<u8>)>,
    },
    Present,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    commands: Vec<Command>,
    buffers: HashMap<BufferId, Vec<u8>>,
    shaders: HashSet<ShaderId>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the command log
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(Vec::as_slice)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Index values read by `call`, checked against the vertex buffer size.
    fn check_indices(&self, call: &DrawCall<'_>) -> Result<(), GpuError> {
        let indices = self
            .buffers
            .get(&call.index_buffer)
            .ok_or_else(|| GpuError::Backend(format!("unknown index buffer {:?}", call.index_buffer)))?;
        let vertex_bytes = self
            .buffers
            .get(&call.vertex_buffer)
            .map_or(0, Vec::len);
        let vertex_count = vertex_bytes / call.layout.stride() as usize;

        let start = call.indices.start as usize * INDEX_SIZE;
        let end = call.indices.end as usize * INDEX_SIZE;
        let bytes = indices.get(start..end).ok_or(GpuError::DrawOutOfRange {
            range: call.indices.clone(),
            available: (indices.len() / INDEX_SIZE) as u32,
        })?;

        for chunk in bytes.chunks_exact(INDEX_SIZE) {
            let index: u32 = bytemuck::pod_read_unaligned(chunk);
            if index as usize >= vertex_count {
                return Err(GpuError::Backend(format!(
                    "index {index} exceeds the {vertex_count} vertices of the vertex buffer"
                )));
            }
        }
        Ok(())
    }
}

impl GpuBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "Headless"
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), GpuError> {
        log::trace!("HeadlessBackend: creating buffer {:?} ({})", id, desc.label);
        self.buffers.insert(id, Vec::new());
        self.commands.push(Command::CreateBuffer {
            id,
            kind: desc.kind,
            usage: desc.usage,
            label: desc.label.to_owned(),
        });
        Ok(())
    }

    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), GpuError> {
        let contents = self
            .buffers
            .get_mut(&id)
            .ok_or_else(|| GpuError::Backend(format!("write to unknown buffer {id:?}")))?;
        contents.clear();
        contents.extend_from_slice(bytes);
        self.commands.push(Command::WriteBuffer {
            id,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn release_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        self.commands.push(Command::ReleaseBuffer { id });
    }

    fn create_shader(&mut self, id: ShaderId, asset: &ShaderAsset) -> Result<(), GpuError> {
        self.shaders.insert(id);
        self.commands.push(Command::CreateShader {
            id,
            label: asset.label().to_owned(),
        });
        Ok(())
    }

    fn release_shader(&mut self, id: ShaderId) {
        self.shaders.remove(&id);
        self.commands.push(Command::ReleaseShader { id });
    }

    fn clear(&mut self, pass: &RenderPassState) -> Result<(), GpuError> {
        self.commands.push(Command::Clear {
            mask: pass.clear_mask,
            color: pass.clear_color,
            viewport: pass.viewport,
        });
        Ok(())
    }

    fn draw_indexed(&mut self, call: &DrawCall<'_>) -> Result<(), GpuError> {
        if !self.shaders.contains(&call.shader) {
            return Err(GpuError::Backend(format!("unknown shader {:?}", call.shader)));
        }
        self.check_indices(call)?;

        let uniforms = call
            .uniforms
            .iter()
            .map(|binding| {
                let bytes = self.buffers.get(&binding.buffer).cloned().unwrap_or_default();
                (binding.slot, bytes)
            })
            .collect();
        self.commands.push(Command::DrawIndexed {
            shader: call.shader,
            index_buffer: call.index_buffer,
            indices: call.indices.clone(),
            uniforms,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.commands.push(Command::Present);
        Ok(())
    }
}
