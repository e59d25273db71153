//! Explicit binding state
//!
//! OpenGL-style APIs keep a hidden "currently bound object of kind K". Here that
//! state lives in [`GpuContext`] and every GPU object operation goes through it,
//! which turns ordering mistakes (upload before bind, draw without a vertex
//! array, stale uniforms) into [`GpuError`] values.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::gfx::{rendering::render_pass::RenderPassState, resources::shader::ShaderAsset};

use super::{
    backend::{
        BufferDesc, BufferId, BufferKind, BufferUsage, DrawCall, GpuBackend, ShaderId,
        UniformBinding, VertexArrayId,
    },
    error::GpuError,
    layout::VertexLayout,
};

/// Size of one index element; index buffers always hold `u32`.
pub const INDEX_SIZE: usize = std::mem::size_of::<u32>();

struct BufferRecord {
    kind: BufferKind,
    usage: BufferUsage,
    label: String,
    byte_len: usize,
    written_frame: Option<u64>,
}

struct VertexArrayRecord {
    label: String,
    attributes: Option<AttributeBinding>,
}

struct AttributeBinding {
    layout: VertexLayout,
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
}

#[derive(Default)]
struct BoundState {
    vertex: Option<BufferId>,
    index: Option<BufferId>,
    uniform: Option<BufferId>,
    vertex_array: Option<VertexArrayId>,
    shader: Option<ShaderId>,
}

impl BoundState {
    fn slot(&mut self, kind: BufferKind) -> &mut Option<BufferId> {
        match kind {
            BufferKind::Vertex => &mut self.vertex,
            BufferKind::Index => &mut self.index,
            BufferKind::Uniform => &mut self.uniform,
        }
    }
}

/// A graphics backend plus the binding state of the single render thread.
pub struct GpuContext<B: GpuBackend> {
    backend: B,
    next_handle: u64,
    frame: u64,
    bound: BoundState,
    uniform_slots: BTreeMap<u32, BufferId>,
    buffers: HashMap<BufferId, BufferRecord>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayRecord>,
    shaders: HashMap<ShaderId, String>,
}

impl<B: GpuBackend> GpuContext<B> {
    pub fn new(backend: B) -> Self {
        log::info!("GPU context on {} backend", backend.name());
        Self {
            backend,
            next_handle: 1,
            frame: 0,
            bound: BoundState::default(),
            uniform_slots: BTreeMap::new(),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            shaders: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Index of the frame being recorded; advances on every [`present`](Self::present)
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn bound_buffer(&self, kind: BufferKind) -> Option<BufferId> {
        match kind {
            BufferKind::Vertex => self.bound.vertex,
            BufferKind::Index => self.bound.index,
            BufferKind::Uniform => self.bound.uniform,
        }
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.bound.vertex_array
    }

    pub fn bound_shader(&self) -> Option<ShaderId> {
        self.bound.shader
    }

    /// Buffer registered at uniform binding point `slot`
    pub fn uniform_binding(&self, slot: u32) -> Option<BufferId> {
        self.uniform_slots.get(&slot).copied()
    }

    /// All registered uniform bindings, sorted by slot
    pub fn uniform_bindings(&self) -> Vec<UniformBinding> {
        self.uniform_slots
            .iter()
            .map(|(&slot, &buffer)| UniformBinding { slot, buffer })
            .collect()
    }

    /// Number of buffers created and not yet released
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn buffer_label(&self, id: BufferId) -> String {
        self.buffers
            .get(&id)
            .map(|b| b.label.clone())
            .unwrap_or_else(|| format!("{id:?}"))
    }

    pub(crate) fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, GpuError> {
        let id = BufferId(self.next_handle());
        self.backend.create_buffer(id, desc)?;
        log::debug!("created {:?} buffer '{}' as {:?}", desc.kind, desc.label, id);
        self.buffers.insert(
            id,
            BufferRecord {
                kind: desc.kind,
                usage: desc.usage,
                label: desc.label.to_owned(),
                byte_len: 0,
                written_frame: None,
            },
        );
        Ok(id)
    }

    pub(crate) fn bind_buffer(&mut self, kind: BufferKind, id: BufferId) {
        *self.bound.slot(kind) = Some(id);
    }

    /// Registers `id` at uniform binding point `slot`.
    ///
    /// Re-registering the same buffer is a no-op; a slot held by a different
    /// live buffer is a [`GpuError::BindingCollision`]. A buffer holds at most
    /// one slot, so moving it frees the slot it held before.
    pub(crate) fn register_uniform(&mut self, slot: u32, id: BufferId) -> Result<(), GpuError> {
        match self.uniform_slots.get(&slot) {
            Some(&held) if held != id => Err(GpuError::BindingCollision {
                slot,
                held_by: self.buffer_label(held),
                incoming: self.buffer_label(id),
            }),
            _ => {
                self.uniform_slots
                    .retain(|&other, held| *held != id || other == slot);
                self.uniform_slots.insert(slot, id);
                Ok(())
            }
        }
    }

    /// Uploads into `id`, which must be the bound buffer of its kind.
    pub(crate) fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), GpuError> {
        let (kind, label) = match self.buffers.get(&id) {
            Some(record) => (record.kind, record.label.clone()),
            None => {
                return Err(GpuError::NotCreated {
                    label: format!("{id:?}"),
                })
            }
        };
        if self.bound_buffer(kind) != Some(id) {
            return Err(GpuError::NotBound { kind, label });
        }

        self.backend.write_buffer(id, bytes)?;
        log::trace!("frame {}: wrote {} bytes to '{}'", self.frame, bytes.len(), label);

        if let Some(record) = self.buffers.get_mut(&id) {
            record.byte_len = bytes.len();
            record.written_frame = Some(self.frame);
        }
        Ok(())
    }

    pub(crate) fn release_buffer(&mut self, id: BufferId) {
        let Some(record) = self.buffers.remove(&id) else {
            return;
        };
        let bound = self.bound.slot(record.kind);
        if *bound == Some(id) {
            *bound = None;
        }
        self.uniform_slots.retain(|_, held| *held != id);
        self.backend.release_buffer(id);
        log::debug!("released buffer '{}'", record.label);
    }

    pub(crate) fn create_vertex_array(&mut self, label: &str) -> VertexArrayId {
        let id = VertexArrayId(self.next_handle());
        self.vertex_arrays.insert(
            id,
            VertexArrayRecord {
                label: label.to_owned(),
                attributes: None,
            },
        );
        log::debug!("created vertex array '{}' as {:?}", label, id);
        id
    }

    pub(crate) fn bind_vertex_array(&mut self, id: VertexArrayId) {
        self.bound.vertex_array = Some(id);
    }

    /// Attaches `layout` and the currently bound vertex (and index) buffer to
    /// the vertex array `id`, which must be the bound one.
    pub(crate) fn configure_vertex_array(
        &mut self,
        id: VertexArrayId,
        layout: VertexLayout,
    ) -> Result<(), GpuError> {
        let label = match self.vertex_arrays.get(&id) {
            Some(record) => record.label.clone(),
            None => {
                return Err(GpuError::NotCreated {
                    label: format!("{id:?}"),
                })
            }
        };
        if self.bound.vertex_array != Some(id) {
            return Err(GpuError::MissingBinding("vertex array"));
        }
        let vertex_buffer = self.bound.vertex.ok_or(GpuError::NotBound {
            kind: BufferKind::Vertex,
            label: label.clone(),
        })?;
        let index_buffer = self.bound.index;

        log::debug!(
            "vertex array '{}': {} attributes, stride {}, vertex buffer '{}'",
            label,
            layout.attributes().len(),
            layout.stride(),
            self.buffer_label(vertex_buffer)
        );

        if let Some(record) = self.vertex_arrays.get_mut(&id) {
            record.attributes = Some(AttributeBinding {
                layout,
                vertex_buffer,
                index_buffer,
            });
        }
        Ok(())
    }

    pub(crate) fn release_vertex_array(&mut self, id: VertexArrayId) {
        if let Some(record) = self.vertex_arrays.remove(&id) {
            if self.bound.vertex_array == Some(id) {
                self.bound.vertex_array = None;
            }
            log::debug!("released vertex array '{}'", record.label);
        }
    }

    pub(crate) fn create_shader(&mut self, asset: &ShaderAsset) -> Result<ShaderId, GpuError> {
        let id = ShaderId(self.next_handle());
        self.backend.create_shader(id, asset)?;
        self.shaders.insert(id, asset.label().to_owned());
        log::debug!("created shader '{}' as {:?}", asset.label(), id);
        Ok(id)
    }

    pub(crate) fn bind_shader(&mut self, id: ShaderId) {
        self.bound.shader = Some(id);
    }

    pub(crate) fn release_shader(&mut self, id: ShaderId) {
        if let Some(label) = self.shaders.remove(&id) {
            if self.bound.shader == Some(id) {
                self.bound.shader = None;
            }
            self.backend.release_shader(id);
            log::debug!("released shader '{}'", label);
        }
    }

    pub(crate) fn clear(&mut self, pass: &RenderPassState) -> Result<(), GpuError> {
        self.backend.clear(pass)
    }

    /// Issues one indexed draw of `indices` (element range of the index buffer)
    /// with the bound shader, the bound vertex array and all registered
    /// uniform buffers.
    pub fn draw_indexed(&mut self, indices: Range<u32>) -> Result<(), GpuError> {
        let shader = self.bound.shader.ok_or(GpuError::MissingBinding("shader"))?;
        let vertex_array = self
            .bound
            .vertex_array
            .ok_or(GpuError::MissingBinding("vertex array"))?;
        let attributes = self
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|record| record.attributes.as_ref())
            .ok_or(GpuError::MissingBinding("vertex attribute layout"))?;
        let index_buffer = attributes
            .index_buffer
            .filter(|id| self.buffers.contains_key(id))
            .ok_or(GpuError::MissingBinding("index buffer"))?;

        let available = (self.buffers[&index_buffer].byte_len / INDEX_SIZE) as u32;
        if indices.start > indices.end || indices.end > available {
            return Err(GpuError::DrawOutOfRange {
                range: indices,
                available,
            });
        }

        for (&slot, id) in &self.uniform_slots {
            let record = &self.buffers[id];
            if record.usage == BufferUsage::Dynamic && record.written_frame != Some(self.frame) {
                return Err(GpuError::StaleUniform {
                    slot,
                    label: record.label.clone(),
                });
            }
        }

        let uniforms = self.uniform_bindings();
        let call = DrawCall {
            shader,
            vertex_array,
            vertex_buffer: attributes.vertex_buffer,
            index_buffer,
            layout: &attributes.layout,
            uniforms: &uniforms,
            indices,
        };
        log::trace!("frame {}: draw {:?}", self.frame, call.indices);
        self.backend.draw_indexed(&call)
    }

    /// Presents the frame and advances the frame counter.
    pub fn present(&mut self) -> Result<(), GpuError> {
        let result = self.backend.present();
        self.frame += 1;
        result
    }
}

impl<B: GpuBackend> Drop for GpuContext<B> {
    fn drop(&mut self) {
        if !self.buffers.is_empty() || !self.shaders.is_empty() {
            log::warn!(
                "GPU context dropped with {} buffers and {} shaders still alive",
                self.buffers.len(),
                self.shaders.len()
            );
        }
    }
}
