//! Two-phase GPU buffer objects
//!
//! A [`GpuBuffer`] is constructed without touching the GPU and acquires its handle
//! in [`create`](GpuBuffer::create), mirroring context-bound APIs where objects can
//! only exist once a context is current. The last uploaded bytes are kept on the
//! CPU side so that readers (tests, the debug overlay) can inspect what the GPU
//! was given.

use super::{
    backend::{BufferDesc, BufferId, BufferKind, BufferUsage, GpuBackend},
    context::GpuContext,
    error::GpuError,
};

/// A vertex, index or uniform buffer with an explicit create/release lifecycle.
#[derive(Debug)]
pub struct GpuBuffer {
    kind: BufferKind,
    usage: BufferUsage,
    label: String,
    id: Option<BufferId>,
    binding: Option<u32>,
    contents: Vec<u8>,
}

impl GpuBuffer {
    pub fn new(kind: BufferKind, usage: BufferUsage, label: &str) -> Self {
        Self {
            kind,
            usage,
            label: label.to_owned(),
            id: None,
            binding: None,
            contents: Vec::new(),
        }
    }

    pub fn vertex(usage: BufferUsage, label: &str) -> Self {
        Self::new(BufferKind::Vertex, usage, label)
    }

    pub fn index(usage: BufferUsage, label: &str) -> Self {
        Self::new(BufferKind::Index, usage, label)
    }

    pub fn uniform(usage: BufferUsage, label: &str) -> Self {
        Self::new(BufferKind::Uniform, usage, label)
    }

    /// Allocates the GPU handle.
    ///
    /// # Errors
    /// [`GpuError::AlreadyCreated`] if the buffer already owns a handle.
    pub fn create<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        if self.id.is_some() {
            return Err(GpuError::AlreadyCreated {
                label: self.label.clone(),
            });
        }
        let id = ctx.create_buffer(&BufferDesc {
            kind: self.kind,
            usage: self.usage,
            label: &self.label,
        })?;
        self.id = Some(id);
        Ok(())
    }

    /// Makes this the bound buffer of its kind.
    pub fn bind<B: GpuBackend>(&self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        let id = self.handle()?;
        ctx.bind_buffer(self.kind, id);
        Ok(())
    }

    /// Binds the buffer and registers it at uniform binding point `slot` until
    /// it is released.
    ///
    /// # Errors
    /// [`GpuError::WrongKind`] for non-uniform buffers and
    /// [`GpuError::BindingCollision`] when another live buffer holds `slot`.
    pub fn bind_at_location<B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        slot: u32,
    ) -> Result<(), GpuError> {
        if self.kind != BufferKind::Uniform {
            return Err(GpuError::WrongKind {
                label: self.label.clone(),
                expected: BufferKind::Uniform,
                actual: self.kind,
            });
        }
        let id = self.handle()?;
        ctx.register_uniform(slot, id)?;
        ctx.bind_buffer(self.kind, id);
        self.binding = Some(slot);
        Ok(())
    }

    /// Replaces the whole buffer with `data`. The buffer must be bound.
    pub fn upload<B: GpuBackend, T: bytemuck::Pod>(
        &mut self,
        ctx: &mut GpuContext<B>,
        data: &[T],
    ) -> Result<(), GpuError> {
        self.upload_bytes(ctx, bytemuck::cast_slice(data))
    }

    /// Replaces the whole buffer with `bytes`. The buffer must be bound.
    pub fn upload_bytes<B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        bytes: &[u8],
    ) -> Result<(), GpuError> {
        let id = self.handle()?;
        ctx.write_buffer(id, bytes)?;
        self.contents.clear();
        self.contents.extend_from_slice(bytes);
        Ok(())
    }

    /// Frees the GPU handle and any binding it holds. No-op when not created.
    pub fn release<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) {
        if let Some(id) = self.id.take() {
            ctx.release_buffer(id);
            self.binding = None;
        }
    }

    fn handle(&self) -> Result<BufferId, GpuError> {
        self.id.ok_or_else(|| GpuError::NotCreated {
            label: self.label.clone(),
        })
    }

    pub fn id(&self) -> Option<BufferId> {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Uniform binding point, once [`bind_at_location`](Self::bind_at_location) succeeded
    pub fn binding(&self) -> Option<u32> {
        self.binding
    }

    /// Bytes of the last successful upload
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Reads the leading `T` of the last upload, if enough bytes were written
    pub fn read<T: bytemuck::Pod>(&self) -> Option<T> {
        self.contents
            .get(..std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if self.id.is_some() {
            log::warn!("buffer '{}' dropped without release", self.label);
        }
    }
}
