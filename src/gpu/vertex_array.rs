//! Vertex array objects
//!
//! A [`VertexArray`] records how the shader reads the bytes of the vertex buffer
//! bound when [`init_attributes_of_type`](VertexArray::init_attributes_of_type) runs,
//! together with the index buffer bound at that time.

use super::{
    backend::{GpuBackend, VertexArrayId},
    context::GpuContext,
    error::GpuError,
    layout::{VertexAttributeDescriptor, VertexLayout},
};

#[derive(Debug)]
pub struct VertexArray {
    label: String,
    id: Option<VertexArrayId>,
    layout: Option<VertexLayout>,
}

impl VertexArray {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            id: None,
            layout: None,
        }
    }

    pub fn create<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        if self.id.is_some() {
            return Err(GpuError::AlreadyCreated {
                label: self.label.clone(),
            });
        }
        self.id = Some(ctx.create_vertex_array(&self.label));
        Ok(())
    }

    pub fn bind<B: GpuBackend>(&self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        let id = self.handle()?;
        ctx.bind_vertex_array(id);
        Ok(())
    }

    /// Binds `attributes` to the currently bound vertex buffer, with one vertex
    /// record of type `V` per element (the stride).
    ///
    /// The array must be created and bound, and a vertex buffer must be bound.
    pub fn init_attributes_of_type<V: bytemuck::Pod, B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        attributes: &[VertexAttributeDescriptor],
    ) -> Result<(), GpuError> {
        let id = self.handle()?;
        let layout = VertexLayout::new(std::mem::size_of::<V>() as u32, attributes)?;
        ctx.configure_vertex_array(id, layout.clone())?;
        self.layout = Some(layout);
        Ok(())
    }

    pub fn release<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) {
        if let Some(id) = self.id.take() {
            ctx.release_vertex_array(id);
            self.layout = None;
        }
    }

    fn handle(&self) -> Result<VertexArrayId, GpuError> {
        self.id.ok_or_else(|| GpuError::NotCreated {
            label: self.label.clone(),
        })
    }

    pub fn id(&self) -> Option<VertexArrayId> {
        self.id
    }

    pub fn layout(&self) -> Option<&VertexLayout> {
        self.layout.as_ref()
    }
}
