//! GPU objects of the scene
//!
//! Creation order is shader, vertex array, vertex buffer, index buffer, vertex
//! attributes, then the three uniform buffers at their binding points.
//! [`SceneResources::release`] walks the same list backwards and is safe to
//! call on a partially created set.

use crate::gfx::{
    geometry::{CombinedGeometry, SubMesh},
    resources::{
        shader::ShaderAsset,
        uniforms::{
            FrameMatrices, LightUniform, MaterialUniform, LIGHT_BINDING, MATERIAL_BINDING,
            MATRICES_BINDING,
        },
    },
};
use crate::gpu::{
    BufferUsage, GpuBackend, GpuBuffer, GpuContext, GpuError, Shader, VertexArray, VertexRecord,
};

use super::vertex::DiffuseVertex;

#[derive(Debug)]
pub struct SceneResources {
    shader: Shader,
    vertex_array: VertexArray,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    matrices: GpuBuffer,
    material: GpuBuffer,
    light: GpuBuffer,
    submesh: SubMesh,
}

impl SceneResources {
    /// Creates and fills every GPU object of the scene; `submesh` is the
    /// range drawn each frame.
    ///
    /// On failure everything created so far is released before the error is
    /// returned.
    pub fn create<B: GpuBackend>(
        ctx: &mut GpuContext<B>,
        geometry: &CombinedGeometry<DiffuseVertex>,
        shader: &ShaderAsset,
        submesh: SubMesh,
    ) -> Result<Self, GpuError> {
        let mut resources = Self {
            shader: Shader::new(shader.label()),
            vertex_array: VertexArray::new("scene_vao"),
            vertex_buffer: GpuBuffer::vertex(BufferUsage::Static, "scene_vbo"),
            index_buffer: GpuBuffer::index(BufferUsage::Static, "scene_ibo"),
            matrices: GpuBuffer::uniform(BufferUsage::Dynamic, "matrices_ubo"),
            material: GpuBuffer::uniform(BufferUsage::Dynamic, "material_ubo"),
            light: GpuBuffer::uniform(BufferUsage::Dynamic, "light_ubo"),
            submesh,
        };

        if let Err(err) = resources.init(ctx, geometry, shader) {
            log::error!("scene resource creation failed: {}", err);
            resources.release(ctx);
            return Err(err);
        }
        log::info!(
            "scene resources ready: {} vertices, {} indices, drawing {:?}",
            geometry.vertex_count(),
            geometry.index_count(),
            submesh.range()
        );
        Ok(resources)
    }

    fn init<B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        geometry: &CombinedGeometry<DiffuseVertex>,
        shader: &ShaderAsset,
    ) -> Result<(), GpuError> {
        self.shader.create(ctx, shader)?;

        self.vertex_array.create(ctx)?;
        self.vertex_array.bind(ctx)?;

        self.vertex_buffer.create(ctx)?;
        self.vertex_buffer.bind(ctx)?;
        self.vertex_buffer.upload(ctx, geometry.vertices())?;

        self.index_buffer.create(ctx)?;
        self.index_buffer.bind(ctx)?;
        self.index_buffer.upload(ctx, geometry.indices())?;

        self.vertex_array
            .init_attributes_of_type::<DiffuseVertex, B>(ctx, DiffuseVertex::ATTRIBUTES)?;

        self.matrices.create(ctx)?;
        self.matrices.bind_at_location(ctx, MATRICES_BINDING)?;
        self.material.create(ctx)?;
        self.material.bind_at_location(ctx, MATERIAL_BINDING)?;
        self.light.create(ctx)?;
        self.light.bind_at_location(ctx, LIGHT_BINDING)?;
        Ok(())
    }

    /// Binds and uploads the three uniform buffers.
    pub fn upload_frame<B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        matrices: &FrameMatrices,
        material: &MaterialUniform,
        light: &LightUniform,
    ) -> Result<(), GpuError> {
        self.matrices.bind(ctx)?;
        self.matrices.upload(ctx, std::slice::from_ref(matrices))?;
        self.material.bind(ctx)?;
        self.material.upload(ctx, std::slice::from_ref(material))?;
        self.light.bind(ctx)?;
        self.light.upload(ctx, std::slice::from_ref(light))?;
        Ok(())
    }

    /// Draws the active submesh.
    pub fn draw<B: GpuBackend>(&self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        self.shader.bind(ctx)?;
        self.vertex_array.bind(ctx)?;
        ctx.draw_indexed(self.submesh.range())
    }

    pub fn matrices_buffer(&self) -> &GpuBuffer {
        &self.matrices
    }

    pub fn submesh(&self) -> SubMesh {
        self.submesh
    }

    pub fn release<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) {
        self.light.release(ctx);
        self.material.release(ctx);
        self.matrices.release(ctx);
        self.index_buffer.release(ctx);
        self.vertex_buffer.release(ctx);
        self.vertex_array.release(ctx);
        self.shader.release(ctx);
    }
}
