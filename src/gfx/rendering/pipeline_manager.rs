//! Render pipeline management for wgpu
//!
//! Compiles shader modules and creates render pipelines lazily, caching each
//! pipeline by everything that shapes it: shader, vertex layout, uniform
//! binding points and attachment state.

use std::collections::HashMap;

use wgpu::*;

use crate::gfx::resources::{
    shader::{ShaderAsset, FRAGMENT_ENTRY, VERTEX_ENTRY},
    texture_resource::TextureResource,
};
use crate::gpu::{ComponentType, GpuError, ShaderId, VertexAttributeDescriptor, VertexLayout};

/// Everything a cached pipeline depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shader: ShaderId,
    pub layout: VertexLayout,
    /// Uniform binding points of bind group 0, sorted
    pub uniform_slots: Vec<u32>,
    pub depth_test: bool,
    pub sample_count: u32,
}

/// A pipeline and the layout of its bind group 0
pub struct CachedPipeline {
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
}

/// Manages shader modules and the pipelines built from them
pub struct PipelineManager {
    color_format: TextureFormat,
    shader_modules: HashMap<ShaderId, (String, ShaderModule)>,
    pipelines: HashMap<PipelineKey, CachedPipeline>,
}

impl PipelineManager {
    pub fn new(color_format: TextureFormat) -> Self {
        Self {
            color_format,
            shader_modules: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles `asset` and registers it as `id`.
    ///
    /// # Errors
    /// [`GpuError::Shader`] with the validation message if the WGSL is rejected.
    pub fn load_shader(
        &mut self,
        device: &Device,
        id: ShaderId,
        asset: &ShaderAsset,
    ) -> Result<(), GpuError> {
        device.push_error_scope(ErrorFilter::Validation);
        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(asset.label()),
            source: ShaderSource::Wgsl(asset.source().into()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Shader {
                label: asset.label().to_owned(),
                message: error.to_string(),
            });
        }

        self.shader_modules
            .insert(id, (asset.label().to_owned(), module));
        Ok(())
    }

    /// Drops the module and every pipeline built from it.
    pub fn unload_shader(&mut self, id: ShaderId) {
        self.shader_modules.remove(&id);
        self.pipelines.retain(|key, _| key.shader != id);
    }

    /// Gets or creates the pipeline for `key` (lazy loading)
    pub fn get_pipeline(
        &mut self,
        device: &Device,
        key: &PipelineKey,
    ) -> Result<&CachedPipeline, GpuError> {
        if !self.pipelines.contains_key(key) {
            let pipeline = self.create_pipeline(device, key)?;
            log::debug!(
                "created pipeline for {:?}: {} uniforms, depth {}, {} samples",
                key.shader,
                key.uniform_slots.len(),
                key.depth_test,
                key.sample_count
            );
            self.pipelines.insert(key.clone(), pipeline);
        }
        self.pipelines
            .get(key)
            .ok_or_else(|| GpuError::Backend("pipeline cache lost an entry".to_owned()))
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn create_pipeline(&self, device: &Device, key: &PipelineKey) -> Result<CachedPipeline, GpuError> {
        let (label, shader) = self
            .shader_modules
            .get(&key.shader)
            .ok_or_else(|| GpuError::Backend(format!("no shader module for {:?}", key.shader)))?;

        let layout_entries: Vec<BindGroupLayoutEntry> = key
            .uniform_slots
            .iter()
            .map(|&binding| BindGroupLayoutEntry {
                binding,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        device.push_error_scope(ErrorFilter::Validation);

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("uniforms_layout"),
            entries: &layout_entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let attributes = vertex_attributes(key.layout.attributes());
        let vertex_buffers = [VertexBufferLayout {
            array_stride: key.layout.stride() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let depth_stencil = key.depth_test.then(|| DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &vertex_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: shader,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(ColorTargetState {
                    format: self.color_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                // cards are seen from both sides
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: MultisampleState {
                count: key.sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Shader {
                label: label.clone(),
                message: error.to_string(),
            });
        }

        Ok(CachedPipeline {
            pipeline,
            bind_group_layout,
        })
    }
}

/// wgpu attribute list for a validated attribute table
pub fn vertex_attributes(attributes: &[VertexAttributeDescriptor]) -> Vec<VertexAttribute> {
    attributes
        .iter()
        .map(|attribute| VertexAttribute {
            format: vertex_format(attribute.component_type, attribute.component_count),
            offset: attribute.byte_offset as BufferAddress,
            shader_location: attribute.location,
        })
        .collect()
}

/// Vertex format for `count` components of `ty`. `count` is 1..=4 for
/// validated layouts; anything above is treated as 4.
pub fn vertex_format(ty: ComponentType, count: u32) -> VertexFormat {
    match (ty, count) {
        (ComponentType::F32, 1) => VertexFormat::Float32,
        (ComponentType::F32, 2) => VertexFormat::Float32x2,
        (ComponentType::F32, 3) => VertexFormat::Float32x3,
        (ComponentType::F32, _) => VertexFormat::Float32x4,
        (ComponentType::U32, 1) => VertexFormat::Uint32,
        (ComponentType::U32, 2) => VertexFormat::Uint32x2,
        (ComponentType::U32, 3) => VertexFormat::Uint32x3,
        (ComponentType::U32, _) => VertexFormat::Uint32x4,
        (ComponentType::I32, 1) => VertexFormat::Sint32,
        (ComponentType::I32, 2) => VertexFormat::Sint32x2,
        (ComponentType::I32, 3) => VertexFormat::Sint32x3,
        (ComponentType::I32, _) => VertexFormat::Sint32x4,
    }
}
