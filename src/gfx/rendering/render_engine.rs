//! WGPU rendering backend
//!
//! Implements [`GpuBackend`] on wgpu. A frame opens lazily on the first
//! `clear`: the surface texture is acquired there and the clear is folded into
//! the load operations of the first render pass that follows. `present`
//! submits everything recorded since.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::gfx::resources::{
    shader::ShaderAsset,
    texture_resource::{Attachments, TextureResource},
};
use crate::gpu::backend::{BufferDesc, BufferId, BufferKind, DrawCall, GpuBackend, ShaderId};
use crate::gpu::GpuError;
use crate::platform::Extent2d;

use super::pipeline_manager::{PipelineKey, PipelineManager};
use super::render_pass::{Capabilities, ClearMask, RenderPassState};

/// Sample count used when multisampling is enabled and supported
const MSAA_SAMPLES: u32 = 4;

struct BufferSlot {
    kind: BufferKind,
    label: String,
    /// Created on first write; wgpu buffers are sized at creation
    buffer: Option<wgpu::Buffer>,
}

struct OpenFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    state: RenderPassState,
    /// Clear not yet folded into a render pass
    pending_clear: bool,
}

enum FrameState {
    Idle,
    /// No drawable this frame (minimized window, lost surface)
    Skipped,
    Open(OpenFrame),
}

/// Core rendering backend managing the surface, GPU resources and draw calls
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    msaa_supported: bool,
    attachments: Option<Attachments>,
    pipeline_manager: PipelineManager,
    buffers: HashMap<BufferId, BufferSlot>,
    frame: FrameState,
}

impl WgpuBackend {
    /// Creates a backend rendering into `window`.
    ///
    /// Blocks on adapter and device requests.
    pub fn new(window: Arc<Window>, size: Extent2d, vsync: bool) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Init(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError::Init(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("WGPU Device"),
            required_features: wgpu::Features::default(),
            required_limits: wgpu::Limits {
                max_texture_dimension_2d: 4096,
                ..wgpu::Limits::downlevel_defaults()
            },
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GpuError::Init(e.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| GpuError::Init("surface reports no texture formats".to_owned()))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let msaa_supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(MSAA_SAMPLES)
            && adapter
                .get_texture_format_features(TextureResource::DEPTH_FORMAT)
                .flags
                .sample_count_supported(MSAA_SAMPLES);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "wgpu on {} ({:?}), surface {:?} {}x{}, msaa x{} {}",
            info.name,
            info.backend,
            format,
            config.width,
            config.height,
            MSAA_SAMPLES,
            if msaa_supported { "available" } else { "unsupported" }
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            msaa_supported,
            attachments: None,
            pipeline_manager: PipelineManager::new(format),
            buffers: HashMap::new(),
            frame: FrameState::Idle,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn surface_size(&self) -> Extent2d {
        Extent2d::new(self.config.width, self.config.height)
    }

    /// Records extra work into the open frame, on top of what is already
    /// drawn. Returns `false` when no frame is open (skipped or not started).
    pub fn encode_overlay<F>(&mut self, encode: F) -> bool
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.flush_clear();
        match &mut self.frame {
            FrameState::Open(frame) => {
                encode(&self.device, &self.queue, &mut frame.encoder, &frame.view);
                true
            }
            FrameState::Idle | FrameState::Skipped => false,
        }
    }

    fn sample_count(&self, capabilities: Capabilities) -> u32 {
        if capabilities.contains(Capabilities::MULTISAMPLE) && self.msaa_supported {
            MSAA_SAMPLES
        } else {
            1
        }
    }

    fn resize_surface(&mut self, size: Extent2d) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("surface reconfigured to {}x{}", size.width, size.height);
    }

    /// Acquires the surface texture for a new frame.
    fn open_frame(&mut self, state: &RenderPassState) -> Result<FrameState, GpuError> {
        let size = state.viewport.size;
        if size.is_empty() {
            log::debug!("zero-sized viewport, skipping frame");
            return Ok(FrameState::Skipped);
        }
        if size != self.surface_size() {
            self.resize_surface(size);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::warn!("surface outdated, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameState::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(FrameState::Skipped);
            }
            Err(err) => return Err(GpuError::Surface(err.to_string())),
        };

        let sample_count = self.sample_count(state.capabilities);
        let depth = state.capabilities.contains(Capabilities::DEPTH_TEST);
        let current = self.surface_size();
        if !self
            .attachments
            .as_ref()
            .is_some_and(|a| a.matches(current, sample_count, depth))
        {
            self.attachments = Some(Attachments::new(
                &self.device,
                self.config.format,
                current,
                sample_count,
                depth,
            ));
        }

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        Ok(FrameState::Open(OpenFrame {
            surface_texture,
            view,
            encoder,
            state: *state,
            pending_clear: true,
        }))
    }

    /// Records a pass that does nothing but the pending clear.
    fn flush_clear(&mut self) {
        let FrameState::Open(frame) = &mut self.frame else {
            return;
        };
        if !frame.pending_clear {
            return;
        }
        let pass = begin_scene_pass(frame, self.attachments.as_ref(), "Clear Pass");
        drop(pass);
        frame.pending_clear = false;
    }
}

/// Begins the scene pass on `frame`, folding in its pending clear.
fn begin_scene_pass<'f>(
    frame: &'f mut OpenFrame,
    attachments: Option<&'f Attachments>,
    label: &str,
) -> wgpu::RenderPass<'f> {
    let clear = frame.pending_clear;
    let mask = frame.state.clear_mask;
    let [r, g, b] = frame.state.clear_color;

    let color_load = if clear && mask.contains(ClearMask::COLOR) {
        wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        })
    } else {
        wgpu::LoadOp::Load
    };
    let depth_load = if clear && mask.contains(ClearMask::DEPTH) {
        wgpu::LoadOp::Clear(1.0)
    } else {
        wgpu::LoadOp::Load
    };

    let (view, resolve_target) = match attachments.and_then(|a| a.msaa.as_ref()) {
        Some(msaa) => (&msaa.view, Some(&frame.view)),
        None => (&frame.view, None),
    };

    frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: attachments.and_then(|a| a.depth.as_ref()).map(|depth| {
            wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

fn resolve_buffer(
    buffers: &HashMap<BufferId, BufferSlot>,
    id: BufferId,
) -> Result<&wgpu::Buffer, GpuError> {
    let slot = buffers
        .get(&id)
        .ok_or_else(|| GpuError::Backend(format!("unknown buffer {id:?}")))?;
    slot.buffer.as_ref().ok_or_else(|| GpuError::NotCreated {
        label: format!("{} (never written)", slot.label),
    })
}

fn buffer_usages(kind: BufferKind) -> wgpu::BufferUsages {
    let usage = match kind {
        BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
        BufferKind::Index => wgpu::BufferUsages::INDEX,
        BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
    };
    usage | wgpu::BufferUsages::COPY_DST
}

/// `bytes` padded to the copy alignment, never empty
fn padded(bytes: &[u8]) -> std::borrow::Cow<'_, [u8]> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let len = bytes.len().max(align).div_ceil(align) * align;
    if len == bytes.len() {
        std::borrow::Cow::Borrowed(bytes)
    } else {
        let mut owned = bytes.to_vec();
        owned.resize(len, 0);
        std::borrow::Cow::Owned(owned)
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn create_buffer(&mut self, id: BufferId, desc: &BufferDesc<'_>) -> Result<(), GpuError> {
        self.buffers.insert(
            id,
            BufferSlot {
                kind: desc.kind,
                label: desc.label.to_owned(),
                buffer: None,
            },
        );
        Ok(())
    }

    fn write_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), GpuError> {
        let slot = self
            .buffers
            .get_mut(&id)
            .ok_or_else(|| GpuError::Backend(format!("write to unknown buffer {id:?}")))?;
        let data = padded(bytes);

        match &slot.buffer {
            Some(buffer) if buffer.size() == data.len() as u64 => {
                self.queue.write_buffer(buffer, 0, &data);
            }
            _ => {
                // size changed: recreate with the new contents
                slot.buffer = Some(self.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(&slot.label),
                        contents: &data,
                        usage: buffer_usages(slot.kind),
                    },
                ));
            }
        }
        Ok(())
    }

    fn release_buffer(&mut self, id: BufferId) {
        if let Some(slot) = self.buffers.remove(&id) {
            if let Some(buffer) = slot.buffer {
                buffer.destroy();
            }
        }
    }

    fn create_shader(&mut self, id: ShaderId, asset: &ShaderAsset) -> Result<(), GpuError> {
        self.pipeline_manager.load_shader(&self.device, id, asset)
    }

    fn release_shader(&mut self, id: ShaderId) {
        self.pipeline_manager.unload_shader(id);
    }

    fn clear(&mut self, pass: &RenderPassState) -> Result<(), GpuError> {
        match self.frame {
            FrameState::Skipped => {}
            FrameState::Idle => self.frame = self.open_frame(pass)?,
            FrameState::Open(_) => {
                // second clear in one frame: emit the first, keep the new one pending
                self.flush_clear();
                if let FrameState::Open(frame) = &mut self.frame {
                    frame.state = *pass;
                    frame.pending_clear = true;
                }
            }
        }
        Ok(())
    }

    fn draw_indexed(&mut self, call: &DrawCall<'_>) -> Result<(), GpuError> {
        if matches!(self.frame, FrameState::Skipped) {
            return Ok(());
        }
        let FrameState::Open(frame) = &mut self.frame else {
            return Err(GpuError::Backend("draw outside of a frame".to_owned()));
        };

        let sample_count = match self.attachments.as_ref() {
            Some(a) => a.sample_count,
            None => 1,
        };
        let key = PipelineKey {
            shader: call.shader,
            layout: call.layout.clone(),
            uniform_slots: call.uniforms.iter().map(|u| u.slot).collect(),
            depth_test: frame.state.capabilities.contains(Capabilities::DEPTH_TEST),
            sample_count,
        };
        let cached = self.pipeline_manager.get_pipeline(&self.device, &key)?;

        let entries = call
            .uniforms
            .iter()
            .map(|uniform| {
                Ok(wgpu::BindGroupEntry {
                    binding: uniform.slot,
                    resource: resolve_buffer(&self.buffers, uniform.buffer)?.as_entire_binding(),
                })
            })
            .collect::<Result<Vec<_>, GpuError>>()?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniforms"),
            layout: &cached.bind_group_layout,
            entries: &entries,
        });
        let vertex_buffer = resolve_buffer(&self.buffers, call.vertex_buffer)?;
        let index_buffer = resolve_buffer(&self.buffers, call.index_buffer)?;

        let viewport = frame.state.viewport;
        let target = Extent2d::new(self.config.width, self.config.height);
        let x = (viewport.origin[0].max(0) as u32).min(target.width);
        let y = (viewport.origin[1].max(0) as u32).min(target.height);
        let width = viewport.size.width.min(target.width - x);
        let height = viewport.size.height.min(target.height - y);

        {
            let mut pass = begin_scene_pass(frame, self.attachments.as_ref(), "Scene Pass");
            if width > 0 && height > 0 {
                pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
            }
            pass.set_pipeline(&cached.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(call.indices.clone(), 0, 0..1);
        }
        frame.pending_clear = false;
        Ok(())
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.flush_clear();
        match std::mem::replace(&mut self.frame, FrameState::Idle) {
            FrameState::Open(frame) => {
                self.queue.submit(std::iter::once(frame.encoder.finish()));
                frame.surface_texture.present();
            }
            FrameState::Skipped | FrameState::Idle => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_are_padded_to_copy_alignment() {
        assert_eq!(padded(&[]).len(), 4);
        assert_eq!(padded(&[1, 2, 3, 4]).len(), 4);
        assert_eq!(padded(&[1, 2, 3, 4, 5]).as_ref(), &[1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn buffer_kinds_are_copy_destinations() {
        for kind in [BufferKind::Vertex, BufferKind::Index, BufferKind::Uniform] {
            assert!(buffer_usages(kind).contains(wgpu::BufferUsages::COPY_DST));
        }
        assert!(buffer_usages(BufferKind::Index).contains(wgpu::BufferUsages::INDEX));
    }
}
