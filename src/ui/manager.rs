//! ImGui editor overlay
//!
//! Handles ImGui integration with wgpu and winit. The UI is built in
//! [`Overlay::begin`] and rendered on top of the scene in [`Overlay::draw`],
//! loading the already drawn frame instead of clearing it.

use std::sync::Arc;
use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use winit::{event::Event, window::Window};

use crate::frame_loop::{FrameInfo, Overlay};
use crate::gfx::{
    rendering::{render_engine::WgpuBackend, render_pass::RenderPass},
    resources::uniforms::FrameMatrices,
};
use crate::gpu::{GpuBuffer, GpuContext, GpuError};

use super::panel::{EditorState, EditorWindow};

const FONT_SIZE: f32 = 16.0;

/// The debug UI: an ImGui context plus the windows it shows
pub struct Editor {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    window: Arc<Window>,
    windows: Vec<Box<dyn EditorWindow>>,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    /// Matrices read back at the last draw
    matrices: FrameMatrices,
    /// A UI frame was built and not rendered yet
    pending_frame: bool,
    wants_input: bool,
}

impl Editor {
    /// Sets up ImGui for `window`, rendering into the backend's surface format.
    ///
    /// Uses locked DPI mode; the display size follows the window size each frame.
    pub fn init(window: Arc<Window>, backend: &WgpuBackend) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), &window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: backend.surface_format(),
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, backend.device(), backend.queue(), renderer_config);
        log::info!("editor initialised");

        Self {
            context,
            platform,
            renderer,
            window,
            windows: Vec::new(),
            last_frame: Instant::now(),
            last_cursor: None,
            matrices: FrameMatrices::default(),
            pending_frame: false,
            wants_input: false,
        }
    }

    pub fn add_window(&mut self, window: Box<dyn EditorWindow>) {
        log::debug!("editor window '{}' added", window.name());
        self.windows.push(window);
    }

    /// Whether the UI captured mouse or keyboard input in the last frame
    pub fn wants_input(&self) -> bool {
        self.wants_input
    }
}

impl Overlay<WgpuBackend, Event<()>> for Editor {
    fn begin(&mut self, frame: &FrameInfo, events: &[Event<()>], render_pass: &mut RenderPass) {
        if self.pending_frame {
            // previous frame never reached draw
            self.context.render();
            self.pending_frame = false;
        }

        for event in events {
            self.platform
                .handle_event(self.context.io_mut(), &self.window, event);
        }

        let now = Instant::now();
        let io = self.context.io_mut();
        io.update_delta_time(now - self.last_frame);
        io.display_size = [frame.size.width as f32, frame.size.height as f32];
        self.last_frame = now;

        if let Err(err) = self.platform.prepare_frame(self.context.io_mut(), &self.window) {
            log::warn!("editor frame skipped: {}", err);
            return;
        }

        let ui = self.context.frame();
        let mut state = EditorState {
            frame,
            render_pass,
            matrices: &self.matrices,
        };
        for window in &mut self.windows {
            window.build(ui, &mut state);
        }

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, &self.window);
        }
        self.pending_frame = true;
    }

    fn end(&mut self) {
        let io = self.context.io();
        self.wants_input = io.want_capture_mouse || io.want_capture_keyboard;
    }

    fn draw(&mut self, ctx: &mut GpuContext<WgpuBackend>, matrices: &GpuBuffer) -> Result<(), GpuError> {
        if let Some(uploaded) = matrices.read::<FrameMatrices>() {
            self.matrices = uploaded;
        }
        if !self.pending_frame {
            return Ok(());
        }
        self.pending_frame = false;

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return Ok(());
        }

        let renderer = &mut self.renderer;
        let mut result = Ok(());
        ctx.backend_mut()
            .encode_overlay(|device, queue, encoder, view| {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("editor_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                result = renderer
                    .render(draw_data, queue, device, &mut pass)
                    .map_err(|err| GpuError::Backend(format!("editor render failed: {err:?}")));
            });
        result
    }
}
