//! Frame orchestration
//!
//! One iteration reads the window, lets the overlay build its UI, clears,
//! re-uploads every per-frame uniform, draws the active submesh, draws the
//! overlay on top and presents. The order is fixed; the uniforms a draw reads
//! are always the ones written earlier in the same iteration.

use crate::gfx::{rendering::render_pass::RenderPass, scene::Scene, scene::SceneResources};
use crate::gpu::{GpuBackend, GpuBuffer, GpuContext, GpuError};
use crate::platform::{Extent2d, PlatformWindow, Time};

/// Inputs of one iteration, as read at its start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub size: Extent2d,
    /// Seconds since the loop was created
    pub total_time: f32,
    pub frame: u64,
}

/// A debug UI drawn after the scene.
///
/// `E` is the window event type the overlay consumes.
pub trait Overlay<B: GpuBackend, E> {
    /// Starts the UI frame. The overlay may edit the render pass (clear color)
    /// before it is cleared.
    fn begin(&mut self, frame: &FrameInfo, events: &[E], render_pass: &mut RenderPass);

    fn end(&mut self);

    /// Draws on top of the scene. `matrices` already holds this frame's upload.
    fn draw(&mut self, ctx: &mut GpuContext<B>, matrices: &GpuBuffer) -> Result<(), GpuError>;
}

/// An overlay that draws nothing
#[derive(Debug, Default)]
pub struct NoOverlay;

impl<B: GpuBackend, E> Overlay<B, E> for NoOverlay {
    fn begin(&mut self, _frame: &FrameInfo, _events: &[E], _render_pass: &mut RenderPass) {}

    fn end(&mut self) {}

    fn draw(&mut self, _ctx: &mut GpuContext<B>, _matrices: &GpuBuffer) -> Result<(), GpuError> {
        Ok(())
    }
}

pub struct FrameLoop<B: GpuBackend> {
    ctx: GpuContext<B>,
    scene: Scene,
    resources: SceneResources,
    render_pass: RenderPass,
    time: Time,
}

impl<B: GpuBackend> FrameLoop<B> {
    pub fn new(
        ctx: GpuContext<B>,
        scene: Scene,
        resources: SceneResources,
        render_pass: RenderPass,
    ) -> Self {
        Self {
            ctx,
            scene,
            resources,
            render_pass,
            time: Time::new(),
        }
    }

    /// Runs frames until the window is closed; returns the number of frames
    /// presented.
    pub fn run<W, O>(&mut self, window: &mut W, overlay: &mut O) -> Result<u64, GpuError>
    where
        W: PlatformWindow,
        O: Overlay<B, W::Event>,
    {
        let first = self.ctx.frame_index();
        log::info!("entering frame loop");
        while !window.closed() {
            self.frame(window, overlay)?;
        }
        let frames = self.ctx.frame_index() - first;
        log::info!(
            "frame loop finished after {} frames ({:.1}s)",
            frames,
            self.time.total_time()
        );
        Ok(frames)
    }

    /// Runs one iteration.
    pub fn frame<W, O>(&mut self, window: &mut W, overlay: &mut O) -> Result<(), GpuError>
    where
        W: PlatformWindow,
        O: Overlay<B, W::Event>,
    {
        let info = FrameInfo {
            size: window.size(),
            total_time: self.time.total_time(),
            frame: self.ctx.frame_index(),
        };
        let events = window.drain_events();

        self.scene.camera.resize(info.size.width, info.size.height);

        overlay.begin(&info, &events, &mut self.render_pass);
        overlay.end();

        self.render_pass.viewport([0, 0], info.size);
        self.render_pass.clear_buffers(&mut self.ctx)?;

        let matrices = self.scene.frame_matrices();
        self.resources.upload_frame(
            &mut self.ctx,
            &matrices,
            &self.scene.material.uniform(),
            &self.scene.light.uniform(),
        )?;

        self.resources.draw(&mut self.ctx)?;

        overlay.draw(&mut self.ctx, self.resources.matrices_buffer())?;

        self.ctx.present()?;
        window.update();
        Ok(())
    }

    /// Releases the scene's GPU objects. Safe to call more than once.
    pub fn release(&mut self) {
        self.resources.release(&mut self.ctx);
    }

    pub fn ctx(&self) -> &GpuContext<B> {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut GpuContext<B> {
        &mut self.ctx
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    pub fn render_pass_mut(&mut self) -> &mut RenderPass {
        &mut self.render_pass
    }

    pub fn resources(&self) -> &SceneResources {
        &self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::gfx::{
        geometry::{combine, MeshFragment, MeshVertex},
        rendering::render_pass::{Capabilities, ClearMask},
        resources::{
            shader::ShaderAsset,
            uniforms::{FrameMatrices, MATRICES_BINDING},
        },
    };
    use crate::gpu::headless::{Command, HeadlessBackend};
    use cgmath::{Deg, Vector3};

    struct StubWindow {
        size: Extent2d,
        frames_left: usize,
        pending: Vec<&'static str>,
    }

    impl StubWindow {
        fn new(frames: usize) -> Self {
            Self {
                size: Extent2d::new(1024, 768),
                frames_left: frames,
                pending: vec!["resized"],
            }
        }
    }

    impl PlatformWindow for StubWindow {
        type Event = &'static str;

        fn closed(&self) -> bool {
            self.frames_left == 0
        }

        fn size(&self) -> Extent2d {
            self.size
        }

        fn update(&mut self) {
            self.frames_left = self.frames_left.saturating_sub(1);
        }

        fn drain_events(&mut self) -> Vec<&'static str> {
            std::mem::take(&mut self.pending)
        }
    }

    /// Records call order and what the GPU had seen when `draw` ran
    #[derive(Default)]
    struct RecordingOverlay {
        calls: Vec<&'static str>,
        events_seen: usize,
        commands_at_draw: Vec<usize>,
        last_matrices: Option<FrameMatrices>,
        clear_color: Option<[f32; 3]>,
    }

    impl Overlay<HeadlessBackend, &'static str> for RecordingOverlay {
        fn begin(&mut self, _frame: &FrameInfo, events: &[&'static str], render_pass: &mut RenderPass) {
            self.calls.push("begin");
            self.events_seen += events.len();
            if let Some(color) = self.clear_color {
                render_pass.clear_color(color);
            }
        }

        fn end(&mut self) {
            self.calls.push("end");
        }

        fn draw(
            &mut self,
            ctx: &mut GpuContext<HeadlessBackend>,
            matrices: &GpuBuffer,
        ) -> Result<(), GpuError> {
            self.calls.push("draw");
            self.commands_at_draw.push(ctx.backend().commands().len());
            self.last_matrices = matrices.read::<FrameMatrices>();
            Ok(())
        }
    }

    fn card(name: &str) -> MeshFragment {
        let vertex = |x: f32, y: f32| MeshVertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coord: [0.0, 0.0],
        };
        MeshFragment::new(
            name,
            vec![vertex(-1.0, -1.0), vertex(1.0, -1.0), vertex(1.0, 1.0), vertex(-1.0, 1.0)],
            vec![[0, 1, 2], [2, 3, 0]],
        )
    }

    fn frame_loop() -> FrameLoop<HeadlessBackend> {
        let config = SceneConfig::default();
        let mut ctx = GpuContext::new(HeadlessBackend::new());
        let geometry = combine(&[card("card"), card("card_pair")]);
        let shader = ShaderAsset::new("diffuse", "fn vs_main() {} fn fs_main() {}").unwrap();
        let submesh = geometry.submesh(0).unwrap();
        let resources = SceneResources::create(&mut ctx, &geometry, &shader, submesh).unwrap();

        let mut render_pass = RenderPass::new(ClearMask::COLOR | ClearMask::DEPTH);
        render_pass.enable(Capabilities::DEPTH_TEST);
        render_pass.enable(Capabilities::MULTISAMPLE);
        render_pass.clear_color(config.render.clear_color);

        let mut frame_loop = FrameLoop::new(ctx, Scene::from_config(&config), resources, render_pass);
        frame_loop.ctx_mut().backend_mut().take_commands();
        frame_loop
    }

    fn draws(commands: &[Command]) -> Vec<&Command> {
        commands
            .iter()
            .filter(|c| matches!(c, Command::DrawIndexed { .. }))
            .collect()
    }

    #[test]
    fn frame_issues_commands_in_order() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(1);
        let mut overlay = RecordingOverlay::default();

        frame_loop.frame(&mut window, &mut overlay).unwrap();

        let commands = frame_loop.ctx().backend().commands();
        assert!(matches!(commands[0], Command::Clear { .. }));
        assert!(commands[1..4]
            .iter()
            .all(|c| matches!(c, Command::WriteBuffer { .. })));
        assert!(matches!(commands[4], Command::DrawIndexed { .. }));
        assert_eq!(commands[5], Command::Present);
        assert_eq!(commands.len(), 6);

        // overlay drew after the scene draw and before present
        assert_eq!(overlay.calls, ["begin", "end", "draw"]);
        assert_eq!(overlay.commands_at_draw, [5]);
        assert_eq!(overlay.events_seen, 1);
        assert!(window.closed());
    }

    #[test]
    fn draw_sees_matrices_of_the_same_iteration() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(2);
        let mut overlay = RecordingOverlay::default();

        frame_loop.frame(&mut window, &mut overlay).unwrap();
        frame_loop
            .scene_mut()
            .model_transform
            .translate(Vector3::new(3.0, 0.0, 0.0));
        frame_loop.scene_mut().model_transform.rotate_y(Deg(30.0));
        let expected = frame_loop.scene().frame_matrices();

        frame_loop.ctx_mut().backend_mut().take_commands();
        frame_loop.frame(&mut window, &mut overlay).unwrap();

        let commands = frame_loop.ctx().backend().commands();
        let draw = draws(commands)[0];
        let Command::DrawIndexed { uniforms, .. } = draw else {
            unreachable!()
        };
        let (slot, bytes) = &uniforms[0];
        assert_eq!(*slot, MATRICES_BINDING);
        assert_eq!(bytes.as_slice(), bytemuck::bytes_of(&expected));
        assert_eq!(overlay.last_matrices, Some(expected));
    }

    #[test]
    fn draws_only_the_active_submesh() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(1);
        frame_loop.run(&mut window, &mut NoOverlay).unwrap();

        let commands = frame_loop.ctx().backend().commands();
        let draw = draws(commands)[0];
        let Command::DrawIndexed { indices, .. } = draw else {
            unreachable!()
        };
        assert_eq!(*indices, 0..6);
    }

    #[test]
    fn overlay_edits_clear_color_before_clear() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(1);
        let mut overlay = RecordingOverlay {
            clear_color: Some([0.2, 0.2, 0.2]),
            ..Default::default()
        };

        frame_loop.frame(&mut window, &mut overlay).unwrap();

        let Command::Clear { color, .. } = &frame_loop.ctx().backend().commands()[0] else {
            unreachable!()
        };
        assert_eq!(*color, [0.2, 0.2, 0.2]);
    }

    #[test]
    fn viewport_and_camera_track_window_size() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(1);
        window.size = Extent2d::new(800, 400);
        frame_loop.frame(&mut window, &mut NoOverlay).unwrap();

        let Command::Clear { viewport, .. } = &frame_loop.ctx().backend().commands()[0] else {
            unreachable!()
        };
        assert_eq!(viewport.size, Extent2d::new(800, 400));
        assert_eq!(frame_loop.scene().camera.aspect, 2.0);
    }

    #[test]
    fn run_counts_frames_until_closed() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(3);
        let frames = frame_loop.run(&mut window, &mut NoOverlay).unwrap();

        assert_eq!(frames, 3);
        assert_eq!(draws(frame_loop.ctx().backend().commands()).len(), 3);
        frame_loop.release();
        assert_eq!(frame_loop.ctx().live_buffers(), 0);
    }

    #[test]
    fn redraw_after_present_is_stale() {
        let mut frame_loop = frame_loop();
        let mut window = StubWindow::new(1);
        frame_loop.frame(&mut window, &mut NoOverlay).unwrap();

        let FrameLoop { ctx, resources, .. } = &mut frame_loop;
        assert!(matches!(
            resources.draw(ctx),
            Err(GpuError::StaleUniform { .. })
        ));
    }
}
