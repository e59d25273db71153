//! Application startup
//!
//! Acquires platform, window, graphics context, assets and GPU resources in
//! that order, runs the frame loop and releases everything on the way out.
//! Any startup failure is fatal; whatever was acquired before it is released.

use thiserror::Error;

use crate::config::{ConfigError, RenderConfig, SceneConfig};
use crate::frame_loop::{FrameLoop, Overlay};
use crate::gfx::{
    geometry::{try_combine, CombinedGeometry, GeometryError, ImportError, MeshImporter, SubMesh},
    rendering::{
        render_engine::WgpuBackend,
        render_pass::{Capabilities, ClearMask, RenderPass},
    },
    resources::{
        resource_manager::{ResourceError, ResourceManager},
        shader::ShaderAsset,
    },
    scene::{Scene, SceneResources},
};
use crate::gpu::{GpuBackend, GpuContext, GpuError};
use crate::platform::{Platform, PlatformError, PlatformWindow};
use crate::ui::{CameraWindow, Editor, RenderPassWindow};

/// Fatal errors of a run: everything that stops startup, plus a frame loop
/// that fails once running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("submesh {index} requested but the mesh has {count}")]
    SubmeshOutOfRange { index: usize, count: usize },
    /// A GPU failure after startup, while frames were running
    #[error("frame loop failed: {0}")]
    FrameLoop(#[source] GpuError),
}

pub struct DioramaApp {
    config: SceneConfig,
}

impl DioramaApp {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Opens the window and renders until it is closed. Returns the number of
    /// frames presented.
    pub fn run(&self) -> Result<u64, StartupError> {
        let platform = Platform::init()?;
        let mut window = platform.create_window(&self.config.window)?;

        let backend = WgpuBackend::new(window.handle(), window.size(), self.config.window.vsync)?;
        let mut ctx = GpuContext::new(backend);

        let mut assets = ResourceManager::new(&self.config.assets.root);
        let resources = load_scene(&mut ctx, &self.config, &mut assets)?;

        let mut editor = Editor::init(window.handle(), ctx.backend());
        editor.add_window(Box::new(RenderPassWindow));
        editor.add_window(Box::new(CameraWindow));

        let mut frame_loop = FrameLoop::new(
            ctx,
            Scene::from_config(&self.config),
            resources,
            render_pass(&self.config.render),
        );
        run_frames(&mut frame_loop, &mut window, &mut editor)
    }
}

/// Runs `frame_loop` until `window` closes and releases the scene whether or
/// not the loop failed.
pub fn run_frames<B, W, O>(
    frame_loop: &mut FrameLoop<B>,
    window: &mut W,
    overlay: &mut O,
) -> Result<u64, StartupError>
where
    B: GpuBackend,
    W: PlatformWindow,
    O: Overlay<B, W::Event>,
{
    let result = frame_loop.run(window, overlay);
    frame_loop.release();
    result.map_err(|err| {
        log::error!("frame loop stopped: {}", err);
        StartupError::FrameLoop(err)
    })
}

/// Imports the mesh, loads the shader and creates the scene's GPU resources.
///
/// Nothing is left allocated in `ctx` when this fails.
pub fn load_scene<B: GpuBackend>(
    ctx: &mut GpuContext<B>,
    config: &SceneConfig,
    assets: &mut ResourceManager,
) -> Result<SceneResources, StartupError> {
    let shader = assets.load::<ShaderAsset>(&config.assets.shader)?;
    let geometry = load_geometry(config)?;
    let submesh = select_submesh(&geometry, config.submesh)?;

    Ok(SceneResources::create(ctx, &geometry, &shader, submesh)?)
}

/// Imports and merges the configured mesh file.
pub fn load_geometry(config: &SceneConfig) -> Result<CombinedGeometry, StartupError> {
    let path = config.mesh_path();
    let fragments = MeshImporter::load(&path)?;
    let geometry = try_combine(&fragments)?;

    log::info!(
        "loaded {} with {} submeshes",
        path.display(),
        geometry.submeshes().len()
    );
    Ok(geometry)
}

pub fn select_submesh<V>(geometry: &CombinedGeometry<V>, index: usize) -> Result<SubMesh, StartupError> {
    geometry
        .submesh(index)
        .ok_or(StartupError::SubmeshOutOfRange {
            index,
            count: geometry.submeshes().len(),
        })
}

/// The scene pass: color and depth cleared, capabilities from the config
pub fn render_pass(config: &RenderConfig) -> RenderPass {
    let mut render_pass = RenderPass::new(ClearMask::COLOR | ClearMask::DEPTH);
    if config.depth_test {
        render_pass.enable(Capabilities::DEPTH_TEST);
    }
    if config.multisample {
        render_pass.enable(Capabilities::MULTISAMPLE);
    }
    render_pass.clear_color(config.clear_color);
    render_pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_loop::FrameInfo;
    use crate::gpu::{GpuBuffer, HeadlessBackend};
    use crate::platform::Extent2d;

    struct CountdownWindow(usize);

    impl PlatformWindow for CountdownWindow {
        type Event = ();

        fn closed(&self) -> bool {
            self.0 == 0
        }

        fn size(&self) -> Extent2d {
            Extent2d::new(640, 480)
        }

        fn update(&mut self) {
            self.0 = self.0.saturating_sub(1);
        }

        fn drain_events(&mut self) -> Vec<()> {
            Vec::new()
        }
    }

    /// Fails its draw on the given frame
    struct FailingOverlay {
        fail_at: u64,
    }

    impl Overlay<HeadlessBackend, ()> for FailingOverlay {
        fn begin(&mut self, _frame: &FrameInfo, _events: &[()], _render_pass: &mut RenderPass) {}

        fn end(&mut self) {}

        fn draw(
            &mut self,
            ctx: &mut GpuContext<HeadlessBackend>,
            _matrices: &GpuBuffer,
        ) -> Result<(), GpuError> {
            if ctx.frame_index() == self.fail_at {
                return Err(GpuError::Backend("overlay lost its device".to_owned()));
            }
            Ok(())
        }
    }

    fn headless_loop(config: &SceneConfig) -> FrameLoop<HeadlessBackend> {
        let mut assets = ResourceManager::new(&config.assets.root);
        let mut ctx = GpuContext::new(HeadlessBackend::new());
        let resources = load_scene(&mut ctx, config, &mut assets).unwrap();
        FrameLoop::new(ctx, Scene::from_config(config), resources, render_pass(&config.render))
    }

    fn bundled() -> (SceneConfig, ResourceManager) {
        let config = SceneConfig::load("assets/diorama.toml").unwrap();
        let assets = ResourceManager::new(&config.assets.root);
        (config, assets)
    }

    #[test]
    fn bundled_scene_loads_on_headless_backend() {
        let (config, mut assets) = bundled();
        let mut ctx = GpuContext::new(HeadlessBackend::new());

        let mut resources = load_scene(&mut ctx, &config, &mut assets).unwrap();
        let geometry = load_geometry(&config).unwrap();

        assert_eq!(resources.submesh(), geometry.submeshes()[0]);
        assert_eq!(geometry.submeshes().len(), 2);
        assert_eq!(ctx.live_buffers(), 5);

        resources.release(&mut ctx);
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn missing_submesh_fails_without_allocating() {
        let (mut config, mut assets) = bundled();
        config.submesh = 7;
        let mut ctx = GpuContext::new(HeadlessBackend::new());

        let err = load_scene(&mut ctx, &config, &mut assets).unwrap_err();
        assert!(matches!(
            err,
            StartupError::SubmeshOutOfRange { index: 7, count: 2 }
        ));
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn missing_mesh_is_an_import_error() {
        let (mut config, mut assets) = bundled();
        config.assets.mesh = "no_such_mesh.obj".to_owned();
        let mut ctx = GpuContext::new(HeadlessBackend::new());

        assert!(matches!(
            load_scene(&mut ctx, &config, &mut assets),
            Err(StartupError::Import(_))
        ));
    }

    #[test]
    fn run_frames_counts_frames_and_releases() {
        let (config, _) = bundled();
        let mut frame_loop = headless_loop(&config);
        let mut overlay = FailingOverlay { fail_at: u64::MAX };

        let frames = run_frames(&mut frame_loop, &mut CountdownWindow(3), &mut overlay).unwrap();
        assert_eq!(frames, 3);
        assert_eq!(frame_loop.ctx().live_buffers(), 0);
    }

    #[test]
    fn mid_run_failure_is_a_frame_loop_error_and_still_releases() {
        let (config, _) = bundled();
        let mut frame_loop = headless_loop(&config);
        let mut overlay = FailingOverlay { fail_at: 1 };

        let err = run_frames(&mut frame_loop, &mut CountdownWindow(5), &mut overlay).unwrap_err();
        assert!(matches!(err, StartupError::FrameLoop(GpuError::Backend(_))));
        assert_eq!(frame_loop.ctx().frame_index(), 1);
        assert_eq!(frame_loop.ctx().live_buffers(), 0);
    }

    #[test]
    fn render_pass_follows_config() {
        let config = RenderConfig {
            clear_color: [0.1, 0.2, 0.3],
            depth_test: true,
            multisample: false,
        };
        let pass = render_pass(&config);

        assert_eq!(pass.capabilities(), Capabilities::DEPTH_TEST);
        assert_eq!(pass.current_clear_color(), [0.1, 0.2, 0.3]);
        assert_eq!(pass.state().clear_mask, ClearMask::COLOR | ClearMask::DEPTH);
    }
}
