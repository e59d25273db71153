use std::sync::Arc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::WindowConfig;

use super::{Extent2d, PlatformError, PlatformWindow};

/// Pumps allowed for the platform to deliver `resumed` after startup
const CREATE_ATTEMPTS: usize = 16;

/// The windowing system connection.
pub struct Platform {
    event_loop: EventLoop<()>,
}

impl Platform {
    pub fn init() -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        log::info!("platform initialised");
        Ok(Self { event_loop })
    }

    /// Opens the application window. The window takes over the event loop.
    pub fn create_window(mut self, config: &WindowConfig) -> Result<AppWindow, PlatformError> {
        let mut state = WindowState::new(
            Window::default_attributes()
                .with_title(config.title.clone())
                .with_inner_size(LogicalSize::new(config.width, config.height)),
        );

        for _ in 0..CREATE_ATTEMPTS {
            let status = self
                .event_loop
                .pump_app_events(Some(Duration::ZERO), &mut state);
            if let Some(err) = state.error.take() {
                return Err(PlatformError::Window(err));
            }
            if state.window.is_some() || matches!(status, PumpStatus::Exit(_)) {
                break;
            }
        }

        let window = state.window.clone().ok_or(PlatformError::NoWindow)?;
        state.size = window.inner_size().into();
        log::info!(
            "window '{}' created at {}x{}",
            config.title,
            state.size.width,
            state.size.height
        );

        Ok(AppWindow {
            window,
            state,
            event_loop: self.event_loop,
        })
    }
}

/// The application window plus the event loop feeding it.
///
/// Fields drop in declaration order, so the window goes before the event loop.
pub struct AppWindow {
    window: Arc<Window>,
    state: WindowState,
    event_loop: EventLoop<()>,
}

impl AppWindow {
    /// Shared handle for the graphics surface and the overlay
    pub fn handle(&self) -> Arc<Window> {
        self.window.clone()
    }
}

impl PlatformWindow for AppWindow {
    type Event = Event<()>;

    fn closed(&self) -> bool {
        self.state.closed
    }

    fn size(&self) -> Extent2d {
        self.state.size
    }

    fn update(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::info!("event loop exited with code {}", code);
            self.state.closed = true;
        }
    }

    fn drain_events(&mut self) -> Vec<Event<()>> {
        std::mem::take(&mut self.state.events)
    }
}

impl Drop for AppWindow {
    fn drop(&mut self) {
        log::info!("destroying window");
    }
}

struct WindowState {
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    error: Option<winit::error::OsError>,
    closed: bool,
    size: Extent2d,
    events: Vec<Event<()>>,
}

impl WindowState {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes,
            window: None,
            error: None,
            closed: false,
            size: Extent2d::default(),
            events: Vec::new(),
        }
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                self.closed = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.closed = true;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}x{}", size.width, size.height);
                self.size = (*size).into();
            }
            _ => {}
        }
        self.events.push(Event::WindowEvent { window_id, event });
    }
}
