//! Platform layer
//!
//! Owns the winit event loop and the application window. The frame loop only
//! sees the [`PlatformWindow`] trait, so it can be driven by a real window or by
//! a stand-in in tests.

pub mod time;
pub mod window;

pub use time::Time;
pub use window::{AppWindow, Platform};

/// Width and height in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Extent2d {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("cannot create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("cannot create the window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("the event loop exited before the window was created")]
    NoWindow,
}

/// What the frame loop needs from a window.
pub trait PlatformWindow {
    /// Input events handed to the overlay
    type Event;

    /// Whether the user asked to close the window
    fn closed(&self) -> bool;

    /// Current drawable size
    fn size(&self) -> Extent2d;

    /// Processes pending platform events. Called once per frame, after present.
    fn update(&mut self);

    /// Events received since the last call
    fn drain_events(&mut self) -> Vec<Self::Event>;
}
