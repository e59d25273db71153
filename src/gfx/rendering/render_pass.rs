//! The scene render pass
//!
//! Holds the state the frame loop sets before every draw: which attachments get
//! cleared, which fixed-function capabilities are on, the clear color and the
//! viewport. `clear_buffers` hands the state to the backend, which opens the
//! frame with it.

use bitflags::bitflags;

use crate::gpu::{GpuBackend, GpuContext, GpuError};
use crate::platform::Extent2d;

/// Linear RGB color, each channel in `0.0..=1.0`
pub type Rgb = [f32; 3];

bitflags! {
    /// Attachments cleared at the start of the pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

bitflags! {
    /// Fixed-function state of the pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const DEPTH_TEST = 1 << 0;
        const MULTISAMPLE = 1 << 1;
    }
}

/// Pixel rectangle the pass renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub origin: [i32; 2],
    pub size: Extent2d,
}

/// Snapshot of a [`RenderPass`] as handed to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassState {
    pub clear_mask: ClearMask,
    pub capabilities: Capabilities,
    pub clear_color: Rgb,
    pub viewport: Viewport,
}

#[derive(Debug)]
pub struct RenderPass {
    state: RenderPassState,
    locked: bool,
}

impl RenderPass {
    pub fn new(clear_mask: ClearMask) -> Self {
        Self {
            state: RenderPassState {
                clear_mask,
                capabilities: Capabilities::empty(),
                clear_color: [0.0, 0.0, 0.0],
                viewport: Viewport::default(),
            },
            locked: false,
        }
    }

    /// Turns on `capability` for the pass.
    ///
    /// Capabilities are fixed once the first frame has been cleared; later
    /// calls are ignored.
    pub fn enable(&mut self, capability: Capabilities) {
        if self.locked {
            if !self.state.capabilities.contains(capability) {
                log::warn!(
                    "ignoring enable({:?}): capabilities are fixed after the first clear",
                    capability
                );
            }
            return;
        }
        self.state.capabilities |= capability;
    }

    pub fn clear_color(&mut self, color: Rgb) {
        self.state.clear_color = color;
    }

    pub fn viewport(&mut self, origin: [i32; 2], size: Extent2d) {
        self.state.viewport = Viewport { origin, size };
    }

    /// Clears the attachments selected by the clear mask and opens the frame.
    pub fn clear_buffers<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        if !self.locked {
            log::debug!("render pass capabilities: {:?}", self.state.capabilities);
            self.locked = true;
        }
        ctx.clear(&self.state)
    }

    pub fn state(&self) -> &RenderPassState {
        &self.state
    }

    pub fn current_clear_color(&self) -> Rgb {
        self.state.clear_color
    }

    pub fn capabilities(&self) -> Capabilities {
        self.state.capabilities
    }
}
