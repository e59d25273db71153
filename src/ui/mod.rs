//! # User Interface Module
//!
//! Dear ImGui debug overlay drawn after the scene every frame.
//!
//! - [`Editor`] - ImGui integration with winit and wgpu, implements
//!   [`Overlay`](crate::frame_loop::Overlay)
//! - [`panel`] - the windows the editor shows

pub mod manager;
pub mod panel;

pub use manager::Editor;
pub use panel::{CameraWindow, EditorState, EditorWindow, RenderPassWindow};
