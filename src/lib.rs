// src/lib.rs
//! Diorama
//!
//! A single-scene renderer built on wgpu and winit. An imported mesh is merged
//! into one vertex and index buffer, GPU objects go through explicit
//! create/bind/upload/release lifecycles and every frame runs the same
//! ordered sequence, ending with a Dear ImGui overlay.

pub mod app;
pub mod config;
pub mod frame_loop;
pub mod gfx;
pub mod gpu;
pub mod platform;
pub mod ui;

// Re-export main types for convenience
pub use app::{DioramaApp, StartupError};
pub use config::SceneConfig;
pub use frame_loop::{FrameLoop, Overlay};
