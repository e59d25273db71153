pub mod perspective_camera;

// Re-export main types
pub use perspective_camera::{Camera, OPENGL_TO_WGPU_MATRIX};
