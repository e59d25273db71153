use cgmath::Vector3;

use crate::config::SceneConfig;
use crate::gfx::{
    camera::Camera,
    resources::uniforms::{FrameMatrices, Light, Material},
};

use super::transform::Transform;

/// The CPU-side state read by the frame loop every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    /// Used directly as the view matrix
    pub camera_transform: Transform,
    pub model_transform: Transform,
    pub material: Material,
    pub light: Light,
}

impl Scene {
    pub fn from_config(config: &SceneConfig) -> Self {
        let mut camera_transform = Transform::new();
        camera_transform.translate(Vector3::from(config.camera.position));

        Self {
            camera: Camera::new(config.camera.fov_y),
            camera_transform,
            model_transform: Transform::new(),
            material: config.material,
            light: config.light,
        }
    }

    /// Model, view and projection for the current state
    pub fn frame_matrices(&self) -> FrameMatrices {
        FrameMatrices::new(
            self.model_transform.matrix(),
            self.camera_transform.matrix(),
            self.camera.projection(),
        )
    }
}
