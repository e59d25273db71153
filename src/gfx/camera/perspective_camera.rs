use cgmath::{perspective, Deg, Matrix4};
use serde::{Deserialize, Serialize};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective projection. Where the camera sits is a separate
/// [`Transform`](crate::gfx::scene::Transform) used as the view matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl Camera {
    pub fn new(fov_y: f32) -> Self {
        Self {
            fov_y,
            aspect: 1.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    /// Recomputes the aspect ratio for a `width` x `height` target.
    ///
    /// A zero height (minimized window) keeps the previous aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Projection matrix in wgpu clip space (depth in `0..1`)
    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov_y), self.aspect, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Vector4, Zero};

    #[test]
    fn resize_tracks_aspect_ratio() {
        let mut camera = Camera::new(60.0);
        camera.resize(1024, 768);
        assert_relative_eq!(camera.aspect, 4.0 / 3.0);

        camera.resize(800, 0);
        assert_relative_eq!(camera.aspect, 4.0 / 3.0);
    }

    #[test]
    fn projection_maps_near_and_far_to_wgpu_depth() {
        let camera = Camera::new(60.0);
        let projection = camera.projection();

        let near = projection * Vector4::new(0.0, 0.0, -camera.znear, 1.0);
        let far = projection * Vector4::new(0.0, 0.0, -camera.zfar, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn depth_correction_leaves_x_y_and_w_alone() {
        let camera = Camera::new(60.0);
        let gl = perspective(Deg(camera.fov_y), camera.aspect, camera.znear, camera.zfar);
        let point = Vector4::new(1.5, -2.0, -20.0, 1.0);

        let corrected = camera.projection() * point;
        let uncorrected = gl * point;
        assert_relative_eq!(corrected.x, uncorrected.x, epsilon = 1e-5);
        assert_relative_eq!(corrected.y, uncorrected.y, epsilon = 1e-5);
        assert_relative_eq!(corrected.w, 20.0, epsilon = 1e-5);
        assert_relative_eq!(corrected.z, 0.5 * (uncorrected.z + uncorrected.w), epsilon = 1e-4);
    }

    #[test]
    fn projection_changes_with_aspect() {
        let mut camera = Camera::new(60.0);
        let square = camera.projection();
        camera.resize(1920, 1080);
        assert_ne!(square, camera.projection());
        assert!(!camera.projection().x.is_zero());
    }
}
