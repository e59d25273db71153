use cgmath::{Deg, Matrix4, One, Quaternion, Rotation3, Vector3};

/// Translation, rotation and scale of one scene entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves by `offset` (adds to the current translation)
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.translation += offset;
    }

    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.translation = translation;
    }

    pub fn rotate_x(&mut self, angle: Deg<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_x(angle);
    }

    pub fn rotate_y(&mut self, angle: Deg<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_y(angle);
    }

    pub fn rotate_z(&mut self, angle: Deg<f32>) {
        self.rotation = self.rotation * Quaternion::from_angle_z(angle);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    pub fn set_scale_xyz(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
    }

    /// `T * R * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{SquareMatrix, Vector4};

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::new().matrix(), Matrix4::identity());
    }

    #[test]
    fn translate_accumulates() {
        let mut transform = Transform::new();
        transform.translate(Vector3::new(0.0, 0.0, -10.0));
        transform.translate(Vector3::new(0.0, 0.0, -10.0));
        assert_eq!(transform.matrix().w, Vector4::new(0.0, 0.0, -20.0, 1.0));
    }

    #[test]
    fn scale_is_applied_before_rotation_and_translation() {
        let mut transform = Transform::new();
        transform.set_scale(2.0);
        transform.rotate_z(Deg(90.0));
        transform.translate(Vector3::new(1.0, 0.0, 0.0));

        let moved = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(moved.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(moved.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(moved.z, 0.0, epsilon = 1e-5);
    }
}
