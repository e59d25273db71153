//! Uniform buffer payloads
//!
//! Per-frame data handed to the diffuse shader through three uniform buffers:
//! the transform matrices (binding 0), the material (binding 1) and the
//! directional light (binding 2). Every struct here MUST match its counterpart
//! in `assets/diffuse_shader.wgsl` byte for byte (std140 rules: `vec3` fields
//! are padded to 16 bytes).

use cgmath::{Matrix4, SquareMatrix};
use serde::{Deserialize, Serialize};

use crate::gfx::rendering::render_pass::Rgb;

/// Uniform binding point of the matrices buffer
pub const MATRICES_BINDING: u32 = 0;
/// Uniform binding point of the material buffer
pub const MATERIAL_BINDING: u32 = 1;
/// Uniform binding point of the light buffer
pub const LIGHT_BINDING: u32 = 2;

/// Model, view and projection matrices, column major.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameMatrices {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}
// Total: 3 * 64 = 192 bytes

impl FrameMatrices {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            model: model.into(),
            view: view.into(),
            projection: projection.into(),
        }
    }
}

impl Default for FrameMatrices {
    fn default() -> Self {
        let identity = Matrix4::<f32>::identity();
        Self::new(identity, identity, identity)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 3],
    _padding: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    _padding0: f32,
    pub color: [f32; 3],
    _padding1: f32,
}

/// Flat surface color of the scene geometry
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Rgb,
}

impl Material {
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: self.color,
            _padding: 0.0,
        }
    }
}

/// Directional light; the shader lights along the direction from `position`
/// towards the origin.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: [f32; 3],
    pub color: Rgb,
}

impl Light {
    pub fn new(position: [f32; 3], color: Rgb) -> Self {
        Self { position, color }
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            position: self.position,
            _padding0: 0.0,
            color: self.color,
            _padding1: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn payload_sizes_match_shader_layout() {
        assert_eq!(size_of::<FrameMatrices>(), 192);
        assert_eq!(size_of::<MaterialUniform>(), 16);
        assert_eq!(size_of::<LightUniform>(), 32);
        assert_eq!(offset_of!(LightUniform, color), 16);
    }

    #[test]
    fn matrices_are_column_major() {
        let model = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let matrices = FrameMatrices::new(model, Matrix4::identity(), Matrix4::identity());
        assert_eq!(matrices.model[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
