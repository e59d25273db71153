//! # Vertex Data Structures
//!
//! GPU-compatible vertex records and their attribute tables.

use std::mem::offset_of;

use crate::gfx::geometry::MeshVertex;
use crate::gpu::layout::{ComponentType, VertexAttributeDescriptor, VertexRecord};

/// A vertex with position and normal data, as read by the diffuse shader.
///
/// # Memory Layout
///
/// `#[repr(C)]`, 24 bytes, no padding:
/// - Attribute 0: position (3 × f32) at byte 0
/// - Attribute 1: normal (3 × f32) at byte 12
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DiffuseVertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
}

impl VertexRecord for DiffuseVertex {
    const ATTRIBUTES: &'static [VertexAttributeDescriptor] = &[
        VertexAttributeDescriptor::new(
            0,
            3,
            ComponentType::F32,
            offset_of!(DiffuseVertex, position) as u32,
        ),
        VertexAttributeDescriptor::new(
            1,
            3,
            ComponentType::F32,
            offset_of!(DiffuseVertex, normal) as u32,
        ),
    ];
}

// Field reorders or resizes must break the build, not the picture.
const _: () = {
    let attributes = DiffuseVertex::ATTRIBUTES;
    assert!(attributes[0].byte_offset as usize == offset_of!(DiffuseVertex, position));
    assert!(attributes[0].byte_size() as usize == std::mem::size_of::<[f32; 3]>());
    assert!(attributes[1].byte_offset as usize == offset_of!(DiffuseVertex, normal));
    assert!(attributes[1].byte_size() as usize == std::mem::size_of::<[f32; 3]>());
    assert!(std::mem::size_of::<DiffuseVertex>() == 24);
};

impl From<MeshVertex> for DiffuseVertex {
    fn from(vertex: MeshVertex) -> Self {
        Self {
            position: vertex.position,
            normal: vertex.normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::layout::VertexLayout;

    #[test]
    fn attribute_table_matches_record() {
        let layout = VertexLayout::of::<DiffuseVertex>().unwrap();
        assert_eq!(layout.stride(), 24);
        assert_eq!(layout.attributes()[1].byte_offset, 12);
    }
}
