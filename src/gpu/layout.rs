//! Vertex attribute descriptors
//!
//! A vertex record declares its attribute table next to its definition through
//! [`VertexRecord`]. [`VertexLayout`] checks that table against the record's real
//! byte layout before any vertex array is configured with it.

use super::error::GpuError;

/// Scalar type of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    F32,
    U32,
    I32,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size(self) -> u32 {
        match self {
            ComponentType::F32 | ComponentType::U32 | ComponentType::I32 => 4,
        }
    }
}

/// Maps one shader input location onto bytes of a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    pub location: u32,
    pub component_count: u32,
    pub component_type: ComponentType,
    pub byte_offset: u32,
}

impl VertexAttributeDescriptor {
    pub const fn new(
        location: u32,
        component_count: u32,
        component_type: ComponentType,
        byte_offset: u32,
    ) -> Self {
        Self {
            location,
            component_count,
            component_type,
            byte_offset,
        }
    }

    /// Number of bytes the attribute occupies inside the record
    pub const fn byte_size(&self) -> u32 {
        self.component_count * self.component_type.size()
    }

    /// One past the last byte of the attribute
    pub const fn byte_end(&self) -> u32 {
        self.byte_offset + self.byte_size()
    }
}

/// A `#[repr(C)]` vertex record with its attribute table.
///
/// Implementors should pin the table to the record with `std::mem::offset_of!`
/// in a `const` assertion so that a field reorder fails the build.
pub trait VertexRecord: bytemuck::Pod {
    const ATTRIBUTES: &'static [VertexAttributeDescriptor];
}

/// A validated attribute table plus the stride of one vertex record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    stride: u32,
    attributes: Vec<VertexAttributeDescriptor>,
}

impl VertexLayout {
    /// Validates `attributes` against a record of `stride` bytes.
    ///
    /// Rejects empty tables, duplicate locations, component counts outside
    /// 1..=4, misaligned offsets, attributes that leave the record and
    /// attributes that overlap each other.
    pub fn new(stride: u32, attributes: &[VertexAttributeDescriptor]) -> Result<Self, GpuError> {
        if stride == 0 || stride % 4 != 0 {
            return Err(GpuError::LayoutMismatch(format!(
                "stride {stride} must be a non-zero multiple of 4"
            )));
        }
        if attributes.is_empty() {
            return Err(GpuError::LayoutMismatch("no attributes".to_owned()));
        }

        let mut sorted = attributes.to_vec();
        sorted.sort_by_key(|a| a.byte_offset);

        for (i, attribute) in sorted.iter().enumerate() {
            if !(1..=4).contains(&attribute.component_count) {
                return Err(GpuError::LayoutMismatch(format!(
                    "location {} has {} components",
                    attribute.location, attribute.component_count
                )));
            }
            if attribute.byte_offset % attribute.component_type.size() != 0 {
                return Err(GpuError::LayoutMismatch(format!(
                    "location {} is misaligned at offset {}",
                    attribute.location, attribute.byte_offset
                )));
            }
            if attribute.byte_end() > stride {
                return Err(GpuError::LayoutMismatch(format!(
                    "location {} ends at byte {} but the record is {} bytes",
                    attribute.location,
                    attribute.byte_end(),
                    stride
                )));
            }
            if sorted[..i].iter().any(|a| a.location == attribute.location) {
                return Err(GpuError::LayoutMismatch(format!(
                    "location {} declared twice",
                    attribute.location
                )));
            }
            if let Some(previous) = i.checked_sub(1).map(|p| &sorted[p]) {
                if previous.byte_end() > attribute.byte_offset {
                    return Err(GpuError::LayoutMismatch(format!(
                        "locations {} and {} overlap",
                        previous.location, attribute.location
                    )));
                }
            }
        }

        Ok(Self {
            stride,
            attributes: attributes.to_vec(),
        })
    }

    /// Layout of a [`VertexRecord`] using its declared attribute table
    pub fn of<V: VertexRecord>() -> Result<Self, GpuError> {
        Self::new(std::mem::size_of::<V>() as u32, V::ATTRIBUTES)
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn attributes(&self) -> &[VertexAttributeDescriptor] {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: VertexAttributeDescriptor =
        VertexAttributeDescriptor::new(0, 3, ComponentType::F32, 0);
    const NORMAL: VertexAttributeDescriptor =
        VertexAttributeDescriptor::new(1, 3, ComponentType::F32, 12);

    #[test]
    fn accepts_packed_layout() {
        let layout = VertexLayout::new(24, &[POSITION, NORMAL]).unwrap();
        assert_eq!(layout.stride(), 24);
        assert_eq!(layout.attributes().len(), 2);
    }

    #[test]
    fn rejects_overlapping_attributes() {
        let normal = VertexAttributeDescriptor::new(1, 3, ComponentType::F32, 8);
        let err = VertexLayout::new(24, &[POSITION, normal]).unwrap_err();
        assert!(matches!(err, GpuError::LayoutMismatch(_)));
    }

    #[test]
    fn rejects_attribute_outside_record() {
        let err = VertexLayout::new(20, &[POSITION, NORMAL]).unwrap_err();
        assert!(matches!(err, GpuError::LayoutMismatch(_)));
    }

    #[test]
    fn rejects_duplicate_location() {
        let normal = VertexAttributeDescriptor::new(0, 3, ComponentType::F32, 12);
        assert!(VertexLayout::new(24, &[POSITION, normal]).is_err());
    }

    #[test]
    fn rejects_bad_component_count_and_alignment() {
        let wide = VertexAttributeDescriptor::new(0, 5, ComponentType::F32, 0);
        assert!(VertexLayout::new(24, &[wide]).is_err());

        let misaligned = VertexAttributeDescriptor::new(0, 1, ComponentType::U32, 2);
        assert!(VertexLayout::new(8, &[misaligned]).is_err());

        assert!(VertexLayout::new(0, &[POSITION]).is_err());
        assert!(VertexLayout::new(24, &[]).is_err());
    }
}
