//! Geometry combination
//!
//! Merges an ordered list of [`MeshFragment`]s into one vertex list and one index
//! list. Indices are rebased by the number of vertices emitted before their
//! fragment, and each fragment gets a [`SubMesh`] describing its slice of the
//! index list. The output preserves input order; `combine([a, b])` and
//! `combine([b, a])` lay out differently.

use std::ops::{Index, Range};

use super::{MeshFragment, MeshVertex};
use crate::gfx::scene::vertex::DiffuseVertex;

/// Slice of the combined index buffer that belongs to one input fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubMesh {
    /// First index element
    pub offset: u32,
    /// Number of index elements
    pub count: u32,
}

impl SubMesh {
    /// Element range inside the index buffer
    pub fn range(&self) -> Range<u32> {
        self.offset..self.offset + self.count
    }
}

/// Broken combined-geometry invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("submesh {submesh} starts at {offset}, expected {expected}")]
    Gap {
        submesh: usize,
        offset: u32,
        expected: u32,
    },

    #[error("submeshes cover {covered} indices but the index buffer holds {total}")]
    Coverage { covered: u32, total: u32 },

    #[error("fragment '{fragment}' references vertex {index} but has {vertex_count}")]
    LocalIndexOutOfRange {
        fragment: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("index {index} at position {position} is not below the vertex count {vertex_count}")]
    IndexOutOfBounds {
        position: usize,
        index: u32,
        vertex_count: u32,
    },
}

/// One vertex list, one index list and the submesh table of the fragments
/// they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedGeometry<V = DiffuseVertex> {
    vertices: Vec<V>,
    indices: Vec<u32>,
    submeshes: Vec<SubMesh>,
}

/// Combines `fragments` into [`DiffuseVertex`] geometry.
///
/// Face indices must address the fragment's own vertices; see [`try_combine`]
/// for fragments that are not known to be well formed.
pub fn combine(fragments: &[MeshFragment]) -> CombinedGeometry {
    CombinedGeometry::combine_as(fragments)
}

/// [`combine`], rejecting any fragment whose faces reach past its own vertices.
pub fn try_combine(fragments: &[MeshFragment]) -> Result<CombinedGeometry, GeometryError> {
    CombinedGeometry::try_combine_as(fragments)
}

/// Checks every face index of `fragment` against its own vertex count.
pub fn check_local_indices(fragment: &MeshFragment) -> Result<(), GeometryError> {
    let vertex_count = fragment.vertex_count();
    match fragment
        .faces
        .iter()
        .flatten()
        .find(|&&index| index as usize >= vertex_count)
    {
        Some(&index) => Err(GeometryError::LocalIndexOutOfRange {
            fragment: fragment.name.clone(),
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

impl<V: From<MeshVertex>> CombinedGeometry<V> {
    /// Checked [`combine_as`](Self::combine_as).
    pub fn try_combine_as(fragments: &[MeshFragment]) -> Result<Self, GeometryError> {
        for fragment in fragments {
            check_local_indices(fragment)?;
        }
        let geometry = Self::combine_as(fragments);
        geometry.validate()?;
        Ok(geometry)
    }

    /// Combines `fragments`, converting every vertex into `V`.
    pub fn combine_as(fragments: &[MeshFragment]) -> Self {
        debug_assert!(
            fragments.iter().all(|f| check_local_indices(f).is_ok()),
            "fragment face index outside its own vertex list"
        );
        let vertex_total: usize = fragments.iter().map(MeshFragment::vertex_count).sum();
        let index_total: usize = fragments.iter().map(MeshFragment::index_count).sum();
        debug_assert!(vertex_total <= u32::MAX as usize, "too many vertices for u32 indices");

        let mut vertices = Vec::with_capacity(vertex_total);
        let mut indices = Vec::with_capacity(index_total);
        let mut submeshes = Vec::with_capacity(fragments.len());

        for fragment in fragments {
            let vertex_offset = vertices.len() as u32;
            let index_offset = indices.len() as u32;

            vertices.extend(fragment.vertices.iter().copied().map(V::from));
            indices.extend(
                fragment
                    .faces
                    .iter()
                    .flatten()
                    .map(|&local| local + vertex_offset),
            );

            submeshes.push(SubMesh {
                offset: index_offset,
                count: indices.len() as u32 - index_offset,
            });
        }

        let geometry = Self {
            vertices,
            indices,
            submeshes,
        };
        debug_assert_eq!(geometry.validate(), Ok(()));
        geometry
    }
}

impl<V> CombinedGeometry<V> {
    /// Checks that the submeshes partition the index buffer and that every
    /// index addresses an existing vertex.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let mut expected = 0u32;
        for (i, submesh) in self.submeshes.iter().enumerate() {
            if submesh.offset != expected {
                return Err(GeometryError::Gap {
                    submesh: i,
                    offset: submesh.offset,
                    expected,
                });
            }
            expected += submesh.count;
        }
        if expected as usize != self.indices.len() {
            return Err(GeometryError::Coverage {
                covered: expected,
                total: self.indices.len() as u32,
            });
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index >= vertex_count)
        {
            return Err(GeometryError::IndexOutOfBounds {
                position,
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    pub fn submesh(&self, index: usize) -> Option<SubMesh> {
        self.submeshes.get(index).copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submeshes.is_empty()
    }
}

impl<V> Index<usize> for CombinedGeometry<V> {
    type Output = SubMesh;

    fn index(&self, index: usize) -> &SubMesh {
        &self.submeshes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fragment with `vertex_count` distinct vertices; vertex `i` sits at x = i.
    fn fragment(name: &str, vertex_count: usize, faces: &[[u32; 3]]) -> MeshFragment {
        let vertices = (0..vertex_count)
            .map(|i| MeshVertex {
                position: [i as f32, 0.0, 0.0],
                normal: [0.0, 0.0, 1.0],
                tex_coord: [0.0, 0.0],
            })
            .collect();
        MeshFragment::new(name, vertices, faces.to_vec())
    }

    fn card_a() -> MeshFragment {
        fragment("a", 4, &[[0, 1, 2], [2, 3, 0], [1, 3, 2]])
    }

    fn card_b() -> MeshFragment {
        fragment("b", 6, &[[0, 1, 2], [3, 4, 5]])
    }

    #[test]
    fn two_fragment_scenario() {
        let geometry = combine(&[card_a(), card_b()]);

        assert_eq!(geometry.vertex_count(), 10);
        assert_eq!(geometry.index_count(), 15);
        assert_eq!(geometry[0], SubMesh { offset: 0, count: 9 });
        assert_eq!(geometry[1], SubMesh { offset: 9, count: 6 });

        let b = card_b();
        let local: Vec<u32> = b.faces.iter().flatten().copied().collect();
        let rebased = &geometry.indices()[geometry[1].range().start as usize..];
        for (global, local) in rebased.iter().zip(&local) {
            assert_eq!(*global, local + 4);
        }
    }

    #[test]
    fn submeshes_partition_index_buffer() {
        let geometry = combine(&[card_b(), card_a(), card_b(), fragment("empty", 0, &[])]);

        let mut next = 0;
        for submesh in geometry.submeshes() {
            assert_eq!(submesh.offset, next);
            next += submesh.count;
        }
        assert_eq!(next as usize, geometry.index_count());
        assert_eq!(geometry.submesh(3), Some(SubMesh { offset: 21, count: 0 }));
        assert_eq!(geometry.validate(), Ok(()));
    }

    #[test]
    fn indices_stay_below_vertex_count() {
        let geometry = combine(&[card_a(), card_b(), card_a()]);
        let vertex_count = geometry.vertex_count() as u32;
        assert!(geometry.indices().iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn rebase_adds_fragment_vertex_offset() {
        let fragments = [card_b(), card_a(), card_b()];
        let geometry = combine(&fragments);

        let mut vertex_offset = 0;
        for (fragment, submesh) in fragments.iter().zip(geometry.submeshes()) {
            let produced = &geometry.indices()[submesh.range().start as usize..submesh.range().end as usize];
            let expected: Vec<u32> = fragment
                .faces
                .iter()
                .flatten()
                .map(|i| i + vertex_offset)
                .collect();
            assert_eq!(produced, expected.as_slice());
            vertex_offset += fragment.vertex_count() as u32;
        }
    }

    #[test]
    fn order_is_preserved_not_commutative() {
        let ab = combine(&[card_a(), card_b()]);
        let ba = combine(&[card_b(), card_a()]);

        assert_eq!(ab.submeshes()[0].count, 9);
        assert_eq!(ba.submeshes()[0].count, 6);
        assert_eq!(ba[1], SubMesh { offset: 6, count: 9 });
        assert_ne!(ab.indices(), ba.indices());

        // b's vertices follow a's four in ab and lead in ba
        assert_eq!(ab.vertices()[5].position, [1.0, 0.0, 0.0]);
        assert_eq!(ba.vertices()[5].position, [5.0, 0.0, 0.0]);
        assert_eq!(ba.vertices()[6].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn combine_is_deterministic() {
        let fragments = [card_a(), card_b()];
        assert_eq!(combine(&fragments), combine(&fragments));
    }

    #[test]
    fn empty_input_gives_empty_geometry() {
        let geometry = combine(&[]);
        assert!(geometry.vertices().is_empty());
        assert!(geometry.indices().is_empty());
        assert!(geometry.submeshes().is_empty());
        assert!(geometry.is_empty());
        assert_eq!(geometry.validate(), Ok(()));
    }

    #[test]
    fn face_reaching_into_next_fragment_is_rejected() {
        // global bounds alone would accept this: index 4 lands in b's vertices
        let a = fragment("a", 3, &[[0, 1, 4]]);
        let b = fragment("b", 4, &[[0, 1, 2]]);

        let err = try_combine(&[a.clone(), b.clone()]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::LocalIndexOutOfRange {
                fragment: "a".to_owned(),
                index: 4,
                vertex_count: 3,
            }
        );
        assert!(check_local_indices(&b).is_ok());
        assert!(check_local_indices(&a).is_err());
    }

    #[test]
    fn try_combine_matches_combine_for_valid_fragments() {
        let fragments = [card_a(), card_b()];
        assert_eq!(try_combine(&fragments), Ok(combine(&fragments)));
    }

    #[test]
    fn validate_reports_out_of_bounds_index() {
        let broken = CombinedGeometry::<DiffuseVertex> {
            vertices: vec![DiffuseVertex {
                position: [0.0; 3],
                normal: [0.0; 3],
            }],
            indices: vec![0, 0, 1],
            submeshes: vec![SubMesh { offset: 0, count: 3 }],
        };
        assert!(matches!(
            broken.validate(),
            Err(GeometryError::IndexOutOfBounds { index: 1, .. })
        ));
    }

    #[test]
    fn validate_reports_broken_partition() {
        let broken = CombinedGeometry::<DiffuseVertex> {
            vertices: Vec::new(),
            indices: Vec::new(),
            submeshes: vec![SubMesh { offset: 3, count: 0 }],
        };
        assert!(matches!(broken.validate(), Err(GeometryError::Gap { .. })));

        let short = CombinedGeometry::<DiffuseVertex> {
            vertices: vec![DiffuseVertex {
                position: [0.0; 3],
                normal: [0.0; 3],
            }],
            indices: vec![0, 0, 0],
            submeshes: Vec::new(),
        };
        assert!(matches!(short.validate(), Err(GeometryError::Coverage { .. })));
    }
}
