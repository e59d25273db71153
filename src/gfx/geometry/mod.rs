//! # Scene Geometry
//!
//! Imported mesh fragments and their combination into one drawable geometry.
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::geometry::{combine, MeshImporter};
//!
//! let fragments = MeshImporter::load("assets/match_cards.obj").unwrap();
//! let geometry = combine(&fragments);
//! let card = geometry[0];
//! ```

pub mod combine;
pub mod importer;

pub use combine::{check_local_indices, combine, try_combine, CombinedGeometry, GeometryError, SubMesh};
pub use importer::{ImportError, MeshImporter};

/// One imported vertex with every semantic channel the importer provides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// An independent piece of imported geometry.
///
/// Faces reference vertices by index into this fragment's own vertex list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshFragment {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshFragment {
    pub fn new(name: &str, vertices: Vec<MeshVertex>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.to_owned(),
            vertices,
            faces,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of index elements (three per face)
    pub fn index_count(&self) -> usize {
        self.faces.len() * 3
    }
}
