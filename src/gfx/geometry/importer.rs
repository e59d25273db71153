//! OBJ mesh import
//!
//! Loads a Wavefront OBJ file into one [`MeshFragment`] per object/group, in file
//! order. Faces are triangulated and every fragment gets its own vertex list
//! with local indices. Material libraries are ignored; surface appearance comes
//! from the scene configuration.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cgmath::{InnerSpace, Vector3, Zero};

use super::{MeshFragment, MeshVertex};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot open mesh file '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse mesh '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("fragment '{fragment}' is malformed: {reason}")]
    Malformed { fragment: String, reason: String },

    #[error("fragment '{fragment}' references vertex {index} but has {vertex_count} vertices")]
    IndexOutOfRange {
        fragment: String,
        index: u32,
        vertex_count: usize,
    },
}

pub struct MeshImporter;

impl MeshImporter {
    /// Loads every fragment of the OBJ file at `path`.
    ///
    /// Either the whole file imports or an error is returned; there are no
    /// partial results.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<MeshFragment>, ImportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let fragments = Self::parse(&mut BufReader::new(file), &path.display().to_string())?;

        log::info!(
            "imported {} fragments from '{}'",
            fragments.len(),
            path.display()
        );
        Ok(fragments)
    }

    /// Parses OBJ data from `reader`; `origin` names the source in errors.
    pub fn parse<R: BufRead>(reader: &mut R, origin: &str) -> Result<Vec<MeshFragment>, ImportError> {
        let (models, _materials) = tobj::load_obj_buf(
            reader,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ignore_points: true,
                ignore_lines: true,
                ..Default::default()
            },
            |_| Err(tobj::LoadError::OpenFileFailed),
        )
        .map_err(|source| ImportError::Parse {
            origin: origin.to_owned(),
            source,
        })?;

        models.iter().map(fragment_from_model).collect()
    }
}

fn fragment_from_model(model: &tobj::Model) -> Result<MeshFragment, ImportError> {
    let mesh = &model.mesh;
    let malformed = |reason: String| ImportError::Malformed {
        fragment: model.name.clone(),
        reason,
    };

    if mesh.positions.len() % 3 != 0 {
        return Err(malformed(format!(
            "{} position components is not a multiple of 3",
            mesh.positions.len()
        )));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(malformed(format!(
            "{} indices do not form whole triangles",
            mesh.indices.len()
        )));
    }
    let vertex_count = mesh.positions.len() / 3;

    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ImportError::IndexOutOfRange {
            fragment: model.name.clone(),
            index,
            vertex_count,
        });
    }
    if !mesh.texcoords.is_empty() && mesh.texcoords.len() != vertex_count * 2 {
        return Err(malformed(format!(
            "{} texture coordinates for {} vertices",
            mesh.texcoords.len() / 2,
            vertex_count
        )));
    }

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.clone()
    } else {
        log::debug!("fragment '{}' has no usable normals, computing them", model.name);
        calculate_face_normals(&mesh.positions, &mesh.indices)
    };

    let vertices = (0..vertex_count)
        .map(|i| MeshVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            tex_coord: if mesh.texcoords.is_empty() {
                [0.0, 0.0]
            } else {
                [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
            },
        })
        .collect();

    let faces = mesh
        .indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    Ok(MeshFragment::new(&model.name, vertices, faces))
}

/// Per-vertex normals averaged from the faces around each vertex.
///
/// `indices` must already be checked against the vertex count.
fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let position = |i: u32| {
        let i = i as usize * 3;
        Vector3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    let mut sums = vec![Vector3::<f32>::zero(); positions.len() / 3];

    for triangle in indices.chunks_exact(3) {
        let (v0, v1, v2) = (
            position(triangle[0]),
            position(triangle[1]),
            position(triangle[2]),
        );
        let face_normal = (v1 - v0).cross(v2 - v0);
        for &vertex in triangle {
            sums[vertex as usize] += face_normal;
        }
    }

    sums.into_iter()
        .flat_map(|sum| {
            let normal = if sum.magnitude2() > 0.0 {
                sum.normalize()
            } else {
                Vector3::unit_y()
            };
            [normal.x, normal.y, normal.z]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TWO_CARDS: &str = "\
o card_a
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1 4//1
o card_b
v 2.0 0.0 0.0
v 3.0 0.0 0.0
v 3.0 1.0 0.0
vn 0.0 0.0 1.0
f 5//2 6//2 7//2
";

    fn parse(source: &str) -> Result<Vec<MeshFragment>, ImportError> {
        MeshImporter::parse(&mut source.as_bytes(), "test.obj")
    }

    #[test]
    fn imports_fragments_in_file_order() {
        let fragments = parse(TWO_CARDS).unwrap();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].name, "card_a");
        assert_eq!(fragments[0].vertex_count(), 4);
        assert_eq!(fragments[0].faces.len(), 2);
        assert_eq!(fragments[1].name, "card_b");
        assert_eq!(fragments[1].vertex_count(), 3);
        assert_eq!(fragments[1].faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn indices_are_local_to_fragment() {
        for fragment in parse(TWO_CARDS).unwrap() {
            let count = fragment.vertex_count() as u32;
            assert!(fragment.faces.iter().flatten().all(|&i| i < count));
        }
    }

    #[test]
    fn computes_missing_normals() {
        let fragments = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let normal = fragments[0].vertices[0].normal;
        assert_relative_eq!(normal[0], 0.0);
        assert_relative_eq!(normal[1], 0.0);
        assert_relative_eq!(normal[2], 1.0);
        assert_eq!(fragments[0].vertices[2].tex_coord, [0.0, 0.0]);
    }

    fn model(name: &str, positions: Vec<f32>, indices: Vec<u32>) -> tobj::Model {
        tobj::Model::new(
            tobj::Mesh {
                positions,
                indices,
                ..Default::default()
            },
            name.to_owned(),
        )
    }

    const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

    #[test]
    fn face_outside_vertex_list_is_index_out_of_range() {
        let err = fragment_from_model(&model("tri", TRIANGLE.to_vec(), vec![0, 1, 9])).unwrap_err();
        match err {
            ImportError::IndexOutOfRange {
                fragment,
                index,
                vertex_count,
            } => {
                assert_eq!(fragment, "tri");
                assert_eq!(index, 9);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_records_are_malformed() {
        let err = fragment_from_model(&model("short", TRIANGLE[..8].to_vec(), vec![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, ImportError::Malformed { ref fragment, .. } if fragment == "short"));

        let err = fragment_from_model(&model("open", TRIANGLE.to_vec(), vec![0, 1])).unwrap_err();
        assert!(matches!(err, ImportError::Malformed { ref fragment, .. } if fragment == "open"));
    }

    #[test]
    fn model_without_normals_or_texcoords_converts() {
        let fragment = fragment_from_model(&model("tri", TRIANGLE.to_vec(), vec![0, 1, 2])).unwrap();
        assert_eq!(fragment.vertex_count(), 3);
        assert_eq!(fragment.faces, vec![[0, 1, 2]]);
        assert_relative_eq!(fragment.vertices[1].normal[2], 1.0);
    }

    #[test]
    fn face_outside_vertex_list_fails_to_import() {
        // tobj may reject this itself; either way nothing is imported
        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap_err();
        assert!(matches!(
            err,
            ImportError::Parse { .. } | ImportError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn rejects_malformed_vertex_record() {
        let err = parse("v 0 zero 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = MeshImporter::load("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, ImportError::Open { .. }));
    }

    #[test]
    fn loads_bundled_scene() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/match_cards.obj");
        let fragments = MeshImporter::load(path).unwrap();
        assert!(!fragments.is_empty());
        assert!(fragments.iter().all(|f| !f.faces.is_empty()));
    }
}
