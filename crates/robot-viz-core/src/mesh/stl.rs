//! STL file loading

use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use super::{MeshError, TriMesh};

/// Load an STL file (binary or ASCII)
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriMesh, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    read_stl(&mut BufReader::new(file))
}

/// Load STL data from memory
pub fn load_stl_from_bytes(bytes: &[u8]) -> Result<TriMesh, MeshError> {
    read_stl(&mut Cursor::new(bytes))
}

fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<TriMesh, MeshError> {
    let mesh = stl_io::read_stl(reader).map_err(|e| MeshError::Parse(e.to_string()))?;

    let vertices = mesh
        .vertices
        .iter()
        .map(|v| [v[0], v[1], v[2]])
        .collect::<Vec<_>>();

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for face in &mesh.faces {
        for &vertex_idx in &face.vertices {
            indices.push(vertex_idx as u32);
        }
    }

    Ok(TriMesh { vertices, indices })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRAHEDRON: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tetra
";

    #[test]
    fn test_load_ascii_stl() {
        let mesh = load_stl_from_bytes(TETRAHEDRON.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        // Shared corners are de-duplicated by the reader
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_stl("does/not/exist.stl");
        assert!(matches!(result, Err(MeshError::Io(_))));
    }
}
