//! OBJ file loading

use std::path::Path;

use super::{MeshError, TriMesh};

/// Load an OBJ file, merging all of its models into one mesh
pub fn load_obj(path: impl AsRef<Path>) -> Result<TriMesh, MeshError> {
    let path = path.as_ref();
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path, &load_options).map_err(|e| match e {
        tobj::LoadError::OpenFileFailed => MeshError::Io(format!("cannot open {}", path.display())),
        other => MeshError::Parse(other.to_string()),
    })?;

    let mut mesh = TriMesh::default();
    for model in &models {
        let vertices = model
            .mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        mesh.append(&TriMesh::new(vertices, model.mesh.indices.clone()));
    }

    Ok(mesh)
}
