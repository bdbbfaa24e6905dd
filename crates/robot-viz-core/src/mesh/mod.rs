//! Mesh data and mesh file loading (STL, OBJ formats)

mod obj;
mod stl;

use std::path::Path;

use glam::{DMat4, DVec3};

pub use obj::load_obj;
pub use stl::{load_stl, load_stl_from_bytes};

/// Indexed triangle mesh in single precision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TriMesh {
    pub fn new(vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Scale vertices per axis
    pub fn scale(&mut self, scale: [f32; 3]) {
        for v in &mut self.vertices {
            v[0] *= scale[0];
            v[1] *= scale[1];
            v[2] *= scale[2];
        }
    }

    /// Return a copy with every vertex transformed
    pub fn transformed(&self, transform: &DMat4) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let p = transform.transform_point3(DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64));
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect();
        Self {
            vertices,
            indices: self.indices.clone(),
        }
    }

    /// Append another mesh, re-basing its indices
    pub fn append(&mut self, other: &TriMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Axis-aligned bounds of the vertices
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }

        Some((min, max))
    }
}

/// Detect mesh format from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
    Dae,
    Unknown,
}

impl MeshFormat {
    /// Detect format from file path
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("stl") => MeshFormat::Stl,
            Some("obj") => MeshFormat::Obj,
            Some("dae") => MeshFormat::Dae,
            _ => MeshFormat::Unknown,
        }
    }

    /// Check if the format can be loaded
    pub fn is_supported(&self) -> bool {
        matches!(self, MeshFormat::Stl | MeshFormat::Obj)
    }

    /// Get format name
    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::Obj => "OBJ",
            MeshFormat::Dae => "DAE (COLLADA)",
            MeshFormat::Unknown => "Unknown",
        }
    }
}

/// Load any supported mesh format
pub fn load_mesh(path: impl AsRef<Path>) -> Result<TriMesh, MeshError> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path);

    let mesh = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
        MeshFormat::Dae | MeshFormat::Unknown => {
            return Err(MeshError::UnsupportedFormat(format.name().to_string()));
        }
    };

    if mesh.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    tracing::debug!(
        "Loaded {} mesh {:?}: {} vertices, {} triangles",
        format.name(),
        path,
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    Ok(mesh)
}

/// Mesh-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty mesh: no geometry found")]
    EmptyMesh,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
