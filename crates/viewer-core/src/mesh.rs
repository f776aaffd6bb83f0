//! Mesh file loading (STL, OBJ)

use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;

/// Raw mesh geometry: indexed triangles with one normal per triangle
#[derive(Debug, Clone, Default)]
pub struct MeshSource {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshSource {
    /// Scale vertices per-axis (URDF mesh scale attribute)
    pub fn apply_scale(&mut self, scale: [f32; 3]) {
        for v in &mut self.vertices {
            v[0] *= scale[0];
            v[1] *= scale[1];
            v[2] *= scale[2];
        }
    }
}

/// Mesh loading errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Failed to parse mesh: {0}")]
    Parse(String),
    #[error("Mesh contains no geometry")]
    EmptyMesh,
    #[error("Unsupported mesh format: {0}")]
    UnsupportedFormat(String),
}

/// Mesh format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
    Dae,
    Unknown,
}

impl MeshFormat {
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

    pub fn is_supported(&self) -> bool {
        matches!(self, MeshFormat::Stl | MeshFormat::Obj)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::Obj => "OBJ",
            MeshFormat::Dae => "DAE",
            MeshFormat::Unknown => "unknown",
        }
    }
}

/// Load a mesh file, dispatching on extension
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshSource, MeshError> {
    let path = path.as_ref();
    match MeshFormat::from_path(path) {
        MeshFormat::Stl => load_stl(path),
        MeshFormat::Obj => load_obj(path),
        other => Err(MeshError::UnsupportedFormat(format!(
            "{} ({})",
            path.display(),
            other.name()
        ))),
    }
}

/// Load an STL file as an indexed mesh
pub fn load_stl(path: impl AsRef<Path>) -> Result<MeshSource, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    let mut reader = BufReader::new(file);
    let mesh = stl_io::read_stl(&mut reader).map_err(|e| MeshError::Parse(e.to_string()))?;

    if mesh.faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    Ok(index_stl_mesh(&mesh))
}

/// Convert STL triangle soup to an indexed mesh, deduplicating vertices by
/// quantized position.
fn index_stl_mesh(mesh: &stl_io::IndexedMesh) -> MeshSource {
    const PRECISION: f32 = 10000.0;

    let mut out = MeshSource::default();
    let mut vertex_map: HashMap<[i32; 3], u32> = HashMap::new();

    for face in &mesh.faces {
        out.normals
            .push([face.normal[0], face.normal[1], face.normal[2]]);

        for &vertex_idx in &face.vertices {
            let vertex = mesh.vertices[vertex_idx];
            let v = [vertex[0], vertex[1], vertex[2]];
            let key = [
                (v[0] * PRECISION) as i32,
                (v[1] * PRECISION) as i32,
                (v[2] * PRECISION) as i32,
            ];

            let index = match vertex_map.get(&key) {
                Some(&existing) => existing,
                None => {
                    let new_idx = out.vertices.len() as u32;
                    out.vertices.push(v);
                    vertex_map.insert(key, new_idx);
                    new_idx
                }
            };
            out.indices.push(index);
        }
    }

    out
}

/// Load an OBJ file as an indexed mesh (all models combined)
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshSource, MeshError> {
    let (models, _materials) = tobj::load_obj(
        path.as_ref(),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::Parse(e.to_string()))?;

    if models.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut out = MeshSource::default();
    for model in &models {
        let mesh = &model.mesh;
        let vertex_offset = out.vertices.len() as u32;

        for chunk in mesh.positions.chunks(3) {
            if chunk.len() == 3 {
                out.vertices.push([chunk[0], chunk[1], chunk[2]]);
            }
        }
        for &idx in &mesh.indices {
            out.indices.push(vertex_offset + idx);
        }
    }

    // The renderer wants face normals; OBJ per-vertex normals don't map 1:1
    out.normals = face_normals(&out.vertices, &out.indices);

    if out.vertices.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    Ok(out)
}

/// Compute one normal per triangle from vertex positions
pub fn face_normals(vertices: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = Vec::with_capacity(indices.len() / 3);

    for chunk in indices.chunks(3) {
        if chunk.len() != 3 {
            continue;
        }
        let v0 = glam::Vec3::from(vertices[chunk[0] as usize]);
        let v1 = glam::Vec3::from(vertices[chunk[1] as usize]);
        let v2 = glam::Vec3::from(vertices[chunk[2] as usize]);

        let normal = (v1 - v0).cross(v2 - v0);
        normals.push(if normal.length_squared() > 0.0 {
            normal.normalize().to_array()
        } else {
            [0.0, 0.0, 1.0]
        });
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(MeshFormat::from_path(Path::new("a/b.stl")), MeshFormat::Stl);
        assert_eq!(MeshFormat::from_path(Path::new("a/B.STL")), MeshFormat::Stl);
        assert_eq!(MeshFormat::from_path(Path::new("m.obj")), MeshFormat::Obj);
        assert_eq!(MeshFormat::from_path(Path::new("m.dae")), MeshFormat::Dae);
        assert_eq!(
            MeshFormat::from_path(Path::new("noext")),
            MeshFormat::Unknown
        );
        assert!(!MeshFormat::Dae.is_supported());
    }

    #[test]
    fn test_load_mesh_rejects_dae() {
        let result = load_mesh("model.dae");
        assert!(matches!(result, Err(MeshError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_face_normals() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = face_normals(&vertices, &[0, 1, 2]);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_apply_scale() {
        let mut mesh = MeshSource {
            vertices: vec![[1.0, 2.0, 3.0]],
            normals: vec![],
            indices: vec![],
        };
        mesh.apply_scale([2.0, 0.5, 1.0]);
        assert_eq!(mesh.vertices[0], [2.0, 1.0, 3.0]);
    }
}
