use std::io::Write;

use ribbonscape_geometry::RibbonMesh;
use serde::{Deserialize, Serialize};

/// Version of the JSON mesh document layout.
pub const MESH_SCHEMA_VERSION: u32 = 1;

/// Errors from mesh export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON mesh document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshExport {
    pub schema_version: u32,
    pub mesh: RibbonMesh,
}

/// Write the mesh as a Wavefront OBJ.
///
/// Each render group becomes its own `g`/`usemtl` block named from
/// `material_names` (falling back to `material<N>`), so overlapping groups
/// emit their faces once per group.
pub fn write_obj<W: Write>(
    mesh: &RibbonMesh,
    material_names: &[&str],
    out: &mut W,
) -> Result<(), ExportError> {
    writeln!(
        out,
        "# ribbon: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for uv in &mesh.uvs {
        writeln!(out, "vt {} {}", uv.x, uv.y)?;
    }

    for group in &mesh.groups {
        let name = material_names
            .get(group.material_index as usize)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("material{}", group.material_index));
        writeln!(out, "g {name}")?;
        writeln!(out, "usemtl {name}")?;

        let start = (group.start as usize).min(mesh.indices.len());
        let end = (group.start as usize + group.count as usize).min(mesh.indices.len());
        for tri in mesh.indices[start..end].chunks_exact(3) {
            // OBJ indices are 1-based; positions and uvs share numbering.
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?;
        }
    }

    tracing::debug!(groups = mesh.groups.len(), "wrote OBJ");
    Ok(())
}

/// Write the mesh as a pretty-printed JSON [`MeshExport`] document.
pub fn write_json<W: Write>(mesh: &RibbonMesh, out: &mut W) -> Result<(), ExportError> {
    let doc = MeshExport {
        schema_version: MESH_SCHEMA_VERSION,
        mesh: mesh.clone(),
    };
    serde_json::to_writer_pretty(&mut *out, &doc)?;
    writeln!(out)?;
    tracing::debug!(vertices = mesh.vertex_count(), "wrote JSON mesh");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use ribbonscape_geometry::{RibbonConfig, build_ribbon_from_points};

    fn mesh() -> RibbonMesh {
        let config = RibbonConfig {
            sample_count: 8,
            ..RibbonConfig::default()
        };
        let points = [
            DVec3::new(0.0, 0.0, 0.8),
            DVec3::new(0.8, 0.1, 0.0),
            DVec3::new(0.0, -0.1, -0.8),
        ];
        build_ribbon_from_points(&config, &points)
    }

    #[test]
    fn obj_has_vertices_uvs_and_faces_per_group() {
        let mesh = mesh();
        let mut buf = Vec::new();
        write_obj(&mesh, &["front", "back"], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 27);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 27);
        // Both groups cover all 16 triangles.
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 32);
        assert!(text.contains("usemtl front"));
        assert!(text.contains("usemtl back"));
        assert!(text.contains("f 1/1 10/10 2/2"));
    }

    #[test]
    fn obj_names_unknown_materials_by_index() {
        let mut buf = Vec::new();
        write_obj(&mesh(), &[], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("usemtl material0"));
        assert!(text.contains("usemtl material1"));
    }

    #[test]
    fn json_document_reads_back() {
        let mesh = mesh();
        let mut buf = Vec::new();
        write_json(&mesh, &mut buf).unwrap();

        let doc: MeshExport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc.schema_version, MESH_SCHEMA_VERSION);
        assert_eq!(doc.mesh.indices, mesh.indices);
        assert_eq!(doc.mesh.groups, mesh.groups);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ribbon.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        write_obj(&mesh(), &["front", "back"], &mut file).unwrap();
        drop(file);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# ribbon: 27 vertices, 16 triangles"));
    }
}
