use ribbonscape_geometry::RibbonMesh;

/// Mesh inspector for developer tooling.
///
/// Read-only checks of the structural properties every ribbon build must
/// have: closed seams, unit-length vertices, in-range indices, and render
/// groups that cover the whole index buffer.
pub struct MeshInspector;

impl MeshInspector {
    /// Produce a summary of the mesh.
    pub fn summary(mesh: &RibbonMesh) -> MeshSummary {
        MeshSummary {
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
            triangle_count: mesh.triangle_count(),
            rows: mesh.rows,
            row_len: mesh.row_len,
            group_count: mesh.groups.len(),
            seam_closed: Self::seam_closed(mesh),
            max_unit_error: Self::max_unit_error(mesh),
            indices_in_bounds: Self::indices_in_bounds(mesh),
            groups_cover_all: Self::groups_cover_all(mesh),
        }
    }

    /// Every row's last vertex is bit-identical to its first.
    pub fn seam_closed(mesh: &RibbonMesh) -> bool {
        if mesh.row_len == 0 || mesh.positions.len() != mesh.rows * mesh.row_len {
            return false;
        }
        mesh.positions.chunks(mesh.row_len).all(|row| {
            let (first, last) = (row[0], row[row.len() - 1]);
            first.to_array().map(f32::to_bits) == last.to_array().map(f32::to_bits)
        })
    }

    /// Largest deviation of any vertex distance from the origin from 1.
    pub fn max_unit_error(mesh: &RibbonMesh) -> f32 {
        mesh.positions
            .iter()
            .map(|p| (p.length() - 1.0).abs())
            .fold(0.0, f32::max)
    }

    /// Whole triangles only, and every index names an existing vertex.
    pub fn indices_in_bounds(mesh: &RibbonMesh) -> bool {
        let n = mesh.vertex_count();
        mesh.indices.len() % 3 == 0 && mesh.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Every index position is drawn by at least one group, and no group
    /// reaches past the end of the index buffer.
    pub fn groups_cover_all(mesh: &RibbonMesh) -> bool {
        let total = mesh.index_count() as u64;
        let mut ranges: Vec<(u64, u64)> = mesh
            .groups
            .iter()
            .map(|g| (g.start as u64, g.start as u64 + g.count as u64))
            .collect();
        if ranges.iter().any(|&(_, end)| end > total) {
            return false;
        }
        ranges.sort_unstable();

        let mut covered = 0;
        for (start, end) in ranges {
            if start > covered {
                return false;
            }
            covered = covered.max(end);
        }
        covered == total
    }
}

/// Summary of a ribbon mesh for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    pub vertex_count: usize,
    pub index_count: usize,
    pub triangle_count: usize,
    pub rows: usize,
    pub row_len: usize,
    pub group_count: usize,
    pub seam_closed: bool,
    pub max_unit_error: f32,
    pub indices_in_bounds: bool,
    pub groups_cover_all: bool,
}

impl MeshSummary {
    /// Tolerance for vertex lengths after the f64 normalize and f32 store.
    pub const UNIT_TOLERANCE: f32 = 1e-6;

    pub fn is_valid(&self) -> bool {
        self.seam_closed
            && self.indices_in_bounds
            && self.groups_cover_all
            && self.max_unit_error <= Self::UNIT_TOLERANCE
    }
}

impl std::fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mesh: vertices={} indices={} triangles={} rows={}x{} groups={} \
             seam_closed={} max_unit_error={:.2e} indices_in_bounds={} groups_cover_all={}",
            self.vertex_count,
            self.index_count,
            self.triangle_count,
            self.rows,
            self.row_len,
            self.group_count,
            self.seam_closed,
            self.max_unit_error,
            self.indices_in_bounds,
            self.groups_cover_all,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec3, Vec3};
    use ribbonscape_geometry::{RenderGroup, RibbonConfig, build_ribbon_from_points};

    fn mesh() -> RibbonMesh {
        let config = RibbonConfig {
            sample_count: 64,
            ..RibbonConfig::default()
        };
        let points = [
            DVec3::new(0.0, 0.1, 0.8),
            DVec3::new(0.8, -0.1, 0.0),
            DVec3::new(0.0, 0.2, -0.8),
            DVec3::new(-0.8, 0.0, 0.0),
        ];
        build_ribbon_from_points(&config, &points)
    }

    #[test]
    fn summary_of_built_ribbon_is_valid() {
        let summary = MeshInspector::summary(&mesh());
        assert_eq!(summary.vertex_count, 3 * 65);
        assert_eq!(summary.index_count, 64 * 6);
        assert_eq!(summary.triangle_count, 128);
        assert_eq!(summary.group_count, 2);
        assert!(summary.is_valid(), "{summary}");
    }

    #[test]
    fn open_seam_is_detected() {
        let mut mesh = mesh();
        mesh.positions[64] += Vec3::splat(1e-3);
        assert!(!MeshInspector::seam_closed(&mesh));
        assert!(!MeshInspector::summary(&mesh).is_valid());
    }

    #[test]
    fn off_sphere_vertex_is_measured() {
        let mut mesh = mesh();
        mesh.positions[5] *= 1.5;
        assert!((MeshInspector::max_unit_error(&mesh) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn out_of_range_index_is_detected() {
        let mut mesh = mesh();
        mesh.indices[0] = mesh.vertex_count() as u32;
        assert!(!MeshInspector::indices_in_bounds(&mesh));

        let mut mesh = self::mesh();
        mesh.indices.pop();
        assert!(!MeshInspector::indices_in_bounds(&mesh));
    }

    #[test]
    fn group_coverage() {
        let mut mesh = mesh();
        let total = mesh.index_count() as u32;

        mesh.groups = vec![RenderGroup {
            start: 0,
            count: total - 6,
            material_index: 0,
        }];
        assert!(!MeshInspector::groups_cover_all(&mesh));

        mesh.groups.push(RenderGroup {
            start: total - 12,
            count: 12,
            material_index: 1,
        });
        assert!(MeshInspector::groups_cover_all(&mesh));

        mesh.groups.push(RenderGroup {
            start: total,
            count: 3,
            material_index: 1,
        });
        assert!(!MeshInspector::groups_cover_all(&mesh));
    }

    #[test]
    fn empty_mesh_does_not_panic() {
        let mesh = RibbonMesh {
            positions: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            groups: Vec::new(),
            rows: 0,
            row_len: 0,
        };
        let summary = MeshInspector::summary(&mesh);
        assert!(!summary.seam_closed);
        assert!(summary.groups_cover_all);
        assert_eq!(summary.max_unit_error, 0.0);
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", MeshInspector::summary(&mesh()));
        assert!(s.contains("vertices=195"));
        assert!(s.contains("seam_closed=true"));
    }
}
