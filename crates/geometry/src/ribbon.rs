use glam::{DVec3, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::curve::{ClosedCurve, CurveType};

/// Parameters for ribbon construction. Defaults reproduce the reference shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    /// Number of jittered control points around the ring.
    pub control_point_count: usize,
    /// Radius of the sphere shell the control points sit on.
    pub curve_radius: f64,
    /// Maximum polar-angle perturbation (radians) in either direction.
    pub angle_jitter: f64,
    /// Tension for [`CurveType::CatmullRom`].
    pub curve_tension: f64,
    pub curve_type: CurveType,
    /// Number of arc-length segments M; each row holds M + 1 vertices.
    pub sample_count: usize,
    /// Offset of each vertex row along the accumulated binormal.
    pub lateral_offsets: Vec<f64>,
    /// Quad rows triangulated, starting from the first offset row.
    pub height_segments: usize,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            control_point_count: 7,
            curve_radius: 0.8,
            angle_jitter: 0.5,
            curve_tension: 0.7,
            curve_type: CurveType::Centripetal,
            sample_count: 1000,
            lateral_offsets: vec![-0.2, 0.0, 0.2],
            height_segments: 1,
        }
    }
}

/// Rejected ribbon parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RibbonConfigError {
    #[error("control_point_count must be at least 1")]
    NoControlPoints,
    #[error("curve_radius must be a positive finite number, got {0}")]
    InvalidRadius(f64),
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("lateral_offsets must not be empty")]
    NoLateralOffsets,
    #[error("height_segments {requested} exceeds the {available} row gaps between lateral offsets")]
    TooManyHeightSegments { requested: usize, available: usize },
}

impl RibbonConfig {
    /// Check the parameters that would otherwise produce a degenerate or
    /// panicking build. `sample_count == 0` is accepted.
    pub fn validate(&self) -> Result<(), RibbonConfigError> {
        if self.control_point_count == 0 {
            return Err(RibbonConfigError::NoControlPoints);
        }
        if !(self.curve_radius.is_finite() && self.curve_radius > 0.0) {
            return Err(RibbonConfigError::InvalidRadius(self.curve_radius));
        }
        for (field, value) in [
            ("angle_jitter", self.angle_jitter),
            ("curve_tension", self.curve_tension),
        ] {
            if !value.is_finite() {
                return Err(RibbonConfigError::NotFinite { field, value });
            }
        }
        if self.lateral_offsets.is_empty() {
            return Err(RibbonConfigError::NoLateralOffsets);
        }
        if let Some(&value) = self.lateral_offsets.iter().find(|d| !d.is_finite()) {
            return Err(RibbonConfigError::NotFinite {
                field: "lateral_offsets",
                value,
            });
        }
        let available = self.lateral_offsets.len() - 1;
        if self.height_segments > available {
            return Err(RibbonConfigError::TooManyHeightSegments {
                requested: self.height_segments,
                available,
            });
        }
        Ok(())
    }
}

/// A contiguous index range drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: u32,
}

impl RenderGroup {
    pub fn range(&self) -> std::ops::Range<u32> {
        self.start..self.start + self.count
    }
}

/// Indexed ribbon geometry, row-major: `rows` rows of `row_len` vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RibbonMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub groups: Vec<RenderGroup>,
    pub rows: usize,
    pub row_len: usize,
}

impl RibbonMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, row: usize, sample: usize) -> Vec3 {
        self.positions[row * self.row_len + sample]
    }
}

/// Everything produced by one build: the inputs that shaped the mesh and
/// the mesh itself.
#[derive(Debug, Clone)]
pub struct Ribbon {
    pub control_points: Vec<DVec3>,
    pub curve: ClosedCurve,
    pub mesh: RibbonMesh,
}

/// Builds ribbons from a config and an injected random source.
pub struct RibbonBuilder<R> {
    config: RibbonConfig,
    rng: R,
}

impl<R: Rng> RibbonBuilder<R> {
    pub fn new(config: RibbonConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &RibbonConfig {
        &self.config
    }

    /// Draw fresh control points and build a ribbon through them.
    pub fn build(&mut self) -> Ribbon {
        let control_points = control_points(&self.config, &mut self.rng);
        build_from_points(&self.config, control_points)
    }
}

/// Build a ribbon mesh with control points drawn from `rng`.
pub fn build_ribbon<R: Rng + ?Sized>(config: &RibbonConfig, rng: &mut R) -> RibbonMesh {
    let points = control_points(config, rng);
    build_from_points(config, points).mesh
}

/// Build a ribbon mesh through fixed control points. Deterministic.
pub fn build_ribbon_from_points(config: &RibbonConfig, points: &[DVec3]) -> RibbonMesh {
    build_from_points(config, points.to_vec()).mesh
}

/// Jittered ring of control points on a sphere shell of `curve_radius`.
pub fn control_points<R: Rng + ?Sized>(config: &RibbonConfig, rng: &mut R) -> Vec<DVec3> {
    let count = config.control_point_count;
    (0..count)
        .map(|i| {
            let azimuth = i as f64 / count as f64 * TAU;
            let jitter = (rng.random::<f64>() - 0.5) * 2.0 * config.angle_jitter;
            spherical_to_cartesian(config.curve_radius, FRAC_PI_2 + jitter, azimuth)
        })
        .collect()
}

/// Y-up spherical coordinates: `polar` from +Y, `azimuth` from +Z towards +X.
pub fn spherical_to_cartesian(radius: f64, polar: f64, azimuth: f64) -> DVec3 {
    let ring = polar.sin() * radius;
    DVec3::new(ring * azimuth.sin(), polar.cos() * radius, ring * azimuth.cos())
}

/// Build a ribbon through fixed control points, keeping the curve.
pub fn build_from_points(config: &RibbonConfig, control_points: Vec<DVec3>) -> Ribbon {
    let _span = tracing::info_span!("build_ribbon").entered();

    let curve = ClosedCurve::new(
        control_points.clone(),
        config.curve_type,
        config.curve_tension,
    );
    let m = config.sample_count;
    let frames = curve.frenet_frames(m, true);
    let samples = curve.spaced_points(m);

    let positions = offset_rows(&samples, &frames.binormals, &config.lateral_offsets);
    let rows = config.lateral_offsets.len();
    let row_len = m + 1;

    let indices = grid_indices(row_len, config.height_segments);
    let uvs = grid_uvs(rows, row_len, config.height_segments);
    let count = indices.len() as u32;
    let groups = vec![
        RenderGroup {
            start: 0,
            count,
            material_index: 0,
        },
        RenderGroup {
            start: 0,
            count,
            material_index: 1,
        },
    ];

    tracing::debug!(
        vertices = positions.len(),
        indices = indices.len(),
        curve_length = curve.length(),
        "ribbon built"
    );

    Ribbon {
        control_points,
        curve,
        mesh: RibbonMesh {
            positions,
            uvs,
            indices,
            groups,
            rows,
            row_len,
        },
    }
}

/// Push each sample along the running binormal shift and project it back
/// onto the unit sphere, one row per offset.
///
/// The shift is carried across samples and rows: each step adds the current
/// binormal and scales the sum by the row's offset. A zero offset clears it.
/// The first vertex of every row is then overwritten with the row's last so
/// the loop closes without a crack.
fn offset_rows(samples: &[DVec3], binormals: &[DVec3], offsets: &[f64]) -> Vec<Vec3> {
    let row_len = samples.len();
    let mut positions = Vec::with_capacity(offsets.len() * row_len);
    let mut shift = DVec3::ZERO;

    for &d in offsets {
        for (sample, binormal) in samples.iter().zip(binormals) {
            shift = (shift + *binormal) * d;
            positions.push((*sample + shift).normalize_or_zero().as_vec3());
        }
    }

    for row in positions.chunks_mut(row_len) {
        row[0] = row[row_len - 1];
    }
    positions
}

/// Two triangles per quad over `height_segments` rows of `row_len - 1` quads.
fn grid_indices(row_len: usize, height_segments: usize) -> Vec<u32> {
    let quads = row_len.saturating_sub(1);
    let mut indices = Vec::with_capacity(quads * height_segments * 6);
    for y in 0..height_segments {
        for x in 0..quads {
            let a = (x + row_len * y) as u32;
            let b = (x + row_len * (y + 1)) as u32;
            let c = b + 1;
            let d = a + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

/// `u` runs along the curve, `v` falls by one per triangulated row.
fn grid_uvs(rows: usize, row_len: usize, height_segments: usize) -> Vec<Vec2> {
    let quads = row_len.saturating_sub(1);
    let mut uvs = Vec::with_capacity(rows * row_len);
    for row in 0..rows {
        let v = if height_segments == 0 {
            1.0
        } else {
            1.0 - row as f32 / height_segments as f32
        };
        for i in 0..row_len {
            let u = if quads == 0 {
                0.0
            } else {
                i as f32 / quads as f32
            };
            uvs.push(Vec2::new(u, v));
        }
    }
    uvs
}
