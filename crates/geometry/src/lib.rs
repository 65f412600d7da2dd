//! Ribbon geometry: a closed spline through jittered control points, thickened
//! along its binormal and wrapped onto the unit sphere.
//!
//! # Invariants
//! - A build yields `lateral_offsets.len() * (sample_count + 1)` vertices.
//! - The first vertex of every row is bit-identical to the row's last.
//! - Randomness enters only through control-point generation; a build from
//!   fixed points is deterministic.

pub mod curve;
pub mod ribbon;

pub use curve::{ClosedCurve, CurveType, FrenetFrames};
pub use ribbon::{
    RenderGroup, Ribbon, RibbonBuilder, RibbonConfig, RibbonConfigError, RibbonMesh,
    build_from_points, build_ribbon, build_ribbon_from_points, control_points,
    spherical_to_cartesian,
};

pub fn crate_info() -> &'static str {
    "ribbonscape-geometry v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("geometry"));
    }
}
