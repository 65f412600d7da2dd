//! Closed cubic interpolation through control points.
//!
//! Parameter `t` runs over `[0, 1]` and wraps: `point(0.0) == point(1.0)`.
//! Arc-length reparameterisation (`u`) uses a fixed table of cumulative
//! chord lengths, so spaced sampling is exact at the table knots and linear
//! in between.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Number of chord segments used to approximate arc length.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

/// Step used for finite-difference tangents.
const TANGENT_DELTA: f64 = 1e-4;

/// Knot parameterisation for the interpolating spline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// Knot spacing by the square root of chord length. Never cusps or
    /// self-intersects within a span. Tension is ignored.
    #[default]
    Centripetal,
    /// Knot spacing by chord length. Tension is ignored.
    Chordal,
    /// Uniform Catmull-Rom scaled by the curve tension.
    CatmullRom,
}

/// Hermite cubic `c0 + c1 t + c2 t^2 + c3 t^3` for one coordinate of a span.
#[derive(Debug, Clone, Copy, Default)]
struct CubicPoly {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicPoly {
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn catmull_rom(x0: f64, x1: f64, x2: f64, x3: f64, tension: f64) -> Self {
        Self::hermite(x1, x2, tension * (x2 - x0), tension * (x3 - x1))
    }

    fn nonuniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        // Tangents for the knot sequence [0, dt0, dt0+dt1, dt0+dt1+dt2],
        // rescaled to the unit parameter interval of the middle span.
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        let t3 = t2 * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t3
    }
}

/// Tangent, normal and binormal at each sample of a curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrenetFrames {
    pub tangents: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub binormals: Vec<DVec3>,
}

impl FrenetFrames {
    pub fn len(&self) -> usize {
        self.tangents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tangents.is_empty()
    }
}

/// A closed interpolating curve through a ring of control points.
#[derive(Debug, Clone)]
pub struct ClosedCurve {
    points: Vec<DVec3>,
    curve_type: CurveType,
    tension: f64,
    arc_lengths: Vec<f64>,
}

impl ClosedCurve {
    /// Build a closed curve through `points`.
    ///
    /// # Panics
    /// Panics if `points` is empty.
    pub fn new(points: Vec<DVec3>, curve_type: CurveType, tension: f64) -> Self {
        assert!(!points.is_empty(), "a closed curve needs at least one point");
        let mut curve = Self {
            points,
            curve_type,
            tension,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_lengths(ARC_LENGTH_DIVISIONS);
        curve
    }

    pub fn control_points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    /// Approximate total length of the loop.
    pub fn length(&self) -> f64 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f64) -> DVec3 {
        let l = self.points.len();
        let p = l as f64 * t;
        let mut int_point = p.floor();
        let weight = p - int_point;
        if int_point <= 0.0 {
            int_point += ((int_point.abs() / l as f64).floor() + 1.0) * l as f64;
        }
        let i = int_point as usize;

        let p0 = self.points[(i - 1) % l];
        let p1 = self.points[i % l];
        let p2 = self.points[(i + 1) % l];
        let p3 = self.points[(i + 2) % l];

        let (px, py, pz) = match self.curve_type {
            CurveType::CatmullRom => {
                let k = self.tension;
                (
                    CubicPoly::catmull_rom(p0.x, p1.x, p2.x, p3.x, k),
                    CubicPoly::catmull_rom(p0.y, p1.y, p2.y, p3.y, k),
                    CubicPoly::catmull_rom(p0.z, p1.z, p2.z, p3.z, k),
                )
            }
            CurveType::Centripetal | CurveType::Chordal => {
                let pow = if self.curve_type == CurveType::Chordal {
                    0.5
                } else {
                    0.25
                };
                let mut dt0 = p0.distance_squared(p1).powf(pow);
                let mut dt1 = p1.distance_squared(p2).powf(pow);
                let mut dt2 = p2.distance_squared(p3).powf(pow);

                // Coincident neighbours would divide by zero.
                if dt1 < 1e-4 {
                    dt1 = 1.0;
                }
                if dt0 < 1e-4 {
                    dt0 = dt1;
                }
                if dt2 < 1e-4 {
                    dt2 = dt1;
                }
                (
                    CubicPoly::nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2),
                    CubicPoly::nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2),
                    CubicPoly::nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2),
                )
            }
        };

        DVec3::new(px.eval(weight), py.eval(weight), pz.eval(weight))
    }

    /// Point at arc-length fraction `u` in `[0, 1]`.
    pub fn point_at(&self, u: f64) -> DVec3 {
        self.point(self.u_to_t(u))
    }

    /// `divisions + 1` points at uniform curve parameter.
    pub fn points(&self, divisions: usize) -> Vec<DVec3> {
        (0..=divisions)
            .map(|d| self.point(fraction(d, divisions)))
            .collect()
    }

    /// `divisions + 1` points evenly spaced by arc length. The last point
    /// closes the loop onto the first.
    pub fn spaced_points(&self, divisions: usize) -> Vec<DVec3> {
        (0..=divisions)
            .map(|d| self.point_at(fraction(d, divisions)))
            .collect()
    }

    /// Map an arc-length fraction to the curve parameter.
    pub fn u_to_t(&self, u: f64) -> f64 {
        let lengths = &self.arc_lengths;
        let il = lengths.len();
        let target = u * lengths[il - 1];

        let mut low: isize = 0;
        let mut high: isize = il as isize - 1;
        while low <= high {
            let i = low + (high - low) / 2;
            let comparison = lengths[i as usize] - target;
            if comparison < 0.0 {
                low = i + 1;
            } else if comparison > 0.0 {
                high = i - 1;
            } else {
                high = i;
                break;
            }
        }

        let i = high.max(0) as usize;
        let last = (il - 1) as f64;
        if lengths[i] == target || i + 1 >= il {
            return i as f64 / last;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        if segment <= 0.0 {
            return i as f64 / last;
        }
        (i as f64 + (target - before) / segment) / last
    }

    /// Unit tangent at curve parameter `t`, by central difference clamped
    /// to `[0, 1]`.
    pub fn tangent(&self, t: f64) -> DVec3 {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }

    /// Unit tangent at arc-length fraction `u`.
    pub fn tangent_at(&self, u: f64) -> DVec3 {
        self.tangent(self.u_to_t(u))
    }

    /// Parallel-transported frames at `segments + 1` arc-length-spaced samples.
    ///
    /// The first normal is seeded perpendicular to the tangent's smallest
    /// component. When `closed`, the residual twist between the first and
    /// last normal is distributed evenly so the frames agree at the seam.
    pub fn frenet_frames(&self, segments: usize, closed: bool) -> FrenetFrames {
        let tangents: Vec<DVec3> = (0..=segments)
            .map(|i| self.tangent_at(fraction(i, segments)).normalize_or_zero())
            .collect();

        let t0 = tangents[0];
        let mut seed = DVec3::Z;
        let mut min = f64::MAX;
        for (component, axis) in [(t0.x.abs(), DVec3::X), (t0.y.abs(), DVec3::Y), (t0.z.abs(), DVec3::Z)] {
            if component <= min {
                min = component;
                seed = axis;
            }
        }

        let side = t0.cross(seed).normalize_or_zero();
        let mut normals = Vec::with_capacity(segments + 1);
        let mut binormals = Vec::with_capacity(segments + 1);
        normals.push(t0.cross(side));
        binormals.push(t0.cross(normals[0]));

        for i in 1..=segments {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.length() > f64::EPSILON {
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = DMat3::from_axis_angle(axis.normalize(), theta) * normal;
            }
            normals.push(normal);
            binormals.push(tangents[i].cross(normal));
        }

        if closed && segments > 0 {
            let mut theta = normals[0].dot(normals[segments]).clamp(-1.0, 1.0).acos() / segments as f64;
            if tangents[0].dot(normals[0].cross(normals[segments])) > 0.0 {
                theta = -theta;
            }
            for i in 1..=segments {
                normals[i] = DMat3::from_axis_angle(tangents[i], theta * i as f64) * normals[i];
                binormals[i] = tangents[i].cross(normals[i]);
            }
        }

        FrenetFrames {
            tangents,
            normals,
            binormals,
        }
    }

    fn compute_lengths(&self, divisions: usize) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        lengths.push(0.0);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        for p in 1..=divisions {
            let current = self.point(p as f64 / divisions as f64);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }
}

/// `i / n`, with the empty range mapped to the curve start.
fn fraction(i: usize, n: usize) -> f64 {
    if n == 0 { 0.0 } else { i as f64 / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn ring(count: usize, radius: f64) -> Vec<DVec3> {
        (0..count)
            .map(|i| {
                let theta = i as f64 / count as f64 * TAU;
                DVec3::new(radius * theta.sin(), 0.0, radius * theta.cos())
            })
            .collect()
    }

    fn wobbly_ring() -> Vec<DVec3> {
        (0..7)
            .map(|i| {
                let theta = i as f64 / 7.0 * TAU;
                let y = if i % 2 == 0 { 0.3 } else { -0.2 };
                DVec3::new(0.8 * theta.sin(), y, 0.8 * theta.cos())
            })
            .collect()
    }

    #[test]
    fn interpolates_control_points() {
        let points = wobbly_ring();
        for curve_type in [CurveType::Centripetal, CurveType::Chordal, CurveType::CatmullRom] {
            let curve = ClosedCurve::new(points.clone(), curve_type, 0.7);
            for (i, p) in points.iter().enumerate() {
                let at = curve.point(i as f64 / points.len() as f64);
                assert!((at - *p).length() < 1e-12, "{curve_type:?} misses point {i}");
            }
        }
    }

    #[test]
    fn loop_closes_exactly() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        assert_eq!(curve.point(0.0), curve.point(1.0));
        let spaced = curve.spaced_points(64);
        assert_eq!(spaced.len(), 65);
        assert_eq!(spaced[0], spaced[64]);
    }

    #[test]
    fn tension_only_affects_uniform_catmull_rom() {
        let points = wobbly_ring();
        let loose = ClosedCurve::new(points.clone(), CurveType::Centripetal, 0.1);
        let tight = ClosedCurve::new(points.clone(), CurveType::Centripetal, 0.9);
        assert_eq!(loose.point(0.3), tight.point(0.3));

        let loose = ClosedCurve::new(points.clone(), CurveType::CatmullRom, 0.1);
        let tight = ClosedCurve::new(points, CurveType::CatmullRom, 0.9);
        assert_ne!(loose.point(0.3), tight.point(0.3));
    }

    #[test]
    fn circle_length_is_close_to_circumference() {
        let curve = ClosedCurve::new(ring(16, 1.0), CurveType::Centripetal, 0.5);
        assert!((curve.length() - TAU).abs() < 1e-2);
    }

    #[test]
    fn u_to_t_endpoints() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        assert_eq!(curve.u_to_t(0.0), 0.0);
        assert_eq!(curve.u_to_t(1.0), 1.0);
        let mid = curve.u_to_t(0.5);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn spaced_points_are_roughly_equidistant() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        let pts = curve.spaced_points(100);
        let gaps: Vec<f64> = pts.windows(2).map(|w| w[0].distance(w[1])).collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        for gap in gaps {
            assert!((gap - mean).abs() < mean * 0.05);
        }
    }

    #[test]
    fn frames_are_orthonormal() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        let frames = curve.frenet_frames(200, true);
        assert_eq!(frames.len(), 201);
        for i in 0..frames.len() {
            let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
            assert!((t.length() - 1.0).abs() < 1e-9);
            assert!((n.length() - 1.0).abs() < 1e-9);
            assert!((b.length() - 1.0).abs() < 1e-9);
            assert!(t.dot(n).abs() < 1e-9);
            assert!(t.dot(b).abs() < 1e-9);
        }
    }

    #[test]
    fn closed_frames_are_continuous_across_the_seam() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        let frames = curve.frenet_frames(400, true);
        for w in frames.normals.windows(2) {
            assert!(w[0].dot(w[1]) > 0.9, "normal flipped between samples");
        }
        let last = frames.len() - 1;
        assert!(frames.normals[0].dot(frames.normals[last]) > 0.999);
        assert!(frames.binormals[0].dot(frames.binormals[last]) > 0.999);
    }

    #[test]
    fn zero_segments_yields_single_frame() {
        let curve = ClosedCurve::new(wobbly_ring(), CurveType::Centripetal, 0.7);
        let frames = curve.frenet_frames(0, true);
        assert_eq!(frames.len(), 1);
        assert_eq!(curve.spaced_points(0), vec![curve.point(0.0)]);
    }

    #[test]
    fn single_point_curve_is_constant() {
        let p = DVec3::new(0.1, 0.2, 0.3);
        let curve = ClosedCurve::new(vec![p], CurveType::Centripetal, 0.7);
        assert_eq!(curve.point(0.42), p);
        assert_eq!(curve.length(), 0.0);
        let frames = curve.frenet_frames(4, true);
        assert!(frames.binormals.iter().all(|b| b.is_finite()));
    }
}
