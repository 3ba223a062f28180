//! Bezier curve flattening and splitting.
//!
//! `Curve3Div` and `Curve4Div` flatten quadratic and cubic curves by
//! recursive de Casteljau subdivision into a point list, adaptive to an
//! approximation scale (the device-space scale of the current transform).
//!
//! The second half of the module holds the exact-split helpers the
//! monotonizer uses: per-axis extrema parameters and de Casteljau splits
//! at arbitrary `t`.

use smallvec::SmallVec;

use crate::basics::{PointD, PI};
use crate::math::calc_sq_distance;

// ============================================================================
// Constants
// ============================================================================

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;
const CURVE_ANGLE_TOLERANCE_EPSILON: f64 = 0.01;
const CURVE_RECURSION_LIMIT: u32 = 32;
/// Subdivision stops once this many points were produced, which bounds
/// the work for curves with astronomically large coordinates.
const CURVE_POINT_LIMIT: usize = 1 << 16;

/// Split parameters closer than this to 0 or 1 are ignored.
const SPLIT_T_EPSILON: f64 = 1e-9;

// ============================================================================
// Curve3Div: recursive subdivision of a quadratic Bezier
// ============================================================================

/// Recursive subdivision quadratic Bezier flattener.
///
/// After [`init`](Self::init) the flattened polyline, including both end
/// points, is available from [`points`](Self::points).
#[derive(Debug, Clone)]
pub struct Curve3Div {
    approximation_scale: f64,
    distance_tolerance_square: f64,
    angle_tolerance: f64,
    points: Vec<PointD>,
}

impl Curve3Div {
    pub fn new() -> Self {
        Self {
            approximation_scale: 1.0,
            distance_tolerance_square: 0.0,
            angle_tolerance: 0.0,
            points: Vec::new(),
        }
    }

    pub fn init(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.points.clear();
        self.distance_tolerance_square = 0.5 / self.approximation_scale;
        self.distance_tolerance_square *= self.distance_tolerance_square;
        self.points.push(PointD::new(x1, y1));
        self.recursive_bezier(x1, y1, x2, y2, x3, y3, 0);
        self.points.push(PointD::new(x3, y3));
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approximation_scale = s;
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    pub fn set_angle_tolerance(&mut self, a: f64) {
        self.angle_tolerance = a;
    }

    pub fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance
    }

    pub fn points(&self) -> &[PointD] {
        &self.points
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_bezier(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        level: u32,
    ) {
        if self.points.len() >= CURVE_POINT_LIMIT {
            return;
        }
        if level > CURVE_RECURSION_LIMIT {
            self.points.push(PointD::new(x3, y3));
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let dx = x3 - x1;
        let dy = y3 - y1;
        let d = ((x2 - x3) * dy - (y2 - y3) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                if self.angle_tolerance < CURVE_ANGLE_TOLERANCE_EPSILON {
                    self.points.push(PointD::new(x123, y123));
                    return;
                }

                let mut da = ((y3 - y2).atan2(x3 - x2) - (y2 - y1).atan2(x2 - x1)).abs();
                if da >= PI {
                    da = 2.0 * PI - da;
                }
                if da < self.angle_tolerance {
                    self.points.push(PointD::new(x123, y123));
                    return;
                }
            }
        } else {
            // Collinear
            let da = dx * dx + dy * dy;
            let d_val = if da == 0.0 {
                calc_sq_distance(x1, y1, x2, y2)
            } else {
                let t = ((x2 - x1) * dx + (y2 - y1) * dy) / da;
                if t > 0.0 && t < 1.0 {
                    return;
                }
                if t <= 0.0 {
                    calc_sq_distance(x2, y2, x1, y1)
                } else {
                    calc_sq_distance(x2, y2, x3, y3)
                }
            };
            if d_val < self.distance_tolerance_square {
                self.points.push(PointD::new(x2, y2));
                return;
            }
        }

        self.recursive_bezier(x1, y1, x12, y12, x123, y123, level + 1);
        self.recursive_bezier(x123, y123, x23, y23, x3, y3, level + 1);
    }
}

impl Default for Curve3Div {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Curve4Div: recursive subdivision of a cubic Bezier
// ============================================================================

/// Recursive subdivision cubic Bezier flattener.
#[derive(Debug, Clone)]
pub struct Curve4Div {
    approximation_scale: f64,
    distance_tolerance_square: f64,
    angle_tolerance: f64,
    points: Vec<PointD>,
}

impl Curve4Div {
    pub fn new() -> Self {
        Self {
            approximation_scale: 1.0,
            distance_tolerance_square: 0.0,
            angle_tolerance: 0.0,
            points: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn init(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) {
        self.points.clear();
        self.distance_tolerance_square = 0.5 / self.approximation_scale;
        self.distance_tolerance_square *= self.distance_tolerance_square;
        self.points.push(PointD::new(x1, y1));
        self.recursive_bezier(x1, y1, x2, y2, x3, y3, x4, y4, 0);
        self.points.push(PointD::new(x4, y4));
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approximation_scale = s;
    }

    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    pub fn set_angle_tolerance(&mut self, a: f64) {
        self.angle_tolerance = a;
    }

    pub fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance
    }

    pub fn points(&self) -> &[PointD] {
        &self.points
    }

    #[allow(clippy::too_many_arguments)]
    fn recursive_bezier(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
        level: u32,
    ) {
        if self.points.len() >= CURVE_POINT_LIMIT {
            return;
        }
        if level > CURVE_RECURSION_LIMIT {
            self.points.push(PointD::new(x4, y4));
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x34 = (x3 + x4) / 2.0;
        let y34 = (y3 + y4) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        let dx = x4 - x1;
        let dy = y4 - y1;

        let mut d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let mut d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        let significant2 = d2 > CURVE_COLLINEARITY_EPSILON;
        let significant3 = d3 > CURVE_COLLINEARITY_EPSILON;

        match (significant2, significant3) {
            (false, false) => {
                // All collinear or p1 == p4
                let k = dx * dx + dy * dy;
                if k == 0.0 {
                    d2 = calc_sq_distance(x1, y1, x2, y2);
                    d3 = calc_sq_distance(x4, y4, x3, y3);
                } else {
                    let k = 1.0 / k;
                    let t2 = k * ((x2 - x1) * dx + (y2 - y1) * dy);
                    let t3 = k * ((x3 - x1) * dx + (y3 - y1) * dy);
                    if t2 > 0.0 && t2 < 1.0 && t3 > 0.0 && t3 < 1.0 {
                        return;
                    }
                    d2 = collinear_sq_distance(t2, x1, y1, x2, y2, x4, y4, dx, dy);
                    d3 = collinear_sq_distance(t3, x1, y1, x3, y3, x4, y4, dx, dy);
                }
                if d2 > d3 {
                    if d2 < self.distance_tolerance_square {
                        self.points.push(PointD::new(x2, y2));
                        return;
                    }
                } else if d3 < self.distance_tolerance_square {
                    self.points.push(PointD::new(x3, y3));
                    return;
                }
            }
            (false, true) => {
                if d3 * d3 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    if self.angle_tolerance < CURVE_ANGLE_TOLERANCE_EPSILON {
                        self.points.push(PointD::new(x23, y23));
                        return;
                    }
                    let da = angle_between(x2, y2, x3, y3, x4, y4);
                    if da < self.angle_tolerance {
                        self.points.push(PointD::new(x2, y2));
                        self.points.push(PointD::new(x3, y3));
                        return;
                    }
                }
            }
            (true, false) => {
                if d2 * d2 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    if self.angle_tolerance < CURVE_ANGLE_TOLERANCE_EPSILON {
                        self.points.push(PointD::new(x23, y23));
                        return;
                    }
                    let da = angle_between(x1, y1, x2, y2, x3, y3);
                    if da < self.angle_tolerance {
                        self.points.push(PointD::new(x2, y2));
                        self.points.push(PointD::new(x3, y3));
                        return;
                    }
                }
            }
            (true, true) => {
                if (d2 + d3) * (d2 + d3) <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    if self.angle_tolerance < CURVE_ANGLE_TOLERANCE_EPSILON {
                        self.points.push(PointD::new(x23, y23));
                        return;
                    }
                    let da1 = angle_between(x1, y1, x2, y2, x3, y3);
                    let da2 = angle_between(x2, y2, x3, y3, x4, y4);
                    if da1 + da2 < self.angle_tolerance {
                        self.points.push(PointD::new(x23, y23));
                        return;
                    }
                }
            }
        }

        self.recursive_bezier(x1, y1, x12, y12, x123, y123, x1234, y1234, level + 1);
        self.recursive_bezier(x1234, y1234, x234, y234, x34, y34, x4, y4, level + 1);
    }
}

impl Default for Curve4Div {
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute turn angle at (x2, y2) for the polyline 1→2→3, in `[0, PI]`.
#[inline]
fn angle_between(x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> f64 {
    let mut da = ((y3 - y2).atan2(x3 - x2) - (y2 - y1).atan2(x2 - x1)).abs();
    if da >= PI {
        da = 2.0 * PI - da;
    }
    da
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn collinear_sq_distance(
    t: f64,
    x1: f64,
    y1: f64,
    x: f64,
    y: f64,
    x4: f64,
    y4: f64,
    dx: f64,
    dy: f64,
) -> f64 {
    if t <= 0.0 {
        calc_sq_distance(x, y, x1, y1)
    } else if t >= 1.0 {
        calc_sq_distance(x, y, x4, y4)
    } else {
        calc_sq_distance(x, y, x1 + t * dx, y1 + t * dy)
    }
}

// ============================================================================
// Exact splitting
// ============================================================================

#[inline]
fn lerp(a: PointD, b: PointD, t: f64) -> PointD {
    PointD::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Split a quadratic at `t`, returning both halves.
pub fn split_quad(p: [PointD; 3], t: f64) -> ([PointD; 3], [PointD; 3]) {
    let p01 = lerp(p[0], p[1], t);
    let p12 = lerp(p[1], p[2], t);
    let mid = lerp(p01, p12, t);
    ([p[0], p01, mid], [mid, p12, p[2]])
}

/// Split a cubic at `t`, returning both halves.
pub fn split_cubic(p: [PointD; 4], t: f64) -> ([PointD; 4], [PointD; 4]) {
    let p01 = lerp(p[0], p[1], t);
    let p12 = lerp(p[1], p[2], t);
    let p23 = lerp(p[2], p[3], t);
    let p012 = lerp(p01, p12, t);
    let p123 = lerp(p12, p23, t);
    let mid = lerp(p012, p123, t);
    ([p[0], p01, p012, mid], [mid, p123, p23, p[3]])
}

fn push_split_t(out: &mut SmallVec<[f64; 4]>, t: f64) {
    if t > SPLIT_T_EPSILON && t < 1.0 - SPLIT_T_EPSILON {
        out.push(t);
    }
}

fn sort_dedup(out: &mut SmallVec<[f64; 4]>) {
    out.sort_by(|a, b| a.total_cmp(b));
    out.dedup_by(|a, b| (*a - *b).abs() < SPLIT_T_EPSILON);
}

/// Parameters in (0, 1) where a quadratic's x or y derivative vanishes,
/// sorted ascending. Splitting there yields monotonic pieces.
pub fn quad_monotone_splits(p: &[PointD; 3]) -> SmallVec<[f64; 4]> {
    let mut out = SmallVec::new();
    for (a, b, c) in [(p[0].x, p[1].x, p[2].x), (p[0].y, p[1].y, p[2].y)] {
        let den = a - 2.0 * b + c;
        if den != 0.0 {
            push_split_t(&mut out, (a - b) / den);
        }
    }
    sort_dedup(&mut out);
    out
}

/// Parameters in (0, 1) where a cubic's x or y derivative vanishes.
///
/// Returns `None` when the derivative coefficients are not finite and the
/// curve cannot be classified.
pub fn cubic_monotone_splits(p: &[PointD; 4]) -> Option<SmallVec<[f64; 4]>> {
    let mut out = SmallVec::new();
    for (p0, p1, p2, p3) in [
        (p[0].x, p[1].x, p[2].x, p[3].x),
        (p[0].y, p[1].y, p[2].y, p[3].y),
    ] {
        // Derivative / 3 = a t^2 + b t + c
        let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let b = 2.0 * (p0 - 2.0 * p1 + p2);
        let c = p1 - p0;
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return None;
        }
        let scale = a.abs().max(b.abs()).max(c.abs());
        if scale == 0.0 {
            continue;
        }
        if a.abs() <= scale * 1e-12 {
            if b != 0.0 {
                push_split_t(&mut out, -c / b);
            }
            continue;
        }
        let disc = b * b - 4.0 * a * c;
        if !disc.is_finite() {
            return None;
        }
        if disc < 0.0 {
            continue;
        }
        let sq = disc.sqrt();
        let q = if b < 0.0 { -0.5 * (b - sq) } else { -0.5 * (b + sq) };
        push_split_t(&mut out, q / a);
        if q != 0.0 {
            push_split_t(&mut out, c / q);
        }
    }
    sort_dedup(&mut out);
    Some(out)
}

// ============================================================================
// Tests
// ============================================================================
