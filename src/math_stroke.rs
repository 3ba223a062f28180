//! Stroke math: cap, join and miter geometry for stroked polylines.
//!
//! All offsets are measured on the side `(dy, -dx) / len` of each edge;
//! callers walk a polyline forward for one side and backward for the other.

use crate::array::VertexDist;
use crate::basics::{PointD, PI};
use crate::math::{calc_distance, calc_intersection, cross_product};

// ============================================================================
// Enums
// ============================================================================

/// Line cap style for open subpath ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

/// Line join style at subpath corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

// ============================================================================
// MathStroke
// ============================================================================

/// Stroke geometry calculator.
///
/// `width` is the full stroke width; the offset distance on each side is
/// half of it. Output vertices are written into a caller-owned `Vec<PointD>`
/// which is cleared first.
#[derive(Debug, Clone)]
pub struct MathStroke {
    width: f64,
    width_eps: f64,
    miter_limit: f64,
    inner_miter_limit: f64,
    approx_scale: f64,
    line_cap: LineCap,
    line_join: LineJoin,
}

impl MathStroke {
    pub fn new() -> Self {
        Self {
            width: 0.5,
            width_eps: 0.5 / 1024.0,
            miter_limit: 4.0,
            inner_miter_limit: 1.01,
            approx_scale: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
        }
    }

    pub fn set_line_cap(&mut self, lc: LineCap) {
        self.line_cap = lc;
    }
    pub fn line_cap(&self) -> LineCap {
        self.line_cap
    }

    pub fn set_line_join(&mut self, lj: LineJoin) {
        self.line_join = lj;
    }
    pub fn line_join(&self) -> LineJoin {
        self.line_join
    }

    pub fn set_width(&mut self, w: f64) {
        self.width = w.abs() * 0.5;
        self.width_eps = self.width / 1024.0;
    }
    pub fn width(&self) -> f64 {
        self.width * 2.0
    }

    pub fn set_miter_limit(&mut self, ml: f64) {
        self.miter_limit = ml;
    }
    pub fn miter_limit(&self) -> f64 {
        self.miter_limit
    }

    pub fn set_approximation_scale(&mut self, s: f64) {
        self.approx_scale = s;
    }
    pub fn approximation_scale(&self) -> f64 {
        self.approx_scale
    }

    /// Angular step for arcs of radius `width` so the chord error stays
    /// below 1/8 device pixel.
    fn arc_step(&self) -> f64 {
        (self.width / (self.width + 0.125 / self.approx_scale)).acos() * 2.0
    }

    /// Cap vertices at the end point `v0` of the edge `v0`–`v1` (length
    /// `len`), ordered from the left offset to the right offset.
    pub fn calc_cap(&self, vc: &mut Vec<PointD>, v0: &VertexDist, v1: &VertexDist, len: f64) {
        vc.clear();

        let dx1 = (v1.y - v0.y) / len * self.width;
        let dy1 = (v1.x - v0.x) / len * self.width;

        match self.line_cap {
            LineCap::Butt | LineCap::Square => {
                let (dx2, dy2) = if self.line_cap == LineCap::Square {
                    (dy1, dx1)
                } else {
                    (0.0, 0.0)
                };
                vc.push(PointD::new(v0.x - dx1 - dx2, v0.y + dy1 - dy2));
                vc.push(PointD::new(v0.x + dx1 - dx2, v0.y - dy1 - dy2));
            }
            LineCap::Round => {
                let n = (PI / self.arc_step()) as i32;
                let da = PI / (n + 1) as f64;

                vc.push(PointD::new(v0.x - dx1, v0.y + dy1));
                let mut a1 = dy1.atan2(-dx1) + da;
                for _ in 0..n {
                    vc.push(PointD::new(
                        v0.x + a1.cos() * self.width,
                        v0.y + a1.sin() * self.width,
                    ));
                    a1 += da;
                }
                vc.push(PointD::new(v0.x + dx1, v0.y - dy1));
            }
        }
    }

    /// Outline of a zero-length subpath at `(x, y)`: a circle for round
    /// caps, an axis-aligned square for square caps, nothing for butt caps.
    pub fn calc_dot(&self, vc: &mut Vec<PointD>, x: f64, y: f64) {
        vc.clear();
        let w = self.width;
        match self.line_cap {
            LineCap::Butt => {}
            LineCap::Square => {
                vc.push(PointD::new(x - w, y - w));
                vc.push(PointD::new(x + w, y - w));
                vc.push(PointD::new(x + w, y + w));
                vc.push(PointD::new(x - w, y + w));
            }
            LineCap::Round => {
                let n = ((2.0 * PI / self.arc_step()) as usize).max(8);
                let da = 2.0 * PI / n as f64;
                for i in 0..n {
                    let a = da * i as f64;
                    vc.push(PointD::new(x + a.cos() * w, y + a.sin() * w));
                }
            }
        }
    }

    /// Join vertices at `v1` for the edges `v0`→`v1` (length `len1`) and
    /// `v1`→`v2` (length `len2`).
    pub fn calc_join(
        &self,
        vc: &mut Vec<PointD>,
        v0: &VertexDist,
        v1: &VertexDist,
        v2: &VertexDist,
        len1: f64,
        len2: f64,
    ) {
        let dx1 = self.width * (v1.y - v0.y) / len1;
        let dy1 = self.width * (v1.x - v0.x) / len1;
        let dx2 = self.width * (v2.y - v1.y) / len2;
        let dy2 = self.width * (v2.x - v1.x) / len2;

        vc.clear();

        let cp = cross_product(v0.x, v0.y, v1.x, v1.y, v2.x, v2.y);
        if cp > 0.0 {
            // Inner join: a miter bounded by the shorter adjacent edge.
            let limit = (len1.min(len2) / self.width).max(self.inner_miter_limit);
            self.calc_miter(vc, v0, v1, v2, dx1, dy1, dx2, dy2, limit);
            return;
        }

        // Outer join
        let dx = (dx1 + dx2) / 2.0;
        let dy = (dy1 + dy2) / 2.0;
        let dbevel = (dx * dx + dy * dy).sqrt();

        if self.line_join != LineJoin::Miter
            && self.approx_scale * (self.width - dbevel) < self.width_eps
        {
            // Nearly straight: a single vertex is enough.
            match calc_intersection(
                v0.x + dx1,
                v0.y - dy1,
                v1.x + dx1,
                v1.y - dy1,
                v1.x + dx2,
                v1.y - dy2,
                v2.x + dx2,
                v2.y - dy2,
            ) {
                Some((ix, iy)) => vc.push(PointD::new(ix, iy)),
                None => vc.push(PointD::new(v1.x + dx1, v1.y - dy1)),
            }
            return;
        }

        match self.line_join {
            LineJoin::Miter => {
                self.calc_miter(vc, v0, v1, v2, dx1, dy1, dx2, dy2, self.miter_limit);
            }
            LineJoin::Round => {
                self.calc_arc(vc, v1.x, v1.y, dx1, -dy1, dx2, -dy2);
            }
            LineJoin::Bevel => {
                vc.push(PointD::new(v1.x + dx1, v1.y - dy1));
                vc.push(PointD::new(v1.x + dx2, v1.y - dy2));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn calc_arc(
        &self,
        vc: &mut Vec<PointD>,
        x: f64,
        y: f64,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
    ) {
        let mut a1 = dy1.atan2(dx1);
        let mut a2 = dy2.atan2(dx2);
        let da = self.arc_step();

        vc.push(PointD::new(x + dx1, y + dy1));
        if a1 > a2 {
            a2 += 2.0 * PI;
        }
        let n = ((a2 - a1) / da) as i32;
        let da = (a2 - a1) / (n + 1) as f64;
        a1 += da;
        for _ in 0..n {
            vc.push(PointD::new(x + a1.cos() * self.width, y + a1.sin() * self.width));
            a1 += da;
        }
        vc.push(PointD::new(x + dx2, y + dy2));
    }

    /// Miter join; falls back to a bevel when the tip lies further than
    /// `mlimit * width` from the vertex.
    #[allow(clippy::too_many_arguments)]
    fn calc_miter(
        &self,
        vc: &mut Vec<PointD>,
        v0: &VertexDist,
        v1: &VertexDist,
        v2: &VertexDist,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        mlimit: f64,
    ) {
        let lim = self.width * mlimit;

        match calc_intersection(
            v0.x + dx1,
            v0.y - dy1,
            v1.x + dx1,
            v1.y - dy1,
            v1.x + dx2,
            v1.y - dy2,
            v2.x + dx2,
            v2.y - dy2,
        ) {
            Some((xi, yi)) => {
                if calc_distance(v1.x, v1.y, xi, yi) <= lim {
                    vc.push(PointD::new(xi, yi));
                    return;
                }
            }
            None => {
                // Parallel offsets: collinear continuation needs one vertex.
                let x2 = v1.x + dx1;
                let y2 = v1.y - dy1;
                if (cross_product(v0.x, v0.y, v1.x, v1.y, x2, y2) < 0.0)
                    == (cross_product(v1.x, v1.y, v2.x, v2.y, x2, y2) < 0.0)
                {
                    vc.push(PointD::new(x2, y2));
                    return;
                }
            }
        }

        vc.push(PointD::new(v1.x + dx1, v1.y - dy1));
        vc.push(PointD::new(v1.x + dx2, v1.y - dy2));
    }
}

impl Default for MathStroke {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vd(x: f64, y: f64) -> VertexDist {
        VertexDist::new(x, y)
    }

    fn stroke(width: f64, cap: LineCap, join: LineJoin) -> MathStroke {
        let mut ms = MathStroke::new();
        ms.set_width(width);
        ms.set_line_cap(cap);
        ms.set_line_join(join);
        ms
    }

    #[test]
    fn test_butt_cap_is_flush() {
        let ms = stroke(10.0, LineCap::Butt, LineJoin::Miter);
        let mut vc = Vec::new();
        ms.calc_cap(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), 100.0);
        assert_eq!(vc, [PointD::new(0.0, 5.0), PointD::new(0.0, -5.0)]);
    }

    #[test]
    fn test_square_cap_extends_half_width() {
        let ms = stroke(10.0, LineCap::Square, LineJoin::Miter);
        let mut vc = Vec::new();
        ms.calc_cap(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), 100.0);
        assert_eq!(vc, [PointD::new(-5.0, 5.0), PointD::new(-5.0, -5.0)]);
    }

    #[test]
    fn test_round_cap_stays_on_circle() {
        let ms = stroke(10.0, LineCap::Round, LineJoin::Miter);
        let mut vc = Vec::new();
        ms.calc_cap(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), 100.0);
        assert!(vc.len() > 4);
        for p in &vc {
            assert!((calc_distance(0.0, 0.0, p.x, p.y) - 5.0).abs() < 1e-9);
            assert!(p.x <= 1e-9);
        }
    }

    #[test]
    fn test_miter_join_within_limit() {
        let ms = stroke(10.0, LineCap::Butt, LineJoin::Miter);
        let mut vc = Vec::new();
        ms.calc_join(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), &vd(100.0, 100.0), 100.0, 100.0);
        assert_eq!(vc.len(), 1);
        assert!((vc[0].x - 105.0).abs() < 1e-9 && (vc[0].y + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_miter_join_over_limit_bevels() {
        let mut ms = stroke(10.0, LineCap::Butt, LineJoin::Miter);
        ms.set_miter_limit(1.0);
        let mut vc = Vec::new();
        ms.calc_join(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), &vd(100.0, 100.0), 100.0, 100.0);
        assert_eq!(vc, [PointD::new(100.0, -5.0), PointD::new(105.0, 0.0)]);
    }

    #[test]
    fn test_bevel_join() {
        let ms = stroke(10.0, LineCap::Butt, LineJoin::Bevel);
        let mut vc = Vec::new();
        ms.calc_join(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), &vd(100.0, 100.0), 100.0, 100.0);
        assert_eq!(vc.len(), 2);
    }

    #[test]
    fn test_round_join_points_on_arc() {
        let ms = stroke(10.0, LineCap::Butt, LineJoin::Round);
        let mut vc = Vec::new();
        ms.calc_join(&mut vc, &vd(0.0, 0.0), &vd(100.0, 0.0), &vd(100.0, 100.0), 100.0, 100.0);
        assert!(vc.len() > 2);
        for p in &vc {
            assert!((calc_distance(100.0, 0.0, p.x, p.y) - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inner_join_is_miter() {
        let ms = stroke(10.0, LineCap::Butt, LineJoin::Round);
        let mut vc = Vec::new();
        // Reverse direction puts the offset side on the inside of the turn.
        ms.calc_join(&mut vc, &vd(100.0, 100.0), &vd(100.0, 0.0), &vd(0.0, 0.0), 100.0, 100.0);
        assert_eq!(vc.len(), 1);
        assert!((vc[0].x - 95.0).abs() < 1e-9 && (vc[0].y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_dots() {
        let mut vc = Vec::new();
        stroke(4.0, LineCap::Butt, LineJoin::Miter).calc_dot(&mut vc, 1.0, 1.0);
        assert!(vc.is_empty());
        stroke(4.0, LineCap::Square, LineJoin::Miter).calc_dot(&mut vc, 1.0, 1.0);
        assert_eq!(vc[0], PointD::new(-1.0, -1.0));
        assert_eq!(vc[2], PointD::new(3.0, 3.0));
        stroke(4.0, LineCap::Round, LineJoin::Miter).calc_dot(&mut vc, 1.0, 1.0);
        assert!(vc.len() >= 8);
        assert!(vc.iter().all(|p| (calc_distance(1.0, 1.0, p.x, p.y) - 2.0).abs() < 1e-9));
    }
}
