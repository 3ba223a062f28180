//! Curve monotonizer and line simplifier.
//!
//! Sits right before the fill clipper. Downstream stages can rely on every
//! curve being monotonic in both X and Y and on no zero-length lines.

use log::debug;

use crate::basics::PointD;
use crate::curves::{
    cubic_monotone_splits, quad_monotone_splits, split_cubic, split_quad, Curve4Div,
};
use crate::path_consumer::PathConsumer;

/// Default relative tolerance for collinearity tests.
pub const COLLINEARITY_EPSILON: f64 = 1e-9;

/// Monotonizing stage.
///
/// - zero-length lines are dropped;
/// - consecutive lines continuing in the same direction are merged;
/// - curves whose control points lie on the chord become lines;
/// - remaining curves are split at their X and Y extrema.
pub struct Monotonizer<D: PathConsumer> {
    out: D,
    epsilon: f64,
    start: PointD,
    /// Last point forwarded downstream.
    anchor: PointD,
    /// End of a line not yet forwarded, starting at `anchor`.
    pending: Option<PointD>,
    has_start: bool,
    unclassified: usize,
}

impl<D: PathConsumer> Monotonizer<D> {
    pub fn new(out: D) -> Self {
        Self::with_epsilon(out, COLLINEARITY_EPSILON)
    }

    /// `epsilon` is the sine of the largest angle still considered
    /// straight, also used relative to the chord length for curves.
    pub fn with_epsilon(out: D, epsilon: f64) -> Self {
        Self {
            out,
            epsilon,
            start: PointD::default(),
            anchor: PointD::default(),
            pending: None,
            has_start: false,
            unclassified: 0,
        }
    }

    /// Number of curves that could not be classified and were flattened.
    pub fn unclassified(&self) -> usize {
        self.unclassified
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    fn current(&self) -> PointD {
        self.pending.unwrap_or(self.anchor)
    }

    fn flush_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.out.line_to(p.x, p.y);
            self.anchor = p;
        }
    }

    fn ensure_start(&mut self) {
        if !self.has_start {
            self.out.move_to(self.start.x, self.start.y);
            self.anchor = self.start;
            self.has_start = true;
        }
    }

    /// `true` when `p` lies on the line through `a` and `b`, within the
    /// relative tolerance.
    fn on_chord(&self, a: PointD, b: PointD, p: PointD) -> bool {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
        let len = (dx * dx + dy * dy).sqrt();
        cross.abs() <= self.epsilon * len * len
    }

    fn push_line(&mut self, p: PointD) {
        let cur = self.current();
        if p == cur {
            return;
        }
        if let Some(end) = self.pending {
            let (ax, ay) = (end.x - self.anchor.x, end.y - self.anchor.y);
            let (bx, by) = (p.x - end.x, p.y - end.y);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;
            let la = (ax * ax + ay * ay).sqrt();
            let lb = (bx * bx + by * by).sqrt();
            if dot > 0.0 && cross.abs() <= self.epsilon * la * lb {
                self.pending = Some(p);
                return;
            }
            self.flush_pending();
        }
        self.pending = Some(p);
    }

    fn emit_quad(&mut self, p: [PointD; 3]) {
        self.flush_pending();
        self.out.quad_to(p[1].x, p[1].y, p[2].x, p[2].y);
        self.anchor = p[2];
    }

    fn emit_cubic(&mut self, p: [PointD; 4]) {
        self.flush_pending();
        self.out
            .cubic_to(p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y);
        self.anchor = p[3];
    }

    fn flatten_cubic(&mut self, p: [PointD; 4]) {
        self.unclassified += 1;
        debug!(
            "unclassifiable cubic ({}, {}) -> ({}, {}), flattening",
            p[0].x, p[0].y, p[3].x, p[3].y
        );
        let mut curve = Curve4Div::new();
        curve.init(
            p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y,
        );
        for q in &curve.points()[1..] {
            if q.x.is_finite() && q.y.is_finite() {
                self.push_line(*q);
            }
        }
    }
}

impl<D: PathConsumer> PathConsumer for Monotonizer<D> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.flush_pending();
        // Deferred: a subpath with no drawing segments is not forwarded.
        self.start = PointD::new(x, y);
        self.anchor = self.start;
        self.has_start = false;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = PointD::new(x, y);
        if p == self.current() {
            return;
        }
        self.ensure_start();
        self.push_line(p);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let p0 = self.current();
        let c = PointD::new(cx, cy);
        let p2 = PointD::new(x, y);
        if p0 == p2 {
            if c == p0 {
                return;
            }
        } else if self.on_chord(p0, p2, c) {
            self.line_to(x, y);
            return;
        }
        self.ensure_start();

        let mut rest = [p0, c, p2];
        let mut prev_t = 0.0;
        for t in quad_monotone_splits(&rest) {
            let (left, right) = split_quad(rest, (t - prev_t) / (1.0 - prev_t));
            self.emit_quad(left);
            rest = right;
            prev_t = t;
        }
        self.emit_quad(rest);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let p0 = self.current();
        let c1 = PointD::new(c1x, c1y);
        let c2 = PointD::new(c2x, c2y);
        let p3 = PointD::new(x, y);
        if p0 == p3 {
            if c1 == p0 && c2 == p0 {
                return;
            }
        } else if self.on_chord(p0, p3, c1) && self.on_chord(p0, p3, c2) {
            self.line_to(x, y);
            return;
        }
        self.ensure_start();

        let mut rest = [p0, c1, c2, p3];
        let Some(splits) = cubic_monotone_splits(&rest) else {
            self.flatten_cubic(rest);
            return;
        };
        let mut prev_t = 0.0;
        for t in splits {
            let (left, right) = split_cubic(rest, (t - prev_t) / (1.0 - prev_t));
            self.emit_cubic(left);
            rest = right;
            prev_t = t;
        }
        self.emit_cubic(rest);
    }

    fn close_path(&mut self) {
        if !self.has_start {
            return;
        }
        // A final line landing back on the start is implied by the close.
        if self.pending == Some(self.start) {
            self.pending = None;
        }
        self.flush_pending();
        self.out.close_path();
        self.anchor = self.start;
        self.has_start = false;
    }

    fn path_done(&mut self) {
        self.flush_pending();
        self.out.path_done();
    }
}
