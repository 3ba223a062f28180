//! Stroke outline generator.
//!
//! [`Stroker`] buffers one subpath of centerline geometry at a time,
//! flattening curves on the way in, and emits closed outline polygons to
//! its downstream consumer whenever the subpath ends. The polygons are
//! meant to be filled with the non-zero rule.

use smallvec::SmallVec;

use crate::array::VertexSequence;
use crate::basics::PointD;
use crate::curves::{Curve3Div, Curve4Div};
use crate::error::StrokeParamError;
use crate::math_stroke::{LineCap, LineJoin, MathStroke};
use crate::path_consumer::PathConsumer;

/// Angle tolerance used when flattening curves under strokes wider than
/// one device pixel.
const WIDE_STROKE_ANGLE_TOLERANCE: f64 = 0.2;

// ============================================================================
// StrokeStyle
// ============================================================================

/// Which side(s) of the centerline a stroke covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrokePlacement {
    #[default]
    Centered,
    Inner,
    Outer,
}

/// Stroke parameters for one rasterization call.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dashes: SmallVec<[f64; 4]>,
    pub dash_phase: f64,
    pub placement: StrokePlacement,
}

impl StrokeStyle {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dashes: SmallVec::new(),
            dash_phase: 0.0,
            placement: StrokePlacement::Centered,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = limit;
        self
    }

    pub fn with_dashes(mut self, dashes: &[f64], phase: f64) -> Self {
        self.dashes = SmallVec::from_slice(dashes);
        self.dash_phase = phase;
        self
    }

    pub fn with_placement(mut self, placement: StrokePlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn is_dashed(&self) -> bool {
        !self.dashes.is_empty()
    }

    /// Reject parameters no stroke can be built from.
    pub fn validate(&self) -> Result<(), StrokeParamError> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(StrokeParamError::Width(self.width));
        }
        if self.miter_limit.is_nan() || self.miter_limit < 1.0 {
            return Err(StrokeParamError::MiterLimit(self.miter_limit));
        }
        if self.is_dashed() {
            let mut sum = 0.0;
            for (index, &value) in self.dashes.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(StrokeParamError::DashElement { index, value });
                }
                sum += value;
            }
            if sum <= 0.0 || !sum.is_finite() {
                return Err(StrokeParamError::DashSum(sum));
            }
            if !self.dash_phase.is_finite() || self.dash_phase < 0.0 {
                return Err(StrokeParamError::DashPhase(self.dash_phase));
            }
        }
        Ok(())
    }

    /// How far, in stroke widths, the outline can reach from the
    /// centerline. Used to expand clip rectangles for stroke input.
    pub fn reach(&self) -> f64 {
        let half = match self.placement {
            StrokePlacement::Centered => 0.5,
            StrokePlacement::Inner | StrokePlacement::Outer => 1.0,
        };
        let mut factor: f64 = 1.0;
        if self.join == LineJoin::Miter {
            factor = factor.max(self.miter_limit);
        }
        if self.cap == LineCap::Square {
            factor = factor.max(std::f64::consts::SQRT_2);
        }
        half * factor
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// ============================================================================
// Scratch
// ============================================================================

/// Reusable buffers for [`Stroker`], owned by a raster context.
#[derive(Debug, Default)]
pub struct StrokeScratch {
    vertices: VertexSequence,
    join: Vec<PointD>,
    polygon: Vec<PointD>,
    curve3: Curve3Div,
    curve4: Curve4Div,
}

// ============================================================================
// Stroker
// ============================================================================

/// Centerline-to-outline conversion stage.
pub struct Stroker<'a, D: PathConsumer> {
    out: D,
    math: MathStroke,
    width: f64,
    placement: StrokePlacement,
    scratch: &'a mut StrokeScratch,
    start: PointD,
    last: PointD,
    in_subpath: bool,
    has_drawing: bool,
    closed: bool,
    polygons: usize,
}

impl<'a, D: PathConsumer> Stroker<'a, D> {
    /// `width` is in the coordinate space of the incoming geometry;
    /// `approx_scale` maps that space to device pixels.
    pub fn new(
        out: D,
        style: &StrokeStyle,
        width: f64,
        approx_scale: f64,
        scratch: &'a mut StrokeScratch,
    ) -> Self {
        let mut math = MathStroke::new();
        math.set_width(width);
        math.set_line_cap(style.cap);
        math.set_line_join(style.join);
        math.set_miter_limit(style.miter_limit);
        math.set_approximation_scale(approx_scale);

        let angle_tolerance = if width * approx_scale > 1.0 {
            WIDE_STROKE_ANGLE_TOLERANCE
        } else {
            0.0
        };
        scratch.curve3.set_approximation_scale(approx_scale);
        scratch.curve3.set_angle_tolerance(angle_tolerance);
        scratch.curve4.set_approximation_scale(approx_scale);
        scratch.curve4.set_angle_tolerance(angle_tolerance);
        scratch.vertices.remove_all();

        Self {
            out,
            math,
            width,
            placement: style.placement,
            scratch,
            start: PointD::default(),
            last: PointD::default(),
            in_subpath: false,
            has_drawing: false,
            closed: false,
            polygons: 0,
        }
    }

    /// Number of outline polygons emitted so far.
    pub fn polygons(&self) -> usize {
        self.polygons
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    fn begin_drawing(&mut self) {
        if !self.in_subpath {
            // Continuing after a close: restart from the subpath start.
            self.scratch.vertices.remove_all();
            self.scratch.vertices.add(self.start.x, self.start.y);
            self.in_subpath = true;
            self.closed = false;
        }
        self.has_drawing = true;
    }

    fn flush(&mut self) {
        if self.in_subpath && self.has_drawing {
            self.stroke_subpath();
        }
        self.scratch.vertices.remove_all();
        self.in_subpath = false;
        self.has_drawing = false;
        self.closed = false;
    }

    fn stroke_subpath(&mut self) {
        let mut closed = self.closed;
        self.scratch.vertices.close(closed);
        let n = self.scratch.vertices.len();
        if n == 0 {
            return;
        }
        if n == 1 {
            let v = self.scratch.vertices[0];
            self.math.set_width(self.width);
            self.math.calc_dot(&mut self.scratch.polygon, v.x, v.y);
            self.emit_polygon();
            return;
        }
        if closed && n < 3 {
            closed = false;
            self.scratch.vertices.close(false);
        }

        if !closed {
            self.math.set_width(self.width);
            self.outline_open();
            return;
        }

        match self.placement {
            StrokePlacement::Centered => {
                self.math.set_width(self.width);
                self.scratch.polygon.clear();
                self.side_closed(true);
                self.emit_polygon();
                self.scratch.polygon.clear();
                self.side_closed(false);
                self.emit_polygon();
            }
            StrokePlacement::Inner | StrokePlacement::Outer => {
                // Ring between the centerline and a full-width offset.
                self.math.set_width(self.width * 2.0);
                let area = self.signed_area();
                let exterior = self.placement == StrokePlacement::Outer;
                let forward = (area >= 0.0) == exterior;

                self.scratch.polygon.clear();
                self.side_closed(forward);
                self.emit_polygon();

                self.scratch.polygon.clear();
                let verts = self.scratch.vertices.as_slice();
                if forward {
                    self.scratch
                        .polygon
                        .extend(verts.iter().rev().map(|v| PointD::new(v.x, v.y)));
                } else {
                    self.scratch
                        .polygon
                        .extend(verts.iter().map(|v| PointD::new(v.x, v.y)));
                }
                self.emit_polygon();
            }
        }
    }

    /// Joins on one side of a closed polyline. `forward` walks the
    /// vertices in order and offsets to `(dy, -dx)`; the other direction
    /// produces the opposite side.
    fn side_closed(&mut self, forward: bool) {
        let n = self.scratch.vertices.len();
        for k in 0..n {
            let i = if forward { k } else { n - 1 - k };
            let prev = *self.scratch.vertices.cyclic(i + n - 1);
            let curr = *self.scratch.vertices.cyclic(i);
            let next = *self.scratch.vertices.cyclic(i + 1);
            if forward {
                self.math
                    .calc_join(&mut self.scratch.join, &prev, &curr, &next, prev.dist, curr.dist);
            } else {
                self.math
                    .calc_join(&mut self.scratch.join, &next, &curr, &prev, curr.dist, prev.dist);
            }
            self.scratch.polygon.extend_from_slice(&self.scratch.join);
        }
    }

    fn outline_open(&mut self) {
        let n = self.scratch.vertices.len();
        self.scratch.polygon.clear();

        let v0 = self.scratch.vertices[0];
        let v1 = self.scratch.vertices[1];
        self.math.calc_cap(&mut self.scratch.join, &v0, &v1, v0.dist);
        self.scratch.polygon.extend_from_slice(&self.scratch.join);

        for i in 1..n - 1 {
            let prev = self.scratch.vertices[i - 1];
            let curr = self.scratch.vertices[i];
            let next = self.scratch.vertices[i + 1];
            self.math
                .calc_join(&mut self.scratch.join, &prev, &curr, &next, prev.dist, curr.dist);
            self.scratch.polygon.extend_from_slice(&self.scratch.join);
        }

        let last = self.scratch.vertices[n - 1];
        let before = self.scratch.vertices[n - 2];
        self.math.calc_cap(&mut self.scratch.join, &last, &before, before.dist);
        self.scratch.polygon.extend_from_slice(&self.scratch.join);

        for i in (1..n - 1).rev() {
            let prev = self.scratch.vertices[i - 1];
            let curr = self.scratch.vertices[i];
            let next = self.scratch.vertices[i + 1];
            self.math
                .calc_join(&mut self.scratch.join, &next, &curr, &prev, curr.dist, prev.dist);
            self.scratch.polygon.extend_from_slice(&self.scratch.join);
        }

        self.emit_polygon();
    }

    fn signed_area(&self) -> f64 {
        let verts = self.scratch.vertices.as_slice();
        let Some(&last) = verts.last() else {
            return 0.0;
        };
        let mut prev = last;
        let mut sum = 0.0;
        for v in verts {
            sum += prev.x * v.y - prev.y * v.x;
            prev = *v;
        }
        sum * 0.5
    }

    fn emit_polygon(&mut self) {
        let Some((first, rest)) = self.scratch.polygon.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        self.out.move_to(first.x, first.y);
        for p in rest {
            self.out.line_to(p.x, p.y);
        }
        self.out.close_path();
        self.polygons += 1;
    }
}

impl<D: PathConsumer> PathConsumer for Stroker<'_, D> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.flush();
        self.scratch.vertices.add(x, y);
        self.start = PointD::new(x, y);
        self.last = self.start;
        self.in_subpath = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.begin_drawing();
        self.scratch.vertices.add(x, y);
        self.last = PointD::new(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.begin_drawing();
        let p0 = self.last;
        let s = &mut *self.scratch;
        s.curve3.init(p0.x, p0.y, cx, cy, x, y);
        for p in &s.curve3.points()[1..] {
            s.vertices.add(p.x, p.y);
        }
        self.last = PointD::new(x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.begin_drawing();
        let p0 = self.last;
        let s = &mut *self.scratch;
        s.curve4.init(p0.x, p0.y, c1x, c1y, c2x, c2y, x, y);
        for p in &s.curve4.points()[1..] {
            s.vertices.add(p.x, p.y);
        }
        self.last = PointD::new(x, y);
    }

    fn close_path(&mut self) {
        if self.in_subpath {
            self.closed = true;
            self.flush();
            self.last = self.start;
        }
    }

    fn path_done(&mut self) {
        self.flush();
        self.out.path_done();
    }
}

// ============================================================================
// Tests
// ============================================================================
