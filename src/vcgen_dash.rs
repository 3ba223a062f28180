//! Dash generator.
//!
//! [`Dasher`] walks each subpath by arc length and forwards only the "on"
//! intervals of the dash pattern, each as an open subpath. Curves are
//! flattened first so dash lengths are measured along the real curve.

use log::debug;
use smallvec::SmallVec;

use crate::array::VertexSequence;
use crate::basics::{PointD, RectD};
use crate::clip_liang_barsky::{clip_segment_range, clipping_flags};
use crate::curves::{Curve3Div, Curve4Div};
use crate::math::calc_distance;
use crate::path_consumer::PathConsumer;

/// Pattern period, in device pixels, below which dashes are not resolvable
/// and the centerline is forwarded solid.
pub const MIN_DASH_PERIOD: f64 = 1.0 / 16.0;

/// Reusable buffers for [`Dasher`], owned by a raster context.
#[derive(Debug, Default)]
pub struct DashScratch {
    vertices: VertexSequence,
    points: Vec<PointD>,
    spans: Vec<(usize, usize)>,
    curve3: Curve3Div,
    curve4: Curve4Div,
}

/// Dash pattern with the cursor position derived from the phase.
#[derive(Debug, Clone)]
struct DashPattern {
    dashes: SmallVec<[f64; 8]>,
    period: f64,
    start_dash: usize,
    start_offset: f64,
}

impl DashPattern {
    /// `dashes` must be validated (finite, positive). Odd-length patterns
    /// are repeated once so entries alternate on/off.
    fn new(dashes: &[f64], phase: f64, scale: f64) -> Self {
        let mut v: SmallVec<[f64; 8]> = dashes.iter().map(|d| d * scale).collect();
        if v.len() % 2 == 1 {
            let copy = v.clone();
            v.extend(copy);
        }
        let total: f64 = v.iter().sum();
        if v.is_empty() || !(total > 0.0 && total.is_finite()) {
            // Solid: a single endless "on" interval.
            v = SmallVec::from_slice(&[f64::INFINITY, f64::INFINITY]);
        }
        let mut ds = if total.is_finite() && total > 0.0 {
            (phase * scale) % total
        } else {
            0.0
        };
        let mut start_dash = 0;
        for _ in 0..v.len() {
            if ds < v[start_dash] {
                break;
            }
            ds -= v[start_dash];
            start_dash = (start_dash + 1) % v.len();
        }
        Self {
            start_offset: ds.clamp(0.0, v[start_dash]),
            period: v.iter().sum(),
            dashes: v,
            start_dash,
        }
    }
}

/// Dash stage.
pub struct Dasher<'a, D: PathConsumer> {
    out: D,
    pattern: DashPattern,
    cull: Option<RectD>,
    scratch: &'a mut DashScratch,
    start: PointD,
    last: PointD,
    in_subpath: bool,
    closed: bool,
    emitted: usize,
    culled: usize,
}

impl<'a, D: PathConsumer> Dasher<'a, D> {
    /// `dashes` and `phase` are in pattern units and are multiplied by
    /// `scale`; `approx_scale` maps working units to device pixels and
    /// controls curve flattening. A pattern whose period is shorter than
    /// [`MIN_DASH_PERIOD`] pixels is treated as solid. Spans lying entirely
    /// beyond one side of `cull` are dropped.
    pub fn new(
        out: D,
        dashes: &[f64],
        phase: f64,
        scale: f64,
        approx_scale: f64,
        cull: Option<RectD>,
        scratch: &'a mut DashScratch,
    ) -> Self {
        scratch.curve3.set_approximation_scale(approx_scale);
        scratch.curve4.set_approximation_scale(approx_scale);
        scratch.vertices.remove_all();
        let mut pattern = DashPattern::new(dashes, phase, scale);
        if pattern.period * approx_scale < MIN_DASH_PERIOD {
            debug!(
                "dash period {} is below {} px, stroking solid",
                pattern.period * approx_scale,
                MIN_DASH_PERIOD
            );
            pattern = DashPattern::new(&[], 0.0, 1.0);
        }
        Self {
            out,
            pattern,
            cull: cull.filter(|r| r.x1 <= r.x2 && r.y1 <= r.y2),
            scratch,
            start: PointD::default(),
            last: PointD::default(),
            in_subpath: false,
            closed: false,
            emitted: 0,
            culled: 0,
        }
    }

    /// Number of "on" spans forwarded and culled so far.
    pub fn span_counts(&self) -> (usize, usize) {
        (self.emitted, self.culled)
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    fn ensure_subpath(&mut self) {
        if !self.in_subpath {
            self.scratch.vertices.remove_all();
            self.scratch.vertices.add(self.start.x, self.start.y);
            self.in_subpath = true;
            self.closed = false;
        }
    }

    fn flush(&mut self) {
        if self.in_subpath {
            self.dash_subpath();
        }
        self.scratch.vertices.remove_all();
        self.in_subpath = false;
        self.closed = false;
    }

    fn dash_subpath(&mut self) {
        let closed = self.closed && self.scratch.vertices.len() > 2;
        self.scratch.vertices.close(closed);
        let n = self.scratch.vertices.len();
        if n < 2 {
            return;
        }

        let s = &mut *self.scratch;
        s.points.clear();
        s.spans.clear();

        let mut walk = DashWalk {
            pattern: &self.pattern,
            idx: self.pattern.start_dash,
            rest: self.pattern.dashes[self.pattern.start_dash] - self.pattern.start_offset,
            span_start: 0,
            points: &mut s.points,
            spans: &mut s.spans,
        };
        let first = s.vertices[0];
        let starts_on = walk.is_on();
        if starts_on {
            walk.points.push(PointD::new(first.x, first.y));
        }

        let edges = if closed { n } else { n - 1 };
        for e in 0..edges {
            let a = s.vertices[e];
            let b = *s.vertices.cyclic(e + 1);
            let pa = PointD::new(a.x, a.y);
            let pb = PointD::new(b.x, b.y);
            let len = a.dist;
            let range = match &self.cull {
                Some(cull) => clip_segment_range(&pa, &pb, cull),
                None => Some((0.0, 1.0)),
            };
            match range {
                None => walk.skip(len, pb),
                Some((t0, t1)) => {
                    let mut p0 = if t0 > 0.0 { lerp(&pa, &pb, t0) } else { pa };
                    let mut p1 = if t1 < 1.0 { lerp(&pa, &pb, t1) } else { pb };
                    if let Some(cull) = &self.cull {
                        p0 = clamp_to(p0, cull);
                        p1 = clamp_to(p1, cull);
                    }
                    if t0 > 0.0 {
                        walk.skip(len * t0, p0);
                    }
                    walk.advance(&p0, &p1);
                    if t1 < 1.0 {
                        walk.skip(len * (1.0 - t1), pb);
                    }
                }
            }
        }
        let ends_on = walk.is_on();
        if ends_on {
            walk.spans.push((walk.span_start, walk.points.len()));
        }

        let spans = std::mem::take(&mut s.spans);
        let joined = closed && starts_on && ends_on;
        if joined && spans.len() == 1 {
            // One dash covers the whole closed subpath.
            self.emit_span(spans[0], None, true);
        } else if joined {
            let (head, tail) = (spans[0], spans[spans.len() - 1]);
            for &span in &spans[1..spans.len() - 1] {
                self.emit_span(span, None, false);
            }
            self.emit_span(tail, Some(head), false);
        } else {
            for &span in &spans {
                self.emit_span(span, None, false);
            }
        }
        self.scratch.spans = spans;
    }

    /// Forward `points[span]`, optionally continued by `points[tail]`
    /// (skipping its first point, which coincides with the seam).
    fn emit_span(&mut self, span: (usize, usize), tail: Option<(usize, usize)>, close: bool) {
        let points = &self.scratch.points;
        let main = &points[span.0..span.1];
        let extra = match tail {
            Some((a, b)) if b > a + 1 => &points[a + 1..b],
            _ => &[][..],
        };
        if main.len() + extra.len() < 2 {
            return;
        }
        if let Some(cull) = &self.cull {
            let mut flags = !0u32;
            for p in main.iter().chain(extra) {
                flags &= clipping_flags(p.x, p.y, cull);
                if flags == 0 {
                    break;
                }
            }
            if flags != 0 {
                self.culled += 1;
                return;
            }
        }
        let mut it = main.iter().chain(extra);
        if let Some(p) = it.next() {
            self.out.move_to(p.x, p.y);
        }
        for p in it {
            self.out.line_to(p.x, p.y);
        }
        if close {
            self.out.close_path();
        }
        self.emitted += 1;
    }
}

#[inline]
fn clamp_to(p: PointD, r: &RectD) -> PointD {
    PointD::new(p.x.clamp(r.x1, r.x2), p.y.clamp(r.y1, r.y2))
}

#[inline]
fn lerp(a: &PointD, b: &PointD, t: f64) -> PointD {
    PointD::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Pattern cursor while walking one subpath.
struct DashWalk<'w> {
    pattern: &'w DashPattern,
    idx: usize,
    /// Length left in the current dash entry.
    rest: f64,
    span_start: usize,
    points: &'w mut Vec<PointD>,
    spans: &'w mut Vec<(usize, usize)>,
}

impl DashWalk<'_> {
    #[inline]
    fn is_on(&self) -> bool {
        self.idx % 2 == 0
    }

    fn next_dash(&mut self) {
        self.idx = (self.idx + 1) % self.pattern.dashes.len();
        self.rest = self.pattern.dashes[self.idx];
    }

    /// Walk the edge `a → b`, recording every dash boundary.
    fn advance(&mut self, a: &PointD, b: &PointD) {
        let len = calc_distance(a.x, a.y, b.x, b.y);
        if !(len.is_finite() && len > 0.0) {
            if self.is_on() {
                self.points.push(*b);
            }
            return;
        }
        let to = len;
        let mut pos = 0.0;
        while to - pos > self.rest {
            let next = pos + self.rest;
            if next <= pos {
                // The dash no longer moves the cursor at this magnitude.
                break;
            }
            pos = next;
            let p = lerp(a, b, pos / len);
            if self.is_on() {
                self.points.push(p);
                self.spans.push((self.span_start, self.points.len()));
            } else {
                self.span_start = self.points.len();
                self.points.push(p);
            }
            self.next_dash();
        }
        self.rest = (self.rest - (to - pos)).max(0.0);
        if self.is_on() {
            self.points.push(*b);
        }
    }

    /// Move the cursor `dist` along invisible geometry ending at `end`,
    /// without recording the dashes in between. A dash that is on across
    /// the skipped part is split there.
    fn skip(&mut self, dist: f64, end: PointD) {
        let dist = if dist.is_finite() { dist.max(0.0) } else { 0.0 };
        if self.is_on() {
            self.spans.push((self.span_start, self.points.len()));
        }
        if dist < self.rest {
            self.rest -= dist;
        } else {
            let mut d = dist - self.rest;
            self.next_dash();
            if self.pattern.period.is_finite() {
                d %= self.pattern.period;
            }
            // Bounded: after the modulo, d spans less than one period.
            for _ in 0..=self.pattern.dashes.len() {
                if d < self.rest {
                    break;
                }
                d -= self.rest;
                self.next_dash();
            }
            self.rest = (self.rest - d).max(0.0);
        }
        if self.is_on() {
            self.span_start = self.points.len();
            self.points.push(end);
        }
    }
}

impl<D: PathConsumer> PathConsumer for Dasher<'_, D> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.flush();
        self.start = PointD::new(x, y);
        self.last = self.start;
        self.scratch.vertices.add(x, y);
        self.in_subpath = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_subpath();
        self.scratch.vertices.add(x, y);
        self.last = PointD::new(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_subpath();
        let p0 = self.last;
        let s = &mut *self.scratch;
        s.curve3.init(p0.x, p0.y, cx, cy, x, y);
        for p in &s.curve3.points()[1..] {
            s.vertices.add(p.x, p.y);
        }
        self.last = PointD::new(x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_subpath();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::WindingRule;
    use crate::path_storage::{Path, PathRecorder, Segment};
    use proptest::prelude::*;

    fn dash(path: &Path, dashes: &[f64], phase: f64, cull: Option<RectD>) -> (Path, (usize, usize)) {
        let mut scratch = DashScratch::default();
        let mut rec = PathRecorder::new(WindingRule::NonZero);
        let counts = {
            let mut d = Dasher::new(&mut rec, dashes, phase, 1.0, 1.0, cull, &mut scratch);
            path.feed(&mut d);
            d.span_counts()
        };
        (rec.into_path(), counts)
    }

    /// Snap to a 1e-6 grid so accumulated walk error compares exactly.
    fn snap(v: f64) -> f64 {
        (v * 1e6).round() / 1e6
    }

    /// (start, end) x-coordinates of each emitted span along the x axis.
    fn spans_x(path: &Path) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let mut start = 0.0;
        let mut end = 0.0;
        for seg in path.segments() {
            match *seg {
                Segment::MoveTo(x, _) => {
                    if end > start {
                        out.push((snap(start), snap(end)));
                    }
                    start = x;
                    end = x;
                }
                Segment::LineTo(x, _) => end = x,
                _ => {}
            }
        }
        if end > start {
            out.push((snap(start), snap(end)));
        }
        out
    }

    fn horizontal(len: f64) -> Path {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(len, 0.0);
        p
    }

    #[test]
    fn test_dash_partition_of_line() {
        let (out, (emitted, _)) = dash(&horizontal(100.0), &[10.0, 5.0], 0.0, None);
        let spans = spans_x(&out);
        assert_eq!(emitted, 7);
        assert_eq!(
            spans,
            [
                (0.0, 10.0),
                (15.0, 25.0),
                (30.0, 40.0),
                (45.0, 55.0),
                (60.0, 70.0),
                (75.0, 85.0),
                (90.0, 100.0),
            ]
        );
        let total: f64 = spans.iter().map(|(a, b)| b - a).sum();
        assert!((total - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_period_strokes_solid() {
        for dashes in [[1e-300, 1e-300], [0.01, 0.01]] {
            let (out, (emitted, culled)) = dash(&horizontal(100.0), &dashes, 0.0, None);
            assert_eq!((emitted, culled), (1, 0));
            assert_eq!(spans_x(&out), [(0.0, 100.0)]);
        }
    }

    #[test]
    fn test_period_threshold_uses_approximation_scale() {
        let run = |approx: f64| {
            let mut scratch = DashScratch::default();
            let mut rec = PathRecorder::new(WindingRule::NonZero);
            let mut d = Dasher::new(&mut rec, &[1.0, 1.0], 0.0, 1.0, approx, None, &mut scratch);
            horizontal(100.0).feed(&mut d);
            d.span_counts().0
        };
        assert_eq!(run(1.0), 50);
        // Two units at 0.02 px per unit is below the resolvable period.
        assert_eq!(run(0.02), 1);
    }

    #[test]
    fn test_closed_tiny_period_stays_closed() {
        let (out, (emitted, _)) = dash(&Path::rect(0.0, 0.0, 10.0, 10.0), &[1e-9], 0.0, None);
        assert_eq!(emitted, 1);
        assert!(matches!(out.segments().last(), Some(Segment::Close)));
    }

    #[test]
    fn test_phase_shifts_pattern() {
        let (out, _) = dash(&horizontal(30.0), &[10.0, 5.0], 12.0, None);
        let spans = spans_x(&out);
        // Phase 12 lands 2 units into the gap.
        assert_eq!(spans, [(3.0, 13.0), (18.0, 28.0)]);
    }

    #[test]
    fn test_phase_wraps_modulo_total() {
        let (a, _) = dash(&horizontal(50.0), &[10.0, 5.0], 3.0, None);
        let (b, _) = dash(&horizontal(50.0), &[10.0, 5.0], 33.0, None);
        assert_eq!(spans_x(&a), spans_x(&b));
    }

    #[test]
    fn test_odd_pattern_repeats() {
        let (out, _) = dash(&horizontal(40.0), &[10.0], 0.0, None);
        assert_eq!(spans_x(&out), [(0.0, 10.0), (20.0, 30.0)]);
    }

    #[test]
    fn test_spans_are_open_subpaths() {
        let (out, _) = dash(&horizontal(100.0), &[10.0, 5.0], 0.0, None);
        assert!(!out.segments().contains(&Segment::Close));
    }

    #[test]
    fn test_closed_subpath_joins_first_and_last_span() {
        // Perimeter 400, period 50. Phase 10 leaves 20 units of the first
        // dash, and the final span (390..400) continues into it.
        let (out, (emitted, _)) = dash(&Path::rect(0.0, 0.0, 100.0, 100.0), &[30.0, 20.0], 10.0, None);
        assert_eq!(emitted, 8);
        // The joined span passes through the start corner.
        let moves = out
            .segments()
            .iter()
            .filter(|s| matches!(s, Segment::MoveTo(..)))
            .count();
        assert_eq!(moves, 8);
        assert!(out.segments().contains(&Segment::LineTo(0.0, 0.0)));
    }

    #[test]
    fn test_single_dash_covering_closed_path_stays_closed() {
        let (out, (emitted, _)) = dash(&Path::rect(0.0, 0.0, 10.0, 10.0), &[100.0, 5.0], 0.0, None);
        assert_eq!(emitted, 1);
        assert_eq!(out.segments().last(), Some(&Segment::Close));
    }

    #[test]
    fn test_curve_dash_length_follows_arc() {
        // Quarter circle of radius 100, arc length ~157.
        let mut p = Path::new();
        p.move_to(100.0, 0.0);
        p.cubic_to(100.0, 55.228, 55.228, 100.0, 0.0, 100.0);
        let (_, (emitted, _)) = dash(&p, &[10.0, 10.0], 0.0, None);
        assert_eq!(emitted, 8);
    }

    #[test]
    fn test_cull_stops_at_rect_edge() {
        let cull = RectD::new(-1.0, -1.0, 50.0, 1.0);
        let (out, (emitted, culled)) = dash(&horizontal(100.0), &[10.0, 5.0], 0.0, Some(cull));
        assert_eq!(spans_x(&out), [(0.0, 10.0), (15.0, 25.0), (30.0, 40.0), (45.0, 50.0)]);
        assert_eq!((emitted, culled), (4, 0));
    }

    #[test]
    fn test_cull_skips_invisible_length_but_keeps_phase() {
        let mut p = Path::new();
        p.move_to(-1000.0, 0.0);
        p.line_to(100.0, 0.0);
        let cull = RectD::new(-1.0, -1.0, 48.0, 1.0);
        let (out, (emitted, _)) = dash(&p, &[10.0, 5.0], 0.0, Some(cull));
        assert_eq!(emitted, 4);
        let expected = [(-1.0, 0.0), (5.0, 15.0), (20.0, 30.0), (35.0, 45.0)];
        for (got, want) in spans_x(&out).iter().zip(expected) {
            assert!((got.0 - want.0).abs() < 1e-9 && (got.1 - want.1).abs() < 1e-9, "{got:?}");
        }
    }

    #[test]
    fn test_cull_culls_subpath_outside() {
        let mut p = Path::new();
        p.move_to(0.0, 10.0);
        p.line_to(40.0, 10.0);
        let cull = RectD::new(-1.0, -1.0, 50.0, 1.0);
        let (out, (emitted, culled)) = dash(&p, &[10.0, 5.0], 0.0, Some(cull));
        assert_eq!((emitted, culled), (0, 0));
        assert!(out.is_empty());
    }

    #[test]
    fn test_huge_invisible_edge_terminates() {
        let mut p = Path::new();
        p.move_to(-1e13, 5.0);
        p.line_to(1e13, 5.0);
        p.line_to(1e13, 1e13);
        let cull = RectD::new(0.0, 0.0, 10.0, 10.0);
        let (out, (emitted, _)) = dash(&p, &[1.0, 1.0], 0.0, Some(cull));
        assert!(emitted >= 4 && emitted <= 6, "{emitted}");
        assert!(out.bounding_rect().map_or(false, |r| r.x1 >= -0.05 && r.x2 <= 10.05));
    }

    proptest! {
        #[test]
        fn prop_on_length_matches_pattern(len in 1.0f64..500.0, on in 0.5f64..40.0, off in 0.5f64..40.0) {
            let (out, _) = dash(&horizontal(len), &[on, off], 0.0, None);
            let total: f64 = spans_x(&out).iter().map(|(a, b)| b - a).sum();
            let period = on + off;
            let full = (len / period).floor();
            let expected = full * on + (len - full * period).min(on);
            prop_assert!((total - expected).abs() < 1e-6);
        }
    }
}
