//! Clipping stages.
//!
//! [`FillClipper`] bounds device-space fill geometry before it reaches the
//! renderer. [`StrokeClipper`] drops centerline segments whose stroke cannot
//! reach the clip rectangle, using a [`ClosedPathDetector`] so that the
//! stroker still sees each subpath's original topology.

use crate::basics::{PointD, RectD};
use crate::clip_liang_barsky::{
    clipping_flags, clipping_flags_y, hull_flags, CLIPPING_FLAGS_X_CLIPPED,
    CLIPPING_FLAGS_Y_CLIPPED,
};
use crate::curves::{split_cubic, split_quad};
use crate::path_consumer::PathConsumer;
use crate::path_storage::Segment;

/// Curves straddling the working rectangle are subdivided until their
/// control hull is this small, then treated as lines.
const CURVE_CLIP_TOLERANCE: f64 = 0.1;
const CURVE_CLIP_DEPTH_LIMIT: u32 = 64;

// ============================================================================
// FillClipper
// ============================================================================

/// Clips fill geometry against a working rectangle.
///
/// Parts beyond the left or right edge are projected onto that edge, which
/// preserves winding; parts beyond the top or bottom are dropped. Every
/// subpath is treated as closed and its closing edge is clipped too, so the
/// output subpaths close along the rectangle boundary.
///
/// Incoming curves must be monotonic in X and Y.
pub struct FillClipper<D: PathConsumer> {
    out: D,
    clip_box: RectD,
    start: PointD,
    x1: f64,
    y1: f64,
    f1: u32,
    in_subpath: bool,
    emitted: Option<PointD>,
}

impl<D: PathConsumer> FillClipper<D> {
    pub fn new(out: D, clip_box: RectD) -> Self {
        let mut clip_box = clip_box;
        clip_box.normalize();
        Self {
            out,
            clip_box,
            start: PointD::default(),
            x1: 0.0,
            y1: 0.0,
            f1: 0,
            in_subpath: false,
            emitted: None,
        }
    }

    pub fn clip_box(&self) -> &RectD {
        &self.clip_box
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    fn begin(&mut self, p: PointD) {
        self.start = p;
        self.x1 = p.x;
        self.y1 = p.y;
        self.f1 = clipping_flags(p.x, p.y, &self.clip_box);
        self.in_subpath = true;
        self.emitted = None;
    }

    fn ensure_subpath(&mut self) {
        if !self.in_subpath {
            self.begin(self.start);
        }
    }

    fn finish_subpath(&mut self) {
        if !self.in_subpath {
            return;
        }
        if self.x1 != self.start.x || self.y1 != self.start.y {
            self.clip_line_to(self.start.x, self.start.y);
        }
        if self.emitted.is_some() {
            self.out.close_path();
        }
        self.in_subpath = false;
        self.emitted = None;
    }

    /// Make `p` the current output point, bridging from the previous one.
    ///
    /// A gap between two visible pieces always runs along the top or bottom
    /// edge, so the bridging line is horizontal and adds no coverage.
    fn emit_point(&mut self, p: PointD) {
        match self.emitted {
            None => self.out.move_to(p.x, p.y),
            Some(e) if e != p => self.out.line_to(p.x, p.y),
            Some(_) => {}
        }
        self.emitted = Some(p);
    }

    fn emit_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.emit_point(PointD::new(x1, y1));
        let p = PointD::new(x2, y2);
        if self.emitted != Some(p) {
            self.out.line_to(x2, y2);
            self.emitted = Some(p);
        }
    }

    /// Clip a line from the current point in Y and emit it.
    #[allow(clippy::too_many_arguments)]
    fn line_clip_y(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, f1: u32, f2: u32) {
        let f1 = f1 & CLIPPING_FLAGS_Y_CLIPPED;
        let f2 = f2 & CLIPPING_FLAGS_Y_CLIPPED;

        if (f1 | f2) == 0 {
            self.emit_line(x1, y1, x2, y2);
        } else if f1 != f2 {
            let cb = self.clip_box;
            let (mut tx1, mut ty1, mut tx2, mut ty2) = (x1, y1, x2, y2);

            if f1 & 8 != 0 {
                // y1 < clip.y1
                tx1 = x1 + (cb.y1 - y1) * (x2 - x1) / (y2 - y1);
                ty1 = cb.y1;
            }
            if f1 & 2 != 0 {
                // y1 > clip.y2
                tx1 = x1 + (cb.y2 - y1) * (x2 - x1) / (y2 - y1);
                ty1 = cb.y2;
            }
            if f2 & 8 != 0 {
                tx2 = x1 + (cb.y1 - y1) * (x2 - x1) / (y2 - y1);
                ty2 = cb.y1;
            }
            if f2 & 2 != 0 {
                tx2 = x1 + (cb.y2 - y1) * (x2 - x1) / (y2 - y1);
                ty2 = cb.y2;
            }
            self.emit_line(tx1, ty1, tx2, ty2);
        }
        // Both beyond the same horizontal edge: nothing to draw.
    }

    fn clip_line_to(&mut self, x2: f64, y2: f64) {
        let f2 = clipping_flags(x2, y2, &self.clip_box);
        let (x1, y1, f1) = (self.x1, self.y1, self.f1);
        self.x1 = x2;
        self.y1 = y2;
        self.f1 = f2;

        if (f1 & CLIPPING_FLAGS_Y_CLIPPED) == (f2 & CLIPPING_FLAGS_Y_CLIPPED)
            && (f1 & CLIPPING_FLAGS_Y_CLIPPED) != 0
        {
            return;
        }

        let cb = self.clip_box;
        let y_at = |x: f64| y1 + (x - x1) * (y2 - y1) / (x2 - x1);

        match ((f1 & CLIPPING_FLAGS_X_CLIPPED) << 1) | (f2 & CLIPPING_FLAGS_X_CLIPPED) {
            0 => self.line_clip_y(x1, y1, x2, y2, f1, f2),
            1 => {
                // x2 > clip.x2
                let y3 = y_at(cb.x2);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(x1, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(cb.x2, y3, cb.x2, y2, f3, f2);
            }
            2 => {
                // x1 > clip.x2
                let y3 = y_at(cb.x2);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(cb.x2, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(cb.x2, y3, x2, y2, f3, f2);
            }
            3 => self.line_clip_y(cb.x2, y1, cb.x2, y2, f1, f2),
            4 => {
                // x2 < clip.x1
                let y3 = y_at(cb.x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(cb.x1, y3, cb.x1, y2, f3, f2);
            }
            6 => {
                // x1 > clip.x2 && x2 < clip.x1
                let y3 = y_at(cb.x2);
                let y4 = y_at(cb.x1);
                let f3 = clipping_flags_y(y3, &cb);
                let f4 = clipping_flags_y(y4, &cb);
                self.line_clip_y(cb.x2, y1, cb.x2, y3, f1, f3);
                self.line_clip_y(cb.x2, y3, cb.x1, y4, f3, f4);
                self.line_clip_y(cb.x1, y4, cb.x1, y2, f4, f2);
            }
            8 => {
                // x1 < clip.x1
                let y3 = y_at(cb.x1);
                let f3 = clipping_flags_y(y3, &cb);
                self.line_clip_y(cb.x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(cb.x1, y3, x2, y2, f3, f2);
            }
            9 => {
                // x1 < clip.x1 && x2 > clip.x2
                let y3 = y_at(cb.x1);
                let y4 = y_at(cb.x2);
                let f3 = clipping_flags_y(y3, &cb);
                let f4 = clipping_flags_y(y4, &cb);
                self.line_clip_y(cb.x1, y1, cb.x1, y3, f1, f3);
                self.line_clip_y(cb.x1, y3, cb.x2, y4, f3, f4);
                self.line_clip_y(cb.x2, y4, cb.x2, y2, f4, f2);
            }
            12 => self.line_clip_y(cb.x1, y1, cb.x1, y2, f1, f2),
            _ => {
                // 5, 7, 10, 11: impossible outcode combinations.
            }
        }
    }

    fn pass_curve_end(&mut self, end: PointD) {
        self.x1 = end.x;
        self.y1 = end.y;
        self.f1 = 0;
        self.emitted = Some(end);
    }

    /// `true` when the piece can no longer be usefully subdivided.
    fn is_flat(points: &[PointD], depth: u32) -> bool {
        if depth >= CURVE_CLIP_DEPTH_LIMIT {
            return true;
        }
        let first = points[0];
        points.iter().all(|p| {
            (p.x - first.x).abs() <= CURVE_CLIP_TOLERANCE
                && (p.y - first.y).abs() <= CURVE_CLIP_TOLERANCE
        })
    }

    fn clip_quad(&mut self, p: [PointD; 3], depth: u32) {
        let (and, or) = hull_flags(&p, &self.clip_box);
        if or == 0 {
            self.emit_point(p[0]);
            self.out.quad_to(p[1].x, p[1].y, p[2].x, p[2].y);
            self.pass_curve_end(p[2]);
        } else if and != 0 || Self::is_flat(&p, depth) {
            // Monotonic: the projected chord covers the same rows.
            self.clip_line_to(p[2].x, p[2].y);
        } else {
            let (l, r) = split_quad(p, 0.5);
            self.clip_quad(l, depth + 1);
            self.clip_quad(r, depth + 1);
        }
    }

    fn clip_cubic(&mut self, p: [PointD; 4], depth: u32) {
        let (and, or) = hull_flags(&p, &self.clip_box);
        if or == 0 {
            self.emit_point(p[0]);
            self.out
                .cubic_to(p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y);
            self.pass_curve_end(p[3]);
        } else if and != 0 || Self::is_flat(&p, depth) {
            self.clip_line_to(p[3].x, p[3].y);
        } else {
            let (l, r) = split_cubic(p, 0.5);
            self.clip_cubic(l, depth + 1);
            self.clip_cubic(r, depth + 1);
        }
    }
}

impl<D: PathConsumer> PathConsumer for FillClipper<D> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.finish_subpath();
        self.begin(PointD::new(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_subpath();
        self.clip_line_to(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_subpath();
        let p0 = PointD::new(self.x1, self.y1);
        self.clip_quad([p0, PointD::new(cx, cy), PointD::new(x, y)], 0);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_subpath();
        let p0 = PointD::new(self.x1, self.y1);
        self.clip_cubic(
            [
                p0,
                PointD::new(c1x, c1y),
                PointD::new(c2x, c2y),
                PointD::new(x, y),
            ],
            0,
        );
    }

    fn close_path(&mut self) {
        self.finish_subpath();
        self.x1 = self.start.x;
        self.y1 = self.start.y;
    }

    fn path_done(&mut self) {
        self.finish_subpath();
        self.out.path_done();
    }
}

// ============================================================================
// ClosedPathDetector
// ============================================================================

/// Buffers one subpath until its end so that its closedness is known
/// before anything is forwarded.
///
/// Closing appends the implicit closing edge, so a closed subpath's
/// segments always end at its start point.
#[derive(Debug, Default)]
pub struct ClosedPathDetector {
    start: PointD,
    segments: Vec<Segment>,
    visible: Vec<bool>,
    closed: bool,
}

impl ClosedPathDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, x: f64, y: f64) {
        self.start = PointD::new(x, y);
        self.segments.clear();
        self.closed = false;
    }

    pub fn push(&mut self, seg: Segment) {
        self.segments.push(seg);
    }

    pub fn close(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        if self.end_point(self.segments.len()) != self.start {
            self.segments
                .push(Segment::LineTo(self.start.x, self.start.y));
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn start(&self) -> PointD {
        self.start
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Point where segment `i` starts, which is where `i - 1` ends.
    fn end_point(&self, i: usize) -> PointD {
        if i == 0 {
            return self.start;
        }
        self.segments[i - 1].end_point().unwrap_or(self.start)
    }
}

// ============================================================================
// StrokeClipper
// ============================================================================

/// Removes centerline segments whose stroke cannot reach the clip.
///
/// `rect` must already be expanded by the stroke's reach. A segment whose
/// control points all lie beyond the same side of it is invisible; the
/// remaining visible runs are forwarded as open subpaths. A closed subpath
/// broken by invisible segments is replayed starting after its last
/// invisible segment, so its start vertex keeps its join. Subpaths without
/// invisible segments are forwarded unchanged, closes included.
pub struct StrokeClipper<'a, D: PathConsumer> {
    out: D,
    rect: RectD,
    detector: &'a mut ClosedPathDetector,
    in_subpath: bool,
    culled: usize,
}

impl<'a, D: PathConsumer> StrokeClipper<'a, D> {
    pub fn new(out: D, rect: RectD, detector: &'a mut ClosedPathDetector) -> Self {
        detector.begin(0.0, 0.0);
        Self {
            out,
            rect,
            detector,
            in_subpath: false,
            culled: 0,
        }
    }

    /// Number of invisible segments dropped so far.
    pub fn culled(&self) -> usize {
        self.culled
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    fn ensure_subpath(&mut self) {
        if !self.in_subpath {
            let s = self.detector.start;
            self.detector.begin(s.x, s.y);
            self.in_subpath = true;
        }
    }

    fn forward(&mut self, seg: Segment) {
        match seg {
            Segment::MoveTo(x, y) => self.out.move_to(x, y),
            Segment::LineTo(x, y) => self.out.line_to(x, y),
            Segment::QuadTo(cx, cy, x, y) => self.out.quad_to(cx, cy, x, y),
            Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                self.out.cubic_to(c1x, c1y, c2x, c2y, x, y)
            }
            Segment::Close => self.out.close_path(),
        }
    }

    fn flush(&mut self) {
        if !self.in_subpath {
            return;
        }
        self.in_subpath = false;
        let n = self.detector.segments.len();
        if n == 0 {
            return;
        }

        let rect = self.rect;
        let det = &mut *self.detector;
        det.visible.clear();
        let mut cur = det.start;
        for seg in &det.segments {
            let and = match *seg {
                Segment::LineTo(x, y) => hull_flags(&[cur, PointD::new(x, y)], &rect).0,
                Segment::QuadTo(cx, cy, x, y) => {
                    hull_flags(&[cur, PointD::new(cx, cy), PointD::new(x, y)], &rect).0
                }
                Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                    let pts = [
                        cur,
                        PointD::new(c1x, c1y),
                        PointD::new(c2x, c2y),
                        PointD::new(x, y),
                    ];
                    hull_flags(&pts, &rect).0
                }
                Segment::MoveTo(..) | Segment::Close => 0,
            };
            det.visible.push(and == 0);
            cur = seg.end_point().unwrap_or(cur);
        }

        let hidden = det.visible.iter().filter(|v| !**v).count();
        self.culled += hidden;

        if hidden == 0 {
            let start = self.detector.start;
            self.out.move_to(start.x, start.y);
            for i in 0..n {
                let seg = self.detector.segments[i];
                self.forward(seg);
            }
            if self.detector.closed {
                self.out.close_path();
            }
            return;
        }
        if hidden == n {
            return;
        }

        let det = &*self.detector;
        let first = if det.closed && det.visible[0] && det.visible[n - 1] {
            det.visible.iter().rposition(|v| !*v).map_or(0, |i| i + 1)
        } else {
            0
        };

        let mut in_run = false;
        for k in 0..n {
            let i = (first + k) % n;
            if !self.detector.visible[i] {
                in_run = false;
                continue;
            }
            if !in_run {
                let p = self.detector.end_point(i);
                self.out.move_to(p.x, p.y);
                in_run = true;
            }
            let seg = self.detector.segments[i];
            self.forward(seg);
        }
    }
}

impl<D: PathConsumer> PathConsumer for StrokeClipper<'_, D> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.flush();
        self.detector.begin(x, y);
        self.in_subpath = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_subpath();
        self.detector.push(Segment::LineTo(x, y));
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_subpath();
        self.detector.push(Segment::QuadTo(cx, cy, x, y));
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_subpath();
        self.detector
            .push(Segment::CubicTo(c1x, c1y, c2x, c2y, x, y));
    }

    fn close_path(&mut self) {
        if self.in_subpath {
            self.detector.close();
            self.flush();
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
    use crate::path_consumer::tests::CallLog;
    use crate::path_storage::{Path, PathRecorder};

    fn clip10() -> RectD {
        RectD::new(0.0, 0.0, 10.0, 10.0)
    }

    fn fill_clip(path: &Path) -> Path {
        let mut rec = PathRecorder::new(WindingRule::NonZero);
        path.feed(&mut FillClipper::new(&mut rec, clip10()));
        assert!(rec.is_done());
        rec.into_path()
    }

    fn within(path: &Path, r: &RectD) -> bool {
        path.segments().iter().all(|s| match *s {
            Segment::MoveTo(x, y) | Segment::LineTo(x, y) => r.hit_test(x, y),
            Segment::QuadTo(cx, cy, x, y) => r.hit_test(cx, cy) && r.hit_test(x, y),
            Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                r.hit_test(c1x, c1y) && r.hit_test(c2x, c2y) && r.hit_test(x, y)
            }
            Segment::Close => true,
        })
    }

    #[test]
    fn test_fill_inside_passes_through() {
        let mut log = CallLog::default();
        {
            let mut c = FillClipper::new(&mut log, clip10());
            c.move_to(1.0, 1.0);
            c.line_to(9.0, 1.0);
            c.line_to(9.0, 9.0);
            c.close_path();
            c.path_done();
        }
        assert_eq!(log.calls, ["M1,1", "L9,1", "L9,9", "L1,1", "Z", "done"]);
    }

    #[test]
    fn test_fill_drops_above() {
        let out = fill_clip(&Path::from_segments(
            [
                Segment::MoveTo(2.0, -10.0),
                Segment::LineTo(8.0, -10.0),
                Segment::LineTo(8.0, 5.0),
                Segment::LineTo(2.0, 5.0),
                Segment::Close,
            ],
            WindingRule::NonZero,
        ));
        assert!(within(&out, &clip10().expand(1e-9)));
        assert!((out.area() - 30.0).abs() < 1e-9, "{}", out.area());
    }

    #[test]
    fn test_fill_projects_left() {
        let out = fill_clip(&Path::rect(-5.0, 2.0, 10.0, 6.0));
        assert!(within(&out, &clip10().expand(1e-9)));
        assert!((out.area() - 30.0).abs() < 1e-9, "{}", out.area());
    }

    #[test]
    fn test_fill_corner_overlap_area() {
        // Diamond crossing every edge of the box.
        let out = fill_clip(&Path::from_segments(
            [
                Segment::MoveTo(5.0, -2.5),
                Segment::LineTo(12.5, 5.0),
                Segment::LineTo(5.0, 12.5),
                Segment::LineTo(-2.5, 5.0),
                Segment::Close,
            ],
            WindingRule::NonZero,
        ));
        assert!(within(&out, &clip10().expand(1e-9)));
        // Box minus four corner triangles with legs of 2.5.
        assert!((out.area().abs() - 87.5).abs() < 1e-9, "{}", out.area());
    }

    #[test]
    fn test_fill_outside_emits_nothing() {
        let mut log = CallLog::default();
        Path::rect(0.0, 20.0, 10.0, 10.0).feed(&mut FillClipper::new(&mut log, clip10()));
        assert_eq!(log.calls, ["done"]);
    }

    #[test]
    fn test_fill_curve_inside_kept() {
        let mut log = CallLog::default();
        {
            let mut c = FillClipper::new(&mut log, clip10());
            c.move_to(1.0, 1.0);
            c.quad_to(9.0, 1.0, 9.0, 9.0);
            c.path_done();
        }
        assert_eq!(log.calls[..2], ["M1,1", "Q9,1,9,9"]);
    }

    #[test]
    fn test_fill_curve_straddling_is_bounded() {
        let mut p = Path::new();
        p.move_to(5.0, 5.0);
        p.quad_to(15.0, 5.0, 15.0, 15.0);
        p.line_to(5.0, 15.0);
        p.close();
        let out = fill_clip(&p);
        assert!(!out.is_empty());
        assert!(within(&out, &clip10().expand(1e-9)));
    }

    #[test]
    fn test_fill_huge_curve_terminates() {
        let mut p = Path::new();
        p.move_to(-1e30, 4.0);
        p.cubic_to(-1e30, 5.0, 1e30, 5.0, 1e30, 6.0);
        p.close();
        let out = fill_clip(&p);
        assert!(within(&out, &clip10().expand(1e-9)));
        assert!(out.segments().len() < 10_000);
    }

    #[test]
    fn test_stroke_clip_all_visible() {
        let mut det = ClosedPathDetector::new();
        let mut log = CallLog::default();
        {
            let mut c = StrokeClipper::new(&mut log, clip10(), &mut det);
            c.move_to(1.0, 1.0);
            c.line_to(5.0, 1.0);
            c.line_to(5.0, 5.0);
            c.close_path();
            c.path_done();
            assert_eq!(c.culled(), 0);
        }
        assert_eq!(log.calls, ["M1,1", "L5,1", "L5,5", "L1,1", "Z", "done"]);
    }

    #[test]
    fn test_stroke_clip_open_runs() {
        let mut det = ClosedPathDetector::new();
        let mut log = CallLog::default();
        {
            let mut c = StrokeClipper::new(&mut log, clip10(), &mut det);
            c.move_to(5.0, 5.0);
            c.line_to(5.0, -20.0);
            c.line_to(30.0, -20.0);
            c.line_to(30.0, 5.0);
            c.line_to(8.0, 5.0);
            c.path_done();
            assert_eq!(c.culled(), 2);
        }
        assert_eq!(log.calls, ["M5,5", "L5,-20", "M30,5", "L8,5", "done"]);
    }

    #[test]
    fn test_stroke_clip_rotates_broken_closed_path() {
        let mut det = ClosedPathDetector::new();
        let mut log = CallLog::default();
        {
            let mut c = StrokeClipper::new(&mut log, clip10(), &mut det);
            c.move_to(2.0, 2.0);
            c.line_to(8.0, 2.0);
            c.line_to(8.0, 30.0);
            c.line_to(2.0, 30.0);
            c.close_path();
            c.path_done();
        }
        assert_eq!(log.calls, ["M2,30", "L2,2", "L8,2", "L8,30", "done"]);
    }

    #[test]
    fn test_stroke_clip_fully_hidden() {
        let mut det = ClosedPathDetector::new();
        let mut log = CallLog::default();
        Path::rect(50.0, 50.0, 5.0, 5.0).feed(&mut StrokeClipper::new(&mut log, clip10(), &mut det));
        assert_eq!(log.calls, ["done"]);
    }

    #[test]
    fn test_detector_closing_edge() {
        let mut det = ClosedPathDetector::new();
        det.begin(0.0, 0.0);
        det.push(Segment::LineTo(4.0, 0.0));
        det.push(Segment::LineTo(4.0, 4.0));
        assert!(!det.is_closed());
        det.close();
        assert!(det.is_closed());
        assert_eq!(det.segments().last(), Some(&Segment::LineTo(0.0, 0.0)));
        assert_eq!(det.start(), PointD::new(0.0, 0.0));
    }
}
