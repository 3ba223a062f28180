//! Path storage: the caller-owned geometry fed into the pipeline.
//!
//! A [`Path`] is an ordered list of [`Segment`]s plus a [`WindingRule`].
//! Appending validates as it goes: non-finite segments are dropped, the
//! first segment of every subpath is a `MoveTo`, and `Close` only follows
//! an open subpath. Downstream stages can therefore rely on well-formed,
//! finite input.

use crate::basics::{PointD, RectD, WindingRule};
use crate::bounding_rect::bounding_rect;
use crate::curves::{Curve3Div, Curve4Div};
use crate::math::calc_polygon_area;
use crate::path_consumer::PathConsumer;

/// One path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    Close,
}

impl Segment {
    /// `true` when every coordinate of the segment is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            Segment::MoveTo(x, y) | Segment::LineTo(x, y) => x.is_finite() && y.is_finite(),
            Segment::QuadTo(cx, cy, x, y) => {
                cx.is_finite() && cy.is_finite() && x.is_finite() && y.is_finite()
            }
            Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => [c1x, c1y, c2x, c2y, x, y]
                .iter()
                .all(|v| v.is_finite()),
            Segment::Close => true,
        }
    }

    /// End point of the segment, if it has one.
    pub fn end_point(&self) -> Option<PointD> {
        match *self {
            Segment::MoveTo(x, y)
            | Segment::LineTo(x, y)
            | Segment::QuadTo(_, _, x, y)
            | Segment::CubicTo(_, _, _, _, x, y) => Some(PointD::new(x, y)),
            Segment::Close => None,
        }
    }
}

/// Ordered segment list with a winding rule.
#[derive(Debug, Clone, Default)]
pub struct Path {
    segments: Vec<Segment>,
    winding: WindingRule,
    start: Option<PointD>,
    current: Option<PointD>,
    subpath_open: bool,
    skipped: bool,
}

impl Path {
    /// Create an empty non-zero path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty path with the given winding rule.
    pub fn with_winding(winding: WindingRule) -> Self {
        Self {
            winding,
            ..Self::default()
        }
    }

    /// Build a path from segments, applying the usual validation.
    pub fn from_segments<I: IntoIterator<Item = Segment>>(segments: I, winding: WindingRule) -> Self {
        let mut path = Self::with_winding(winding);
        for s in segments {
            path.push(s);
        }
        path
    }

    /// Axis-aligned rectangle as one closed subpath.
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        let mut path = Self::new();
        path.move_to(x, y);
        path.line_to(x + w, y);
        path.line_to(x + w, y + h);
        path.line_to(x, y + h);
        path.close();
        path
    }

    /// Ellipse as four cubic arcs.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        const KAPPA: f64 = 0.552_284_749_830_793_4;
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;
        let mut path = Self::new();
        path.move_to(cx + rx, cy);
        path.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
        path.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
        path.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
        path.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
        path.close();
        path
    }

    pub fn winding(&self) -> WindingRule {
        self.winding
    }

    pub fn set_winding(&mut self, winding: WindingRule) {
        self.winding = winding;
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Remove all segments (keeps allocated memory).
    pub fn remove_all(&mut self) {
        self.segments.clear();
        self.start = None;
        self.current = None;
        self.subpath_open = false;
        self.skipped = false;
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.push(Segment::MoveTo(x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.push(Segment::LineTo(x, y));
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.push(Segment::QuadTo(cx, cy, x, y));
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.push(Segment::CubicTo(c1x, c1y, c2x, c2y, x, y));
    }

    pub fn close(&mut self) {
        self.push(Segment::Close);
    }

    /// Append a segment.
    ///
    /// A non-finite segment is dropped and the next valid coordinate starts
    /// a fresh subpath with a `MoveTo`. A drawing segment without a current
    /// point also becomes a `MoveTo` to its end point; after a `Close` the
    /// next drawing segment starts from the closed subpath's start point.
    pub fn push(&mut self, seg: Segment) {
        if !seg.is_finite() {
            self.skipped = true;
            if matches!(seg, Segment::MoveTo(..)) {
                self.subpath_open = false;
            }
            return;
        }
        match seg {
            Segment::MoveTo(x, y) => {
                self.begin_subpath(PointD::new(x, y));
            }
            Segment::Close => {
                if self.subpath_open && !self.skipped {
                    self.segments.push(Segment::Close);
                    self.current = self.start;
                }
                self.subpath_open = false;
            }
            _ => {
                // Drawing segments always have an end point.
                let Some(end) = seg.end_point() else {
                    return;
                };
                if self.skipped || self.current.is_none() {
                    self.begin_subpath(end);
                    return;
                }
                if !self.subpath_open {
                    if let Some(start) = self.current {
                        self.begin_subpath(start);
                    }
                }
                self.segments.push(seg);
                self.current = Some(end);
            }
        }
    }

    fn begin_subpath(&mut self, p: PointD) {
        self.segments.push(Segment::MoveTo(p.x, p.y));
        self.start = Some(p);
        self.current = Some(p);
        self.subpath_open = true;
        self.skipped = false;
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Bounding box of all control points (a conservative bound for curves).
    pub fn bounding_rect(&self) -> Option<RectD> {
        bounding_rect(&self.segments)
    }

    /// Replay the path into a consumer, finishing with `path_done`.
    pub fn feed<C: PathConsumer + ?Sized>(&self, consumer: &mut C) {
        for seg in &self.segments {
            match *seg {
                Segment::MoveTo(x, y) => consumer.move_to(x, y),
                Segment::LineTo(x, y) => consumer.line_to(x, y),
                Segment::QuadTo(cx, cy, x, y) => consumer.quad_to(cx, cy, x, y),
                Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                    consumer.cubic_to(c1x, c1y, c2x, c2y, x, y)
                }
                Segment::Close => consumer.close_path(),
            }
        }
        consumer.path_done();
    }

    /// Sum of the signed areas of all subpaths (each implicitly closed),
    /// with curves flattened.
    pub fn area(&self) -> f64 {
        let mut total = 0.0;
        let mut poly: Vec<PointD> = Vec::new();
        let mut c3 = Curve3Div::new();
        let mut c4 = Curve4Div::new();
        for seg in &self.segments {
            match *seg {
                Segment::MoveTo(x, y) => {
                    total += calc_polygon_area(&poly);
                    poly.clear();
                    poly.push(PointD::new(x, y));
                }
                Segment::LineTo(x, y) => poly.push(PointD::new(x, y)),
                Segment::QuadTo(cx, cy, x, y) => {
                    if let Some(&p0) = poly.last() {
                        c3.init(p0.x, p0.y, cx, cy, x, y);
                        poly.extend_from_slice(&c3.points()[1..]);
                    }
                }
                Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                    if let Some(&p0) = poly.last() {
                        c4.init(p0.x, p0.y, c1x, c1y, c2x, c2y, x, y);
                        poly.extend_from_slice(&c4.points()[1..]);
                    }
                }
                Segment::Close => {}
            }
        }
        total + calc_polygon_area(&poly)
    }
}

// ============================================================================
// PathRecorder
// ============================================================================

/// A consumer that records everything it receives into a [`Path`].
#[derive(Debug, Default)]
pub struct PathRecorder {
    path: Path,
    done: bool,
}

impl PathRecorder {
    pub fn new(winding: WindingRule) -> Self {
        Self {
            path: Path::with_winding(winding),
            done: false,
        }
    }

    /// Whether `path_done` has been received.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> Path {
        self.path
    }
}

impl PathConsumer for PathRecorder {
    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
    }
    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.path.quad_to(cx, cy, x, y);
    }
    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.path.cubic_to(c1x, c1y, c2x, c2y, x, y);
    }
    fn close_path(&mut self) {
        self.path.close();
    }
    fn path_done(&mut self) {
        self.done = true;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_segments() {
        let p = Path::rect(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            p.segments(),
            &[
                Segment::MoveTo(1.0, 2.0),
                Segment::LineTo(4.0, 2.0),
                Segment::LineTo(4.0, 6.0),
                Segment::LineTo(1.0, 6.0),
                Segment::Close,
            ]
        );
    }

    #[test]
    fn test_missing_move_to_is_synthesized() {
        let mut p = Path::new();
        p.line_to(5.0, 5.0);
        p.line_to(10.0, 5.0);
        assert_eq!(
            p.segments(),
            &[Segment::MoveTo(5.0, 5.0), Segment::LineTo(10.0, 5.0)]
        );
    }

    #[test]
    fn test_drawing_after_close_restarts_at_subpath_start() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0);
        p.line_to(10.0, 10.0);
        p.close();
        p.line_to(-5.0, 0.0);
        assert_eq!(p.segments()[4], Segment::MoveTo(0.0, 0.0));
        assert_eq!(p.segments()[5], Segment::LineTo(-5.0, 0.0));
    }

    #[test]
    fn test_non_finite_segment_starts_fresh_subpath() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.line_to(10.0, 0.0);
        p.line_to(f64::NAN, 3.0);
        p.line_to(20.0, 20.0);
        p.line_to(30.0, 20.0);
        assert_eq!(
            p.segments(),
            &[
                Segment::MoveTo(0.0, 0.0),
                Segment::LineTo(10.0, 0.0),
                Segment::MoveTo(20.0, 20.0),
                Segment::LineTo(30.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_non_finite_curve_is_dropped() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.cubic_to(1.0, f64::INFINITY, 2.0, 2.0, 3.0, 3.0);
        p.quad_to(4.0, 4.0, 5.0, 5.0);
        assert_eq!(
            p.segments(),
            &[Segment::MoveTo(0.0, 0.0), Segment::MoveTo(5.0, 5.0)]
        );
    }

    #[test]
    fn test_close_requires_open_subpath() {
        let mut p = Path::new();
        p.close();
        assert!(p.is_empty());
        p.move_to(f64::NAN, 0.0);
        p.close();
        assert!(p.is_empty());
    }

    #[test]
    fn test_bounding_rect_uses_control_points() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0);
        p.quad_to(50.0, 100.0, 100.0, 0.0);
        let r = p.bounding_rect().unwrap();
        assert_eq!(r, RectD::new(0.0, 0.0, 100.0, 100.0));
        assert!(Path::new().bounding_rect().is_none());
    }

    #[test]
    fn test_area_of_rect_and_ellipse() {
        assert!((Path::rect(0.0, 0.0, 10.0, 20.0).area() - 200.0).abs() < 1e-9);
        // Flattened at the default half-unit tolerance, which cuts corners
        // off the true circle.
        let e = Path::ellipse(0.0, 0.0, 10.0, 10.0);
        let expected = std::f64::consts::PI * 100.0;
        let inscribed = std::f64::consts::PI * 9.5 * 9.5;
        assert!(e.area() <= expected && e.area() >= inscribed, "area {}", e.area());
    }

    #[test]
    fn test_recorder_roundtrips_through_feed() {
        let p = Path::rect(0.0, 0.0, 1.0, 1.0);
        let mut rec = PathRecorder::new(WindingRule::EvenOdd);
        p.feed(&mut rec);
        assert!(rec.is_done());
        assert_eq!(rec.path().segments(), p.segments());
        assert_eq!(rec.into_path().winding(), WindingRule::EvenOdd);
    }
}
