//! Bounding rectangle calculation over path segments.
//!
//! Curves contribute their control points, which gives a conservative
//! bound (the convex hull contains the curve).

use crate::basics::RectD;
use crate::path_storage::Segment;
use crate::trans_affine::TransAffine;

fn accumulate<F>(segments: &[Segment], mut map: F) -> Option<RectD>
where
    F: FnMut(f64, f64) -> (f64, f64),
{
    let mut bounds: Option<RectD> = None;
    let mut add = |x: f64, y: f64| {
        let (x, y) = map(x, y);
        match bounds.as_mut() {
            None => bounds = Some(RectD::new(x, y, x, y)),
            Some(r) => {
                r.x1 = r.x1.min(x);
                r.y1 = r.y1.min(y);
                r.x2 = r.x2.max(x);
                r.y2 = r.y2.max(y);
            }
        }
    };
    for seg in segments {
        match *seg {
            Segment::MoveTo(x, y) | Segment::LineTo(x, y) => add(x, y),
            Segment::QuadTo(cx, cy, x, y) => {
                add(cx, cy);
                add(x, y);
            }
            Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                add(c1x, c1y);
                add(c2x, c2y);
                add(x, y);
            }
            Segment::Close => {}
        }
    }
    bounds
}

/// Bounding box of all control points. `None` for an empty segment list.
pub fn bounding_rect(segments: &[Segment]) -> Option<RectD> {
    accumulate(segments, |x, y| (x, y))
}

/// Bounding box of all control points after applying `mtx`.
pub fn bounding_rect_transformed(segments: &[Segment], mtx: &TransAffine) -> Option<RectD> {
    accumulate(segments, |mut x, mut y| {
        mtx.transform(&mut x, &mut y);
        (x, y)
    })
}
