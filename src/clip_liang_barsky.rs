//! Cohen-Sutherland outcodes against a rectangle.
//!
//! The fill clipper switches on these codes, the stroke clipper and the
//! dasher use them to find geometry lying wholly beyond one side of the
//! working rectangle.

use crate::basics::{PointD, Rect, RectD};

pub const CLIPPING_FLAGS_X1_CLIPPED: u32 = 4;
pub const CLIPPING_FLAGS_X2_CLIPPED: u32 = 1;
pub const CLIPPING_FLAGS_Y1_CLIPPED: u32 = 8;
pub const CLIPPING_FLAGS_Y2_CLIPPED: u32 = 2;
pub const CLIPPING_FLAGS_X_CLIPPED: u32 = CLIPPING_FLAGS_X1_CLIPPED | CLIPPING_FLAGS_X2_CLIPPED;
pub const CLIPPING_FLAGS_Y_CLIPPED: u32 = CLIPPING_FLAGS_Y1_CLIPPED | CLIPPING_FLAGS_Y2_CLIPPED;

/// Outcode for point (x, y) against `clip_box`.
///
/// ```text
///        |        |
///  0110  |  0010  | 0011
///        |        |
/// -------+--------+-------- clip_box.y2
///        |        |
///  0100  |  0000  | 0001
///        |        |
/// -------+--------+-------- clip_box.y1
///        |        |
///  1100  |  1000  | 1001
///        |        |
///  clip_box.x1  clip_box.x2
/// ```
#[inline]
pub fn clipping_flags<T: Copy + PartialOrd>(x: T, y: T, clip_box: &Rect<T>) -> u32 {
    (x > clip_box.x2) as u32
        | (((y > clip_box.y2) as u32) << 1)
        | (((x < clip_box.x1) as u32) << 2)
        | (((y < clip_box.y1) as u32) << 3)
}

/// Y bits of the outcode only.
#[inline]
pub fn clipping_flags_y<T: Copy + PartialOrd>(y: T, clip_box: &Rect<T>) -> u32 {
    (((y > clip_box.y2) as u32) << 1) | (((y < clip_box.y1) as u32) << 3)
}

/// AND and OR of the outcodes of `points`.
///
/// A nonzero AND means every point lies beyond the same side; a zero OR
/// means every point is inside. Both hold for the convex hull too.
pub fn hull_flags<'p, I>(points: I, clip_box: &RectD) -> (u32, u32)
where
    I: IntoIterator<Item = &'p PointD>,
{
    let mut and = !0u32;
    let mut or = 0u32;
    for p in points {
        let f = clipping_flags(p.x, p.y, clip_box);
        and &= f;
        or |= f;
    }
    (and, or)
}

/// Liang-Barsky: the parameter range `[t0, t1]` of the segment `a → b`
/// lying inside `clip_box`, or `None` when no part of it does.
pub fn clip_segment_range(a: &PointD, b: &PointD, clip_box: &RectD) -> Option<(f64, f64)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    let edges = [
        (-dx, a.x - clip_box.x1),
        (dx, clip_box.x2 - a.x),
        (-dy, a.y - clip_box.y1),
        (dy, clip_box.y2 - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > t1 {
                return None;
            }
            t0 = t0.max(t);
        } else {
            if t < t0 {
                return None;
            }
            t1 = t1.min(t);
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> RectD {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_flags_by_region() {
        let r = rect();
        assert_eq!(clipping_flags(5.0, 5.0, &r), 0);
        assert_eq!(clipping_flags(11.0, 5.0, &r), CLIPPING_FLAGS_X2_CLIPPED);
        assert_eq!(clipping_flags(-1.0, 5.0, &r), CLIPPING_FLAGS_X1_CLIPPED);
        assert_eq!(clipping_flags(5.0, 11.0, &r), CLIPPING_FLAGS_Y2_CLIPPED);
        assert_eq!(clipping_flags(5.0, -1.0, &r), CLIPPING_FLAGS_Y1_CLIPPED);
        assert_eq!(clipping_flags(-1.0, -1.0, &r), 12);
        assert_eq!(clipping_flags(11.0, 11.0, &r), 3);
    }

    #[test]
    fn test_boundary_is_inside() {
        let r = rect();
        assert_eq!(clipping_flags(0.0, 10.0, &r), 0);
        assert_eq!(clipping_flags_y(10.0, &r), 0);
        assert_eq!(clipping_flags(10, 0, &Rect::new(0, 0, 10, 10)), 0);
    }

    #[test]
    fn test_clip_segment_range() {
        let r = rect();
        let a = PointD::new(-10.0, 5.0);
        let b = PointD::new(30.0, 5.0);
        let (t0, t1) = clip_segment_range(&a, &b, &r).unwrap();
        assert!((t0 - 0.25).abs() < 1e-12 && (t1 - 0.5).abs() < 1e-12);

        let inside = clip_segment_range(&PointD::new(1.0, 1.0), &PointD::new(9.0, 2.0), &r);
        assert_eq!(inside, Some((0.0, 1.0)));

        let above = clip_segment_range(&PointD::new(-5.0, -1.0), &PointD::new(20.0, -1.0), &r);
        assert_eq!(above, None);

        // Diagonal passing outside the corner.
        let miss = clip_segment_range(&PointD::new(8.0, -5.0), &PointD::new(15.0, 2.0), &r);
        assert_eq!(miss, None);
    }

    #[test]
    fn test_hull_flags() {
        let r = rect();
        let above = [PointD::new(-5.0, -1.0), PointD::new(20.0, -3.0)];
        let (and, or) = hull_flags(&above, &r);
        assert_eq!(and, CLIPPING_FLAGS_Y1_CLIPPED);
        assert_ne!(or, 0);

        let inside = [PointD::new(1.0, 1.0), PointD::new(9.0, 9.0)];
        assert_eq!(hull_flags(&inside, &r), (0, 0));

        let straddle = [PointD::new(-1.0, 5.0), PointD::new(11.0, 5.0)];
        assert_eq!(hull_flags(&straddle, &r).0, 0);
    }
}
