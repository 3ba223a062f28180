//! Affine transform stage and transform strategy selection.
//!
//! [`TransformStage`] maps every incoming coordinate through a
//! [`TransAffine`] before forwarding it. [`Strategy`] decides where in the
//! pipeline that stage sits for a stroked path.

use crate::basics::{PointD, RectD};
use crate::path_consumer::PathConsumer;
use crate::trans_affine::TransAffine;

// ============================================================================
// Strategy
// ============================================================================

/// Where stroking happens relative to the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Transform first, then stroke in device space with width and dash
    /// lengths multiplied by `scale`.
    DeviceSpace { scale: f64 },
    /// Stroke in path space and transform the finished outline.
    LocalSpace,
}

impl Strategy {
    /// `DeviceSpace` for similarity transforms, `LocalSpace` otherwise.
    pub fn select(mtx: &TransAffine, similarity_epsilon: f64) -> Self {
        if mtx.is_similarity(similarity_epsilon) {
            Strategy::DeviceSpace {
                scale: mtx.similarity_scale(),
            }
        } else {
            Strategy::LocalSpace
        }
    }
}

/// Bounding box of `rect` mapped through the inverse of `mtx`.
pub fn inverse_bounds(mtx: &TransAffine, rect: &RectD, epsilon: f64) -> Option<RectD> {
    let inv = mtx.inverted(epsilon)?;
    let corners = [
        (rect.x1, rect.y1),
        (rect.x2, rect.y1),
        (rect.x2, rect.y2),
        (rect.x1, rect.y2),
    ];
    let mut out = RectD::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for (x, y) in corners {
        let (x, y) = inv.apply(x, y);
        out.x1 = out.x1.min(x);
        out.y1 = out.y1.min(y);
        out.x2 = out.x2.max(x);
        out.y2 = out.y2.max(y);
    }
    out.is_valid().then_some(out)
}

// ============================================================================
// TransformStage
// ============================================================================

/// Applies an affine transform to each coordinate, control points
/// included, and forwards to the next stage.
///
/// Owns the downstream; use `TransformStage<&mut D>` to borrow.
pub struct TransformStage<D: PathConsumer> {
    out: D,
    trans: TransAffine,
}

impl<D: PathConsumer> TransformStage<D> {
    pub fn new(out: D, trans: TransAffine) -> Self {
        Self { out, trans }
    }

    pub fn transform(&self) -> &TransAffine {
        &self.trans
    }

    pub fn into_inner(self) -> D {
        self.out
    }

    #[inline]
    fn map(&self, x: f64, y: f64) -> PointD {
        let (x, y) = self.trans.apply(x, y);
        PointD::new(x, y)
    }
}

impl<D: PathConsumer> PathConsumer for TransformStage<D> {
    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.map(x, y);
        self.out.move_to(p.x, p.y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.map(x, y);
        self.out.line_to(p.x, p.y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let c = self.map(cx, cy);
        let p = self.map(x, y);
        self.out.quad_to(c.x, c.y, p.x, p.y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let c1 = self.map(c1x, c1y);
        let c2 = self.map(c2x, c2y);
        let p = self.map(x, y);
        self.out.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
    }

    fn close_path(&mut self) {
        self.out.close_path();
    }

    fn path_done(&mut self) {
        self.out.path_done();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_consumer::tests::CallLog;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_transform() {
        let mut stage = TransformStage::new(CallLog::default(), TransAffine::new());
        stage.move_to(10.0, 20.0);
        stage.line_to(30.0, 40.0);
        stage.close_path();
        stage.path_done();
        assert_eq!(stage.into_inner().calls, ["M10,20", "L30,40", "Z", "done"]);
    }

    #[test]
    fn test_maps_control_points() {
        let mut m = TransAffine::new_scaling(2.0, 3.0);
        m.translate(1.0, 1.0);
        let mut stage = TransformStage::new(CallLog::default(), m);
        stage.move_to(0.0, 0.0);
        stage.quad_to(1.0, 1.0, 2.0, 0.0);
        stage.cubic_to(1.0, 0.0, 1.0, 1.0, 0.0, 1.0);
        assert_eq!(
            stage.into_inner().calls,
            ["M1,1", "Q3,4,5,1", "C3,1,3,4,1,4"]
        );
    }

    #[test]
    fn test_strategy_selection() {
        let mut rot = TransAffine::new_rotation(FRAC_PI_2 / 3.0);
        rot.scale(2.0, 2.0);
        rot.translate(100.0, -5.0);
        match Strategy::select(&rot, 1e-9) {
            Strategy::DeviceSpace { scale } => assert!((scale - 2.0).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            Strategy::select(&TransAffine::new_scaling(3.0, 1.0), 1e-9),
            Strategy::LocalSpace
        );
        assert_eq!(
            Strategy::select(&TransAffine::new_skewing(0.2, 0.0), 1e-9),
            Strategy::LocalSpace
        );
    }

    #[test]
    fn test_inverse_bounds() {
        let m = TransAffine::new_scaling(3.0, 1.0);
        let r = inverse_bounds(&m, &RectD::new(0.0, 0.0, 30.0, 10.0), 1e-12).unwrap();
        assert!((r.x2 - 10.0).abs() < 1e-12 && (r.y2 - 10.0).abs() < 1e-12);
        assert!(r.x1.abs() < 1e-12 && r.y1.abs() < 1e-12);

        let rot = TransAffine::new_rotation(FRAC_PI_2);
        let r = inverse_bounds(&rot, &RectD::new(0.0, 0.0, 10.0, 20.0), 1e-12).unwrap();
        assert!((r.x2 - 20.0).abs() < 1e-9 && (r.y1 + 10.0).abs() < 1e-9);

        assert!(inverse_bounds(&TransAffine::new_scaling(0.0, 1.0), &r, 1e-12).is_none());
    }
}
