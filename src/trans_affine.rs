//! Affine transformation matrix.
//!
//! 2D affine transformations plus the classification the pipeline needs:
//! whether a matrix is invertible, and whether it is a similarity (uniform
//! scale, rotation, reflection and translation only) so that strokes can be
//! widened after transforming instead of before.

/// Epsilon for affine matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Stores six components: `[sx, shy, shx, sy, tx, ty]` representing the
/// matrix:
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
#[derive(Debug, Clone, Copy)]
pub struct TransAffine {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl TransAffine {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Identity matrix.
    pub fn new() -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Custom matrix from six components.
    pub fn new_custom(sx: f64, shy: f64, shx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
        }
    }

    pub fn new_rotation(a: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        Self::new_custom(ca, sa, -sa, ca, 0.0, 0.0)
    }

    pub fn new_scaling(x: f64, y: f64) -> Self {
        Self::new_custom(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    pub fn new_scaling_uniform(s: f64) -> Self {
        Self::new_custom(s, 0.0, 0.0, s, 0.0, 0.0)
    }

    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn new_skewing(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, y.tan(), x.tan(), 1.0, 0.0, 0.0)
    }

    // ====================================================================
    // Operations (mutate self)
    // ====================================================================

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    pub fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.sx *= x;
        self.shx *= x;
        self.tx *= x;
        self.shy *= y;
        self.sy *= y;
        self.ty *= y;
        self
    }

    /// Post-multiply: `self = self * m` (apply `self` first, then `m`).
    pub fn multiply(&mut self, m: &TransAffine) -> &mut Self {
        let t0 = self.sx * m.sx + self.shy * m.shx;
        let t2 = self.shx * m.sx + self.sy * m.shx;
        let t4 = self.tx * m.sx + self.ty * m.shx + m.tx;
        self.shy = self.sx * m.shy + self.shy * m.sy;
        self.sy = self.shx * m.shy + self.sy * m.sy;
        self.ty = self.tx * m.shy + self.ty * m.sy + m.ty;
        self.sx = t0;
        self.shx = t2;
        self.tx = t4;
        self
    }

    /// Invert the matrix in place. The matrix must not be singular.
    pub fn invert(&mut self) -> &mut Self {
        let d = self.determinant_reciprocal();
        let t0 = self.sy * d;
        self.sy = self.sx * d;
        self.shy = -self.shy * d;
        self.shx = -self.shx * d;
        let t4 = -self.tx * t0 - self.ty * self.shx;
        self.ty = -self.tx * self.shy - self.ty * self.sy;
        self.sx = t0;
        self.tx = t4;
        self
    }

    /// The inverse matrix, or `None` when the matrix is singular.
    pub fn inverted(&self, epsilon: f64) -> Option<TransAffine> {
        if self.is_singular(epsilon) {
            return None;
        }
        let mut m = *self;
        m.invert();
        Some(m)
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    /// Forward transform: `(x, y) -> (x', y')`.
    #[inline]
    pub fn transform(&self, x: &mut f64, y: &mut f64) {
        let tmp = *x;
        *x = tmp * self.sx + *y * self.shx + self.tx;
        *y = tmp * self.shy + *y * self.sy + self.ty;
    }

    /// Forward transform returning the new point.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.sx + y * self.shx + self.tx,
            x * self.shy + y * self.sy + self.ty,
        )
    }

    // ====================================================================
    // Classification
    // ====================================================================

    /// Determinant of the 2x2 portion.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    #[inline]
    pub fn determinant_reciprocal(&self) -> f64 {
        1.0 / self.determinant()
    }

    /// Average scale factor, used as the curve approximation scale.
    pub fn get_scale(&self) -> f64 {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let x = s * self.sx + s * self.shx;
        let y = s * self.shy + s * self.sy;
        (x * x + y * y).sqrt()
    }

    /// `true` when every component is finite.
    pub fn is_finite(&self) -> bool {
        [self.sx, self.shy, self.shx, self.sy, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }

    /// `true` when the 2x2 part collapses the plane (or is not finite).
    pub fn is_singular(&self, epsilon: f64) -> bool {
        let d = self.determinant();
        !d.is_finite() || d.abs() <= epsilon
    }

    /// `true` when the 2x2 part is a uniform scale combined with rotation
    /// and/or reflection: its columns are orthogonal and of equal length.
    ///
    /// `epsilon` is relative to the squared magnitude of the matrix.
    pub fn is_similarity(&self, epsilon: f64) -> bool {
        let c1 = self.sx * self.sx + self.shy * self.shy;
        let c2 = self.shx * self.shx + self.sy * self.sy;
        let norm = c1 + c2;
        if norm == 0.0 || !norm.is_finite() {
            return false;
        }
        let dot = self.sx * self.shx + self.shy * self.sy;
        dot.abs() <= epsilon * norm && (c1 - c2).abs() <= epsilon * norm
    }

    /// Uniform scale factor of a similarity: `sqrt(|det|)`.
    pub fn similarity_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Component bit patterns, for hashing.
    pub fn to_bits(&self) -> [u64; 6] {
        [
            self.sx.to_bits(),
            self.shy.to_bits(),
            self.shx.to_bits(),
            self.sy.to_bits(),
            self.tx.to_bits(),
            self.ty.to_bits(),
        ]
    }

    /// Check if two matrices are equal within an absolute epsilon.
    pub fn is_equal(&self, m: &TransAffine, epsilon: f64) -> bool {
        (self.sx - m.sx).abs() <= epsilon
            && (self.shy - m.shy).abs() <= epsilon
            && (self.shx - m.shx).abs() <= epsilon
            && (self.sy - m.sy).abs() <= epsilon
            && (self.tx - m.tx).abs() <= epsilon
            && (self.ty - m.ty).abs() <= epsilon
    }
}

impl Default for TransAffine {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TransAffine {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other, AFFINE_EPSILON)
    }
}

impl std::ops::Mul for TransAffine {
    type Output = TransAffine;
    fn mul(self, rhs: TransAffine) -> TransAffine {
        let mut result = self;
        result.multiply(&rhs);
        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let m = TransAffine::new();
        assert_eq!(m.apply(3.0, -4.0), (3.0, -4.0));
    }

    #[test]
    fn test_multiply_applies_left_first() {
        let mut m = TransAffine::new_scaling(2.0, 2.0);
        m.multiply(&TransAffine::new_translation(10.0, 0.0));
        assert_eq!(m.apply(1.0, 1.0), (12.0, 2.0));
        let n = TransAffine::new_translation(10.0, 0.0) * TransAffine::new_scaling(2.0, 2.0);
        assert_eq!(n.apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_invert_roundtrip() {
        let mut m = TransAffine::new_rotation(0.3);
        m.scale(2.0, 3.0).translate(5.0, -7.0);
        let inv = m.inverted(1e-12).unwrap();
        let (x, y) = m.apply(1.5, 2.5);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 1.5).abs() < 1e-12 && (by - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_singular() {
        assert!(TransAffine::new_scaling(1.0, 0.0).is_singular(1e-12));
        assert!(TransAffine::new_custom(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).is_singular(1e-12));
        assert!(TransAffine::new_scaling(1.0, 0.0).inverted(1e-12).is_none());
        assert!(!TransAffine::new().is_singular(1e-12));
    }

    #[test]
    fn test_similarity_classification() {
        let mut rot = TransAffine::new_rotation(PI / 5.0);
        rot.scale(3.0, 3.0);
        assert!(rot.is_similarity(1e-9));
        assert!((rot.similarity_scale() - 3.0).abs() < 1e-12);

        let flip = TransAffine::new_scaling(-2.0, 2.0);
        assert!(flip.is_similarity(1e-9));

        assert!(!TransAffine::new_scaling(1.0, 2.0).is_similarity(1e-9));
        assert!(!TransAffine::new_skewing(0.3, 0.0).is_similarity(1e-9));
        assert!(!TransAffine::new_scaling(0.0, 0.0).is_similarity(1e-9));
    }

    #[test]
    fn test_get_scale() {
        assert!((TransAffine::new_scaling_uniform(4.0).get_scale() - 4.0).abs() < 1e-12);
    }
}


