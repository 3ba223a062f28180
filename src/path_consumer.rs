//! The push-style interface every pipeline stage implements.
//!
//! A stage receives geometry through these calls and forwards its own
//! output to the next stage it owns or borrows. Nothing flows backwards.

/// Sink for path geometry.
///
/// Calls arrive in path order: a `move_to` starts each subpath, drawing
/// calls extend it, `close_path` closes it, and `path_done` ends the whole
/// path. Stages that must look ahead (dashing, stroking, closed-path
/// detection) buffer one subpath at a time and flush it on the next
/// `move_to`, on `close_path`, or on `path_done`.
pub trait PathConsumer {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    #[allow(clippy::too_many_arguments)]
    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64);
    fn close_path(&mut self);
    fn path_done(&mut self);
}

/// Lets a stage borrow its downstream instead of owning it.
impl<T: PathConsumer + ?Sized> PathConsumer for &mut T {
    #[inline]
    fn move_to(&mut self, x: f64, y: f64) {
        (**self).move_to(x, y);
    }
    #[inline]
    fn line_to(&mut self, x: f64, y: f64) {
        (**self).line_to(x, y);
    }
    #[inline]
    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        (**self).quad_to(cx, cy, x, y);
    }
    #[inline]
    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        (**self).cubic_to(c1x, c1y, c2x, c2y, x, y);
    }
    #[inline]
    fn close_path(&mut self) {
        (**self).close_path();
    }
    #[inline]
    fn path_done(&mut self) {
        (**self).path_done();
    }
}
