//! Scan-conversion renderer: the last pipeline stage.
//!
//! [`MaskRenderer`] takes device-space outlines through [`PathConsumer`],
//! accumulates them as cells, and on `path_done` sweeps the rows inside the
//! clip rectangle into span rows from which the [`AlphaMask`] is cut.
//! Subpaths are closed implicitly; curves are flattened on arrival.

use std::sync::Arc;

use log::trace;

use crate::alpha_mask::AlphaMask;
use crate::basics::{iround, ClipRect, PointD, WindingRule, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};
use crate::curves::{Curve3Div, Curve4Div};
use crate::path_consumer::PathConsumer;
use crate::rasterizer_cells_aa::CellRasterizer;
use crate::scanline_u::ScanlineStore;

const AA_SHIFT: u32 = 8;
const AA_SCALE: u32 = 1 << AA_SHIFT;
const AA_MASK: u32 = AA_SCALE - 1;
const AA_SCALE2: u32 = AA_SCALE * 2;
const AA_MASK2: u32 = AA_SCALE2 - 1;

// ============================================================================
// Scanline
// ============================================================================

/// Receiver of swept coverage, one row at a time.
///
/// Within a row `add_cell` and `add_span` arrive with strictly increasing X.
pub trait Scanline {
    /// Start a new row, discarding anything not yet finalized.
    fn reset_spans(&mut self);
    fn add_cell(&mut self, x: i32, cover: u32);
    fn add_span(&mut self, x: i32, len: u32, cover: u32);
    /// Commit the current row at `y`.
    fn finalize(&mut self, y: i32);
    fn num_spans(&self) -> u32;
    fn y(&self) -> i32;
}

/// Convert an accumulated area into coverage in `0..=255`.
///
/// `area` is in units of 2 * 256 * 256 per fully covered pixel.
#[inline]
pub fn calculate_alpha(area: i32, rule: WindingRule) -> u32 {
    let mut cover = (area >> (POLY_SUBPIXEL_SHIFT * 2 + 1 - AA_SHIFT)).unsigned_abs();
    if rule == WindingRule::EvenOdd {
        cover &= AA_MASK2;
        if cover > AA_SCALE {
            cover = AA_SCALE2 - cover;
        }
    }
    cover.min(AA_MASK)
}

// ============================================================================
// RenderMode
// ============================================================================

/// How coverage is quantized. Chosen once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Exact area coverage.
    #[default]
    AntiAliased,
    /// Binary coverage: on at 50% or more.
    Aliased,
}

impl RenderMode {
    pub fn from_antialiased(antialiased: bool) -> Self {
        if antialiased {
            RenderMode::AntiAliased
        } else {
            RenderMode::Aliased
        }
    }

    #[inline]
    pub fn apply(self, alpha: u32) -> u32 {
        match self {
            RenderMode::AntiAliased => alpha,
            RenderMode::Aliased if alpha >= AA_SCALE / 2 => AA_MASK,
            RenderMode::Aliased => 0,
        }
    }
}

// ============================================================================
// RenderScratch
// ============================================================================

/// Reusable buffers for one renderer at a time.
#[derive(Debug)]
pub struct RenderScratch {
    cells: CellRasterizer,
    store: ScanlineStore,
    curve3: Curve3Div,
    curve4: Curve4Div,
}

impl RenderScratch {
    pub fn new() -> Self {
        Self {
            cells: CellRasterizer::new(),
            store: ScanlineStore::new(),
            curve3: Curve3Div::new(),
            curve4: Curve4Div::new(),
        }
    }
}

impl Default for RenderScratch {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MaskRenderer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
    Sweeping,
    Done,
}

/// Accumulates device-space geometry and produces the coverage mask.
///
/// Goes `Idle → Collecting` on the first geometry call and
/// `Collecting → Sweeping → Done` inside `path_done`. Feeding geometry after
/// `path_done`, or taking the mask before it, is a programming error.
pub struct MaskRenderer<'a> {
    scratch: &'a mut RenderScratch,
    clip: ClipRect,
    winding: WindingRule,
    mode: RenderMode,
    state: State,
    start: (i32, i32),
    cur: (i32, i32),
    cur_f: PointD,
    start_f: PointD,
    open: bool,
}

impl<'a> MaskRenderer<'a> {
    pub fn new(
        scratch: &'a mut RenderScratch,
        clip: ClipRect,
        winding: WindingRule,
        mode: RenderMode,
    ) -> Self {
        scratch.cells.reset();
        scratch.store.reset(clip.x, clip.right());
        scratch.curve3.set_approximation_scale(1.0);
        scratch.curve4.set_approximation_scale(1.0);
        Self {
            scratch,
            clip,
            winding,
            mode,
            state: State::Idle,
            start: (0, 0),
            cur: (0, 0),
            cur_f: PointD::default(),
            start_f: PointD::default(),
            open: false,
        }
    }

    /// Flattening accuracy for curves that reach the renderer.
    pub fn with_approximation_scale(self, scale: f64) -> Self {
        self.scratch.curve3.set_approximation_scale(scale);
        self.scratch.curve4.set_approximation_scale(scale);
        self
    }

    pub fn winding(&self) -> WindingRule {
        self.winding
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Cells accumulated so far.
    pub fn cell_count(&self) -> usize {
        self.scratch.cells.total_cells()
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The finished mask, or the shared empty mask when nothing is covered.
    pub fn into_mask(self) -> Arc<AlphaMask> {
        debug_assert_eq!(self.state, State::Done, "mask taken before path_done");
        match AlphaMask::from_store(&self.scratch.store) {
            Some(mask) => Arc::new(mask),
            None => AlphaMask::empty(),
        }
    }

    #[inline]
    fn upscale(v: f64) -> i32 {
        iround(v * POLY_SUBPIXEL_SCALE as f64)
    }

    fn begin_geometry(&mut self) {
        debug_assert!(
            matches!(self.state, State::Idle | State::Collecting),
            "geometry after path_done"
        );
        self.state = State::Collecting;
    }

    fn edge_to(&mut self, x: f64, y: f64) {
        let p = (Self::upscale(x), Self::upscale(y));
        self.scratch.cells.line(self.cur.0, self.cur.1, p.0, p.1);
        self.cur = p;
        self.cur_f = PointD::new(x, y);
    }

    fn close_subpath(&mut self) {
        if self.open && self.cur != self.start {
            self.scratch
                .cells
                .line(self.cur.0, self.cur.1, self.start.0, self.start.1);
        }
        self.open = false;
    }

    /// Make sure a subpath is open before a drawing call.
    fn ensure_open(&mut self) {
        if !self.open {
            self.open = true;
            self.start = self.cur;
            self.start_f = self.cur_f;
        }
    }

    fn sweep(&mut self) {
        self.state = State::Sweeping;
        let RenderScratch { cells, store, .. } = &mut *self.scratch;
        cells.sort_cells();
        if cells.total_cells() == 0 || self.clip.is_empty() {
            return;
        }

        let y1 = cells.min_y().max(self.clip.y);
        let y2 = cells.max_y().min(self.clip.bottom() - 1);
        for y in y1..=y2 {
            sweep_row(cells, store, y, self.winding, self.mode);
        }
        trace!(
            "swept {} cells into {} rows",
            cells.total_cells(),
            store.rows().len()
        );
    }
}

/// Turn the sorted cells of row `y` into spans.
fn sweep_row<S: Scanline>(
    cells: &CellRasterizer,
    sl: &mut S,
    y: i32,
    rule: WindingRule,
    mode: RenderMode,
) {
    sl.reset_spans();
    let alpha = |area: i32| mode.apply(calculate_alpha(area, rule));

    let mut row = cells.row(y).peekable();
    let mut cover = 0i32;
    while let Some(cell) = row.next() {
        let x = cell.x;
        let mut area = cell.area;
        cover += cell.cover;
        while let Some(next) = row.peek() {
            if next.x != x {
                break;
            }
            area += next.area;
            cover += next.cover;
            row.next();
        }

        // Coverage from the partial cell at x, then the run up to the next
        // cell, which only the accumulated cover contributes to.
        let run_start = if area != 0 {
            let a = alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - area);
            if a != 0 {
                sl.add_cell(x, a);
            }
            x + 1
        } else {
            x
        };
        if let Some(next) = row.peek() {
            if next.x > run_start {
                let a = alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                if a != 0 {
                    sl.add_span(run_start, (next.x - run_start) as u32, a);
                }
            }
        }
    }
    sl.finalize(y);
}

impl PathConsumer for MaskRenderer<'_> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.begin_geometry();
        self.close_subpath();
        self.cur = (Self::upscale(x), Self::upscale(y));
        self.cur_f = PointD::new(x, y);
        self.start = self.cur;
        self.start_f = self.cur_f;
        self.open = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.begin_geometry();
        self.ensure_open();
        self.edge_to(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.begin_geometry();
        self.ensure_open();
        let p0 = self.cur_f;
        self.scratch.curve3.init(p0.x, p0.y, cx, cy, x, y);
        let n = self.scratch.curve3.points().len();
        for i in 1..n {
            let p = self.scratch.curve3.points()[i];
            self.edge_to(p.x, p.y);
        }
        self.cur_f = PointD::new(x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.begin_geometry();
        self.ensure_open();
        let p0 = self.cur_f;
        self.scratch
            .curve4
            .init(p0.x, p0.y, c1x, c1y, c2x, c2y, x, y);
        let n = self.scratch.curve4.points().len();
        for i in 1..n {
            let p = self.scratch.curve4.points()[i];
            self.edge_to(p.x, p.y);
        }
        self.cur_f = PointD::new(x, y);
    }

    fn close_path(&mut self) {
        self.begin_geometry();
        self.close_subpath();
        self.cur = self.start;
        self.cur_f = self.start_f;
    }

    fn path_done(&mut self) {
        debug_assert!(self.state != State::Done, "path_done called twice");
        self.close_subpath();
        self.sweep();
        self.state = State::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_storage::Path;

    fn render(path: &Path, clip: ClipRect, mode: RenderMode) -> Arc<AlphaMask> {
        let mut scratch = RenderScratch::new();
        let mut r = MaskRenderer::new(&mut scratch, clip, path.winding(), mode);
        path.feed(&mut r);
        assert!(r.is_done());
        r.into_mask()
    }

    fn big_clip() -> ClipRect {
        ClipRect::new(-50, -50, 200, 200)
    }

    #[test]
    fn test_calculate_alpha() {
        let full = 256 << 9;
        assert_eq!(calculate_alpha(0, WindingRule::NonZero), 0);
        assert_eq!(calculate_alpha(full, WindingRule::NonZero), 255);
        assert_eq!(calculate_alpha(-full, WindingRule::NonZero), 255);
        assert_eq!(calculate_alpha(full / 2, WindingRule::NonZero), 128);
        assert_eq!(calculate_alpha(2 * full, WindingRule::NonZero), 255);
        assert_eq!(calculate_alpha(2 * full, WindingRule::EvenOdd), 0);
        assert_eq!(calculate_alpha(3 * full, WindingRule::EvenOdd), 255);
    }

    #[test]
    fn test_render_mode() {
        assert_eq!(RenderMode::from_antialiased(true), RenderMode::AntiAliased);
        assert_eq!(RenderMode::Aliased.apply(128), 255);
        assert_eq!(RenderMode::Aliased.apply(127), 0);
        assert_eq!(RenderMode::AntiAliased.apply(77), 77);
    }

    #[test]
    fn test_pixel_aligned_rect_is_binary() {
        let mask = render(&Path::rect(2.0, 2.0, 4.0, 3.0), big_clip(), RenderMode::AntiAliased);
        assert_eq!((mask.x(), mask.y(), mask.width(), mask.height()), (2, 2, 4, 3));
        assert!(mask.data().iter().all(|&a| a == 255));
    }

    #[test]
    fn test_half_pixel_edges() {
        let path = Path::rect(0.5, 0.0, 2.0, 1.0);
        let mask = render(&path, big_clip(), RenderMode::AntiAliased);
        assert_eq!(mask.row(0).unwrap(), &[128, 255, 128]);

        let mask = render(&path, big_clip(), RenderMode::Aliased);
        assert_eq!(mask.row(0).unwrap(), &[255, 255, 255]);
    }

    #[test]
    fn test_reversed_rect_same_coverage() {
        let mut path = Path::new();
        path.move_to(2.0, 2.0);
        path.line_to(2.0, 5.0);
        path.line_to(6.0, 5.0);
        path.line_to(6.0, 2.0);
        let mask = render(&path, big_clip(), RenderMode::AntiAliased);
        assert_eq!(mask.sum(), 12 * 255);
    }

    #[test]
    fn test_triangle_area() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(20.0, 0.0);
        path.line_to(0.0, 20.0);
        let mask = render(&path, big_clip(), RenderMode::AntiAliased);
        assert!((mask.coverage() - 200.0).abs() < 1.0, "{}", mask.coverage());
    }

    #[test]
    fn test_circle_area() {
        let mask = render(
            &Path::ellipse(50.0, 50.0, 30.0, 30.0),
            big_clip(),
            RenderMode::AntiAliased,
        );
        let expected = std::f64::consts::PI * 900.0;
        assert!((mask.coverage() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_winding_rules() {
        let mut path = Path::rect(0.0, 0.0, 10.0, 10.0);
        path.move_to(3.0, 3.0);
        path.line_to(7.0, 3.0);
        path.line_to(7.0, 7.0);
        path.line_to(3.0, 7.0);
        path.close();
        assert_eq!(render(&path, big_clip(), RenderMode::AntiAliased).sum(), 100 * 255);

        path.set_winding(WindingRule::EvenOdd);
        let mask = render(&path, big_clip(), RenderMode::AntiAliased);
        assert_eq!(mask.sum(), 84 * 255);
        assert_eq!(mask.pixel(5, 5), 0);
    }

    #[test]
    fn test_clip_crops_mask() {
        let path = Path::rect(0.0, 0.0, 10.0, 10.0);
        let mask = render(&path, ClipRect::new(2, 3, 4, 5), RenderMode::AntiAliased);
        assert_eq!((mask.x(), mask.y(), mask.width(), mask.height()), (2, 3, 4, 5));
        assert_eq!(mask.sum(), 20 * 255);
    }

    #[test]
    fn test_outside_clip_is_shared_empty() {
        let path = Path::rect(0.0, 0.0, 10.0, 10.0);
        let mask = render(&path, ClipRect::new(20, 20, 5, 5), RenderMode::AntiAliased);
        assert!(AlphaMask::is_shared_empty(&mask));

        let mask = render(&Path::new(), big_clip(), RenderMode::AntiAliased);
        assert!(AlphaMask::is_shared_empty(&mask));
    }

    #[test]
    fn test_auto_close_on_move() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(4.0, 0.0);
        path.line_to(4.0, 4.0);
        path.line_to(0.0, 4.0);
        path.move_to(10.0, 0.0);
        path.line_to(12.0, 0.0);
        path.line_to(12.0, 2.0);
        path.line_to(10.0, 2.0);
        let mask = render(&path, big_clip(), RenderMode::AntiAliased);
        assert_eq!(mask.sum(), 20 * 255);
    }

    #[test]
    fn test_scratch_reuse() {
        let mut scratch = RenderScratch::new();
        for size in [8.0, 3.0] {
            let mut r = MaskRenderer::new(
                &mut scratch,
                big_clip(),
                WindingRule::NonZero,
                RenderMode::AntiAliased,
            );
            Path::rect(0.0, 0.0, size, size).feed(&mut r);
            assert_eq!(r.into_mask().sum(), (size * size) as u64 * 255);
        }
    }
}
