//! Edge-to-cell accumulator.
//!
//! Edges arrive in 24.8 fixed point. Each one deposits, in every pixel cell
//! it crosses, its vertical extent (`cover`) and twice the signed area it
//! leaves to its right within the cell (`area`). Summing covers along a row
//! gives the winding number; the area terms give exact partial coverage at
//! the cells the edges pass through.

use crate::basics::{POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};

/// One pixel cell touched by at least one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
}

impl Cell {
    const EMPTY: Cell = Cell {
        x: i32::MAX,
        y: i32::MAX,
        cover: 0,
        area: 0,
    };

    #[inline]
    fn is_at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RowIndex {
    start: u32,
    num: u32,
}

/// Lines with a larger horizontal extent are halved first so the area
/// products stay within `i32`.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

/// Cell storage plus the per-row index built by [`sort_cells`].
///
/// All buffers keep their capacity across [`reset`], so a pooled instance
/// stops allocating once it has seen its largest shape.
///
/// [`sort_cells`]: CellRasterizer::sort_cells
/// [`reset`]: CellRasterizer::reset
#[derive(Debug)]
pub struct CellRasterizer {
    cells: Vec<Cell>,
    sorted_cells: Vec<u32>,
    rows: Vec<RowIndex>,
    curr: Cell,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
}

impl CellRasterizer {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            sorted_cells: Vec::new(),
            rows: Vec::new(),
            curr: Cell::EMPTY,
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
        }
    }

    /// Discard all cells, keeping the allocations.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.sorted_cells.clear();
        self.rows.clear();
        self.curr = Cell::EMPTY;
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
    }

    #[inline]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn sorted(&self) -> bool {
        self.sorted
    }

    /// Cells of row `y` in ascending X order. Empty outside the touched
    /// rows; only meaningful after [`sort_cells`](Self::sort_cells).
    pub fn row(&self, y: i32) -> impl Iterator<Item = &Cell> + '_ {
        let r = if self.sorted && y >= self.min_y {
            self.rows.get((y - self.min_y) as usize).copied()
        } else {
            None
        };
        let idx: &[u32] = match r {
            Some(r) => &self.sorted_cells[r.start as usize..(r.start + r.num) as usize],
            None => &[],
        };
        idx.iter().map(move |&i| &self.cells[i as usize])
    }

    #[inline]
    fn add_curr_cell(&mut self) {
        if self.curr.area | self.curr.cover != 0 {
            self.cells.push(self.curr);
        }
    }

    #[inline]
    fn set_curr_cell(&mut self, x: i32, y: i32) {
        if !self.curr.is_at(x, y) {
            self.add_curr_cell();
            self.curr = Cell {
                x,
                y,
                cover: 0,
                area: 0,
            };
        }
    }

    /// Part of an edge inside row `ey`. `x1`, `x2` are 24.8 coordinates;
    /// `y1`, `y2` are subpixel offsets within the row.
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let fx1 = x1 & POLY_SUBPIXEL_MASK as i32;
        let fx2 = x2 & POLY_SUBPIXEL_MASK as i32;
        let scale = POLY_SUBPIXEL_SCALE as i32;

        if y1 == y2 {
            self.set_curr_cell(ex2, ey);
            return;
        }

        if ex1 == ex2 {
            let delta = y2 - y1;
            self.curr.cover += delta;
            self.curr.area += (fx1 + fx2) * delta;
            return;
        }

        // The edge crosses several cells of this row.
        let (mut p, first, incr, dx) = if x2 < x1 {
            (fx1 as i64 * (y2 - y1) as i64, 0, -1, x1 as i64 - x2 as i64)
        } else {
            (
                (scale - fx1) as i64 * (y2 - y1) as i64,
                scale,
                1,
                x2 as i64 - x1 as i64,
            )
        };

        let mut delta = p.div_euclid(dx) as i32;
        let mut modulo = p.rem_euclid(dx);

        self.curr.cover += delta;
        self.curr.area += (fx1 + first) * delta;

        let mut ex = ex1 + incr;
        self.set_curr_cell(ex, ey);
        let mut y = y1 + delta;

        if ex != ex2 {
            p = scale as i64 * (y2 - y + delta) as i64;
            let lift = p.div_euclid(dx) as i32;
            let rem = p.rem_euclid(dx);
            modulo -= dx;

            while ex != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.curr.cover += delta;
                self.curr.area += scale * delta;
                y += delta;
                ex += incr;
                self.set_curr_cell(ex, ey);
            }
        }
        delta = y2 - y;
        self.curr.cover += delta;
        self.curr.area += (fx2 + scale - first) * delta;
    }

    /// Accumulate the edge from (x1, y1) to (x2, y2), in 24.8 fixed point.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;
        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 as i64 - y1 as i64;
        let scale = POLY_SUBPIXEL_SCALE as i32;
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let mut ey1 = y1 >> POLY_SUBPIXEL_SHIFT;
        let ey2 = y2 >> POLY_SUBPIXEL_SHIFT;
        let fy1 = y1 & POLY_SUBPIXEL_MASK as i32;
        let fy2 = y2 & POLY_SUBPIXEL_MASK as i32;

        self.min_x = self.min_x.min(ex1).min(ex2);
        self.max_x = self.max_x.max(ex1).max(ex2);
        self.min_y = self.min_y.min(ey1).min(ey2);
        self.max_y = self.max_y.max(ey1).max(ey2);

        self.set_curr_cell(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let (first, incr) = if dy < 0 { (0, -1) } else { (scale, 1) };

        if dx == 0 {
            // Vertical: one cell per row, no horizontal walk.
            let two_fx = (x1 - (ex1 << POLY_SUBPIXEL_SHIFT)) << 1;

            let mut delta = first - fy1;
            self.curr.cover += delta;
            self.curr.area += two_fx * delta;

            ey1 += incr;
            self.set_curr_cell(ex1, ey1);

            delta = first + first - scale;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.curr.cover = delta;
                self.curr.area = area;
                ey1 += incr;
                self.set_curr_cell(ex1, ey1);
            }
            delta = fy2 - scale + first;
            self.curr.cover += delta;
            self.curr.area += two_fx * delta;
            return;
        }

        // General case: walk row by row.
        let dy_abs = dy.abs();
        let p = if dy < 0 {
            fy1 as i64 * dx
        } else {
            (scale - fy1) as i64 * dx
        };
        let mut delta = p.div_euclid(dy_abs) as i32;
        let mut modulo = p.rem_euclid(dy_abs);

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);

        ey1 += incr;
        self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            let p = scale as i64 * dx;
            let lift = p.div_euclid(dy_abs) as i32;
            let rem = p.rem_euclid(dy_abs);
            modulo -= dy_abs;

            while ey1 != ey2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, scale - first, x_to, first);
                x_from = x_to;

                ey1 += incr;
                self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, scale - first, x2, fy2);
    }

    /// Flush the current cell and build the per-row index, each row sorted
    /// by X. Idempotent until the next [`reset`](Self::reset).
    pub fn sort_cells(&mut self) {
        if self.sorted {
            return;
        }
        self.add_curr_cell();
        self.curr = Cell::EMPTY;
        self.sorted = true;

        if self.cells.is_empty() {
            return;
        }

        let num_rows = (self.max_y - self.min_y + 1) as usize;
        self.rows.clear();
        self.rows.resize(num_rows, RowIndex::default());
        self.sorted_cells.clear();
        self.sorted_cells.resize(self.cells.len(), 0);

        // Counting sort by row: histogram, prefix sums, scatter.
        for cell in &self.cells {
            self.rows[(cell.y - self.min_y) as usize].start += 1;
        }
        let mut start = 0u32;
        for row in &mut self.rows {
            let count = row.start;
            row.start = start;
            start += count;
        }
        for (i, cell) in self.cells.iter().enumerate() {
            let row = &mut self.rows[(cell.y - self.min_y) as usize];
            self.sorted_cells[(row.start + row.num) as usize] = i as u32;
            row.num += 1;
        }

        let cells = &self.cells;
        for row in &self.rows {
            if row.num > 1 {
                let slice =
                    &mut self.sorted_cells[row.start as usize..(row.start + row.num) as usize];
                slice.sort_unstable_by_key(|&i| cells[i as usize].x);
            }
        }
    }
}

impl Default for CellRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
