//! Span rows collected during the sweep.
//!
//! Each swept row contributes a run of packed spans: a positive `len` means
//! `len` per-pixel covers starting at `cover_offset`, a negative `len` means
//! `-len` pixels sharing the single cover at `cover_offset`. Spans are clipped
//! to the horizontal clip bounds on entry and the tight box of the stored
//! coverage is tracked as rows are finalized.

use crate::basics::RectI;
use crate::rasterizer_scanline_aa::Scanline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedSpan {
    pub x: i32,
    pub len: i32,
    pub cover_offset: usize,
}

impl PackedSpan {
    #[inline]
    pub fn width(&self) -> i32 {
        self.len.abs()
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.len < 0
    }
}

/// One finalized row: `count` spans starting at `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRow {
    pub y: i32,
    first: usize,
    count: usize,
}

/// Span storage for a whole mask, rows in ascending Y.
///
/// Implements [`Scanline`] so the sweep feeds it directly. Buffers keep their
/// capacity across [`reset`](ScanlineStore::reset).
#[derive(Debug)]
pub struct ScanlineStore {
    spans: Vec<PackedSpan>,
    covers: Vec<u8>,
    rows: Vec<SpanRow>,
    row_first: usize,
    covers_first: usize,
    last_x: i32,
    clip_x1: i32,
    clip_x2: i32,
    min_x: i32,
    max_x: i32,
    last_y: i32,
}

impl ScanlineStore {
    pub fn new() -> Self {
        Self {
            spans: Vec::new(),
            covers: Vec::new(),
            rows: Vec::new(),
            row_first: 0,
            covers_first: 0,
            last_x: i32::MIN,
            clip_x1: i32::MIN,
            clip_x2: i32::MAX,
            min_x: i32::MAX,
            max_x: i32::MIN,
            last_y: 0,
        }
    }

    /// Clear all rows and restrict future spans to `x1..x2` (end exclusive).
    pub fn reset(&mut self, x1: i32, x2: i32) {
        self.spans.clear();
        self.covers.clear();
        self.rows.clear();
        self.row_first = 0;
        self.covers_first = 0;
        self.last_x = i32::MIN;
        self.clip_x1 = x1;
        self.clip_x2 = x2;
        self.min_x = i32::MAX;
        self.max_x = i32::MIN;
        self.last_y = 0;
    }

    pub fn rows(&self) -> &[SpanRow] {
        &self.rows
    }

    pub fn spans(&self, row: &SpanRow) -> &[PackedSpan] {
        &self.spans[row.first..row.first + row.count]
    }

    pub fn covers(&self) -> &[u8] {
        &self.covers
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tight box of all stored spans, end inclusive. `None` when empty.
    pub fn bounding_box(&self) -> Option<RectI> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some(RectI::new(self.min_x, first.y, self.max_x, last.y))
    }

    /// Clip `[x, x+len)` to the horizontal bounds.
    #[inline]
    fn clip(&self, x: i32, len: i32) -> Option<(i32, i32)> {
        let x1 = x.max(self.clip_x1);
        let x2 = (x as i64 + len as i64).min(self.clip_x2 as i64) as i32;
        (x2 > x1).then_some((x1, x2 - x1))
    }

    fn current_span(&mut self) -> Option<&mut PackedSpan> {
        if self.spans.len() > self.row_first {
            self.spans.last_mut()
        } else {
            None
        }
    }
}

impl Default for ScanlineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanline for ScanlineStore {
    fn reset_spans(&mut self) {
        self.spans.truncate(self.row_first);
        self.covers.truncate(self.covers_first);
        self.last_x = i32::MIN;
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        if cover == 0 || self.clip(x, 1).is_none() {
            return;
        }
        let adjacent = x == self.last_x.wrapping_add(1);
        self.covers.push(cover as u8);
        match self.current_span() {
            Some(span) if adjacent && span.len > 0 => span.len += 1,
            _ => {
                let cover_offset = self.covers.len() - 1;
                self.spans.push(PackedSpan {
                    x,
                    len: 1,
                    cover_offset,
                });
            }
        }
        self.last_x = x;
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        if cover == 0 {
            return;
        }
        let Some((x, len)) = self.clip(x, len.min(i32::MAX as u32) as i32) else {
            return;
        };
        let adjacent = x == self.last_x.wrapping_add(1);
        let covers_last = self.covers.last().copied();
        match self.current_span() {
            Some(span) if adjacent && span.len < 0 && covers_last == Some(cover as u8) => {
                span.len -= len;
            }
            _ => {
                self.covers.push(cover as u8);
                let cover_offset = self.covers.len() - 1;
                self.spans.push(PackedSpan {
                    x,
                    len: -len,
                    cover_offset,
                });
            }
        }
        self.last_x = x + len - 1;
    }

    fn finalize(&mut self, y: i32) {
        let count = self.spans.len() - self.row_first;
        if count == 0 {
            return;
        }
        let row = &self.spans[self.row_first..];
        if let (Some(first), Some(last)) = (row.first(), row.last()) {
            self.min_x = self.min_x.min(first.x);
            self.max_x = self.max_x.max(last.x + last.width() - 1);
        }
        self.rows.push(SpanRow {
            y,
            first: self.row_first,
            count,
        });
        self.row_first = self.spans.len();
        self.covers_first = self.covers.len();
        self.last_y = y;
    }

    fn num_spans(&self) -> u32 {
        (self.spans.len() - self.row_first) as u32
    }

    fn y(&self) -> i32 {
        self.last_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ScanlineStore {
        let mut s = ScanlineStore::new();
        s.reset(0, 100);
        s
    }

    #[test]
    fn test_new_store_is_empty() {
        let s = store();
        assert!(s.is_empty());
        assert_eq!(s.bounding_box(), None);
        assert_eq!(s.num_spans(), 0);
    }

    #[test]
    fn test_adjacent_cells_merge() {
        let mut s = store();
        s.reset_spans();
        s.add_cell(10, 50);
        s.add_cell(11, 60);
        s.add_cell(12, 70);
        s.finalize(5);
        let row = s.rows()[0];
        let spans = s.spans(&row);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len, 3);
        let off = spans[0].cover_offset;
        assert_eq!(&s.covers()[off..off + 3], &[50, 60, 70]);
    }

    #[test]
    fn test_gap_starts_new_span() {
        let mut s = store();
        s.reset_spans();
        s.add_cell(10, 50);
        s.add_cell(20, 60);
        s.finalize(0);
        assert_eq!(s.spans(&s.rows()[0]).len(), 2);
    }

    #[test]
    fn test_solid_span_is_packed() {
        let mut s = store();
        s.reset_spans();
        s.add_span(10, 10, 255);
        s.add_span(20, 5, 255);
        s.finalize(3);
        let spans = s.spans(&s.rows()[0]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len, -15);
        assert!(spans[0].is_solid());
        assert_eq!(s.covers()[spans[0].cover_offset], 255);
    }

    #[test]
    fn test_solid_spans_with_different_cover_stay_apart() {
        let mut s = store();
        s.reset_spans();
        s.add_span(0, 4, 128);
        s.add_span(4, 4, 255);
        s.finalize(0);
        assert_eq!(s.spans(&s.rows()[0]).len(), 2);
    }

    #[test]
    fn test_clips_to_x_bounds() {
        let mut s = ScanlineStore::new();
        s.reset(10, 20);
        s.reset_spans();
        s.add_cell(5, 100);
        s.add_span(6, 10, 255);
        s.add_cell(25, 100);
        s.finalize(0);
        let spans = s.spans(&s.rows()[0]);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].x, spans[0].len), (10, -6));
        assert_eq!(s.bounding_box(), Some(RectI::new(10, 0, 15, 0)));
    }

    #[test]
    fn test_zero_cover_is_skipped() {
        let mut s = store();
        s.reset_spans();
        s.add_cell(1, 0);
        s.add_span(2, 5, 0);
        assert_eq!(s.num_spans(), 0);
        s.finalize(0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_rows_and_bounding_box() {
        let mut s = store();
        s.reset_spans();
        s.add_cell(30, 10);
        s.finalize(4);
        s.reset_spans();
        s.add_span(12, 3, 200);
        s.add_cell(40, 10);
        s.finalize(7);
        assert_eq!(s.rows().len(), 2);
        assert_eq!(s.rows()[1].y, 7);
        assert_eq!(s.y(), 7);
        assert_eq!(s.bounding_box(), Some(RectI::new(12, 4, 40, 7)));
    }

    #[test]
    fn test_reset_spans_discards_unfinalized_row() {
        let mut s = store();
        s.reset_spans();
        s.add_cell(3, 9);
        s.reset_spans();
        assert_eq!(s.num_spans(), 0);
        s.add_cell(4, 9);
        s.finalize(1);
        assert_eq!(s.spans(&s.rows()[0])[0].x, 4);
    }
}
