//! The 8-bit coverage mask produced by a rasterization call.

use std::sync::{Arc, OnceLock};

use crate::basics::RectI;
use crate::scanline_u::ScanlineStore;

/// Row-major coverage bytes positioned in device pixel space.
///
/// `pixel(x, y)` takes absolute device coordinates; anything outside the
/// mask reads as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlphaMask {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

static EMPTY_MASK: OnceLock<Arc<AlphaMask>> = OnceLock::new();

impl AlphaMask {
    /// The shared zero-sized mask every empty result returns.
    pub fn empty() -> Arc<AlphaMask> {
        EMPTY_MASK.get_or_init(|| Arc::new(AlphaMask::default())).clone()
    }

    /// Whether `mask` is the shared empty mask itself, not just a mask
    /// without pixels.
    pub fn is_shared_empty(mask: &Arc<AlphaMask>) -> bool {
        EMPTY_MASK.get().is_some_and(|e| Arc::ptr_eq(e, mask))
    }

    /// Build a mask cropped to the stored spans. `None` when nothing was
    /// stored.
    pub fn from_store(store: &ScanlineStore) -> Option<AlphaMask> {
        let RectI { x1, y1, x2, y2 } = store.bounding_box()?;
        let width = (x2 - x1 + 1) as usize;
        let height = (y2 - y1 + 1) as usize;
        let mut data = vec![0u8; width * height];
        let covers = store.covers();

        for row in store.rows() {
            let line = &mut data[(row.y - y1) as usize * width..][..width];
            for span in store.spans(row) {
                let start = (span.x - x1) as usize;
                let len = span.width() as usize;
                let dst = &mut line[start..start + len];
                if span.is_solid() {
                    dst.fill(covers[span.cover_offset]);
                } else {
                    dst.copy_from_slice(&covers[span.cover_offset..span.cover_offset + len]);
                }
            }
        }

        Some(AlphaMask {
            x: x1,
            y: y1,
            width: width as u32,
            height: height as u32,
            data,
        })
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }
    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row at absolute device `y`, if inside the mask.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        let r = y.checked_sub(self.y)?;
        if r < 0 || r as u32 >= self.height {
            return None;
        }
        let w = self.width as usize;
        Some(&self.data[r as usize * w..][..w])
    }

    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        let Some(row) = self.row(y) else {
            return 0;
        };
        match x.checked_sub(self.x) {
            Some(c) if c >= 0 && (c as u32) < self.width => row[c as usize],
            _ => 0,
        }
    }

    /// Sum of all coverage bytes.
    pub fn sum(&self) -> u64 {
        self.data.iter().map(|&a| a as u64).sum()
    }

    /// Covered area in pixels, `sum / 255`.
    pub fn coverage(&self) -> f64 {
        self.sum() as f64 / 255.0
    }
}
