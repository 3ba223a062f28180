//! Bounded LRU cache of device-space outlines.
//!
//! Dashing, stroking and curve simplification dominate the cost of a
//! stroked call. The outline they produce for a given path, style,
//! transform and clip is a plain fill path, so it is recorded once and
//! replayed into the renderer on later hits.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use rustc_hash::FxHasher;

use crate::basics::ClipRect;
use crate::path_storage::{Path, Segment};
use crate::trans_affine::TransAffine;
use crate::vcgen_stroke::StrokeStyle;

/// A recorded device-space fill outline, already clipped.
pub type Outline = Path;

/// Identity of an outline: a hash of everything that shapes the geometry,
/// plus the device rectangle it was clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineKey {
    pub geometry: u64,
    pub bounds: [i32; 4],
}

impl OutlineKey {
    pub fn new(
        path: &Path,
        stroke: Option<&StrokeStyle>,
        transform: &TransAffine,
        clip: ClipRect,
    ) -> Self {
        let mut h = FxHasher::default();
        path.winding().hash(&mut h);
        hash_segments(path.segments(), &mut h);
        transform.to_bits().hash(&mut h);
        match stroke {
            None => 0u8.hash(&mut h),
            Some(s) => {
                1u8.hash(&mut h);
                s.width.to_bits().hash(&mut h);
                s.cap.hash(&mut h);
                s.join.hash(&mut h);
                s.miter_limit.to_bits().hash(&mut h);
                s.dash_phase.to_bits().hash(&mut h);
                s.placement.hash(&mut h);
                s.dashes.len().hash(&mut h);
                for d in &s.dashes {
                    d.to_bits().hash(&mut h);
                }
            }
        }
        Self {
            geometry: h.finish(),
            bounds: [clip.x, clip.y, clip.right(), clip.bottom()],
        }
    }
}

fn hash_segments<H: Hasher>(segments: &[Segment], h: &mut H) {
    segments.len().hash(h);
    for seg in segments {
        match *seg {
            Segment::MoveTo(x, y) => (0u8, x.to_bits(), y.to_bits()).hash(h),
            Segment::LineTo(x, y) => (1u8, x.to_bits(), y.to_bits()).hash(h),
            Segment::QuadTo(cx, cy, x, y) => {
                (2u8, cx.to_bits(), cy.to_bits(), x.to_bits(), y.to_bits()).hash(h)
            }
            Segment::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                3u8.hash(h);
                [c1x, c1y, c2x, c2y, x, y].map(f64::to_bits).hash(h);
            }
            Segment::Close => 4u8.hash(h),
        }
    }
}

/// Thread-safe LRU map from [`OutlineKey`] to shared outlines.
///
/// A capacity of zero disables the cache: lookups miss and inserts are
/// dropped.
#[derive(Debug)]
pub struct OutlineCache {
    entries: Option<Mutex<LruCache<OutlineKey, Arc<Outline>>>>,
}

impl OutlineCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |m| m.lock().unwrap_or_else(PoisonError::into_inner).cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |m| m.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &OutlineKey) -> Option<Arc<Outline>> {
        let entries = self.entries.as_ref()?;
        let mut lru = entries.lock().unwrap_or_else(PoisonError::into_inner);
        lru.get(key).cloned()
    }

    /// Insert, evicting the least recently used entry when full.
    pub fn insert(&self, key: OutlineKey, outline: Arc<Outline>) {
        if let Some(entries) = &self.entries {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key, outline);
        }
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}
