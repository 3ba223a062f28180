//! Pooled scratch memory.
//!
//! A [`RasterContext`] owns every buffer one rasterization call needs.
//! [`ContextPool::checkout`] hands one out behind a [`PooledContext`] guard
//! which puts it back when dropped, whichever way the call exits.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock, PoisonError, TryLockError};

use log::trace;

use crate::conv_clip::ClosedPathDetector;
use crate::rasterizer_scanline_aa::RenderScratch;
use crate::vcgen_dash::DashScratch;
use crate::vcgen_stroke::StrokeScratch;

/// All scratch buffers for one in-flight call.
#[derive(Debug, Default)]
pub struct RasterContext {
    pub render: RenderScratch,
    pub stroke: StrokeScratch,
    pub dash: DashScratch,
    pub detector: ClosedPathDetector,
}

impl RasterContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Free list of contexts. Never shrinks.
#[derive(Debug, Default)]
pub struct ContextPool {
    free: Mutex<Vec<Box<RasterContext>>>,
}

impl ContextPool {
    pub const fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide pool used by [`crate::rasterize()`].
    pub fn global() -> &'static ContextPool {
        static GLOBAL: OnceLock<ContextPool> = OnceLock::new();
        GLOBAL.get_or_init(ContextPool::new)
    }

    /// Take a context without blocking. A fresh one is allocated when the
    /// free list is empty or another thread holds the lock.
    pub fn checkout(&self) -> PooledContext<'_> {
        let reused = match self.free.try_lock() {
            Ok(mut free) => free.pop(),
            Err(TryLockError::Poisoned(e)) => e.into_inner().pop(),
            Err(TryLockError::WouldBlock) => None,
        };
        let ctx = reused.unwrap_or_else(|| {
            trace!("allocating raster context");
            Box::default()
        });
        PooledContext {
            ctx: Some(ctx),
            pool: self,
        }
    }

    /// Contexts currently waiting in the free list.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, ctx: Box<RasterContext>) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ctx);
    }
}

/// A checked-out context; returns to its pool on drop.
pub struct PooledContext<'p> {
    ctx: Option<Box<RasterContext>>,
    pool: &'p ContextPool,
}

impl Deref for PooledContext<'_> {
    type Target = RasterContext;

    fn deref(&self) -> &RasterContext {
        // Only `drop` takes the context out.
        self.ctx.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut RasterContext {
        self.ctx.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_checkout_and_return() {
        let pool = ContextPool::new();
        assert_eq!(pool.idle(), 0);
        {
            let _a = pool.checkout();
            let _b = pool.checkout();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 2);
        let _c = pool.checkout();
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_context_reused() {
        let pool = ContextPool::new();
        let first = {
            let ctx = pool.checkout();
            &*ctx as *const RasterContext
        };
        let ctx = pool.checkout();
        assert_eq!(&*ctx as *const RasterContext, first);
    }

    #[test]
    fn test_returned_on_panic() {
        let pool = Arc::new(ContextPool::new());
        let p = Arc::clone(&pool);
        let result = std::thread::spawn(move || {
            let _ctx = p.checkout();
            panic!("boom");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_checkout_does_not_block_on_held_lock() {
        let pool = ContextPool::new();
        let guard = pool.free.lock().unwrap();
        let ctx = pool.checkout();
        drop(guard);
        drop(ctx);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(ContextPool::global(), ContextPool::global()));
    }
}
