//! Tunable tolerances for a [`Rasterizer`](crate::rasterize::Rasterizer).

use crate::conv_monotone::COLLINEARITY_EPSILON;

pub const SIMILARITY_EPSILON: f64 = 1e-9;
pub const CLIP_MARGIN: f64 = 1.0;
pub const CACHE_CAPACITY: usize = 256;

/// Tolerances and sizes used by every call made through one rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    similarity_epsilon: f64,
    collinearity_epsilon: f64,
    approximation_scale: f64,
    clip_margin: f64,
    cache_capacity: usize,
}

impl RasterConfig {
    pub fn new() -> Self {
        Self {
            similarity_epsilon: SIMILARITY_EPSILON,
            collinearity_epsilon: COLLINEARITY_EPSILON,
            approximation_scale: 1.0,
            clip_margin: CLIP_MARGIN,
            cache_capacity: CACHE_CAPACITY,
        }
    }

    /// Relative tolerance for treating a transform as rotation plus
    /// uniform scale.
    pub fn set_similarity_epsilon(&mut self, eps: f64) {
        self.similarity_epsilon = eps.abs();
    }
    pub fn similarity_epsilon(&self) -> f64 {
        self.similarity_epsilon
    }

    /// Cross-product tolerance below which the monotonizer treats curve
    /// control points as collinear.
    pub fn set_collinearity_epsilon(&mut self, eps: f64) {
        self.collinearity_epsilon = eps.abs();
    }
    pub fn collinearity_epsilon(&self) -> f64 {
        self.collinearity_epsilon
    }

    /// Curve flattening accuracy multiplier. Values above 1 produce more
    /// segments.
    pub fn set_approximation_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.approximation_scale = scale;
        }
    }
    pub fn approximation_scale(&self) -> f64 {
        self.approximation_scale
    }

    /// Pixels added around the clip rectangle before clipping geometry.
    pub fn set_clip_margin(&mut self, margin: f64) {
        if margin.is_finite() {
            self.clip_margin = margin.max(0.0);
        }
    }
    pub fn clip_margin(&self) -> f64 {
        self.clip_margin
    }

    /// Outline cache entries kept; zero disables caching.
    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.cache_capacity = capacity;
    }
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self::new()
    }
}
