//! Entry points: pipeline assembly for one call.
//!
//! A fill runs `TransformStage → Monotonizer → FillClipper → MaskRenderer`.
//! A stroke puts the dasher (or the stroke clipper) and the stroker in
//! front, either after the transform when it is a similarity, or before it
//! otherwise so that non-uniform scaling distorts the outline and not the
//! pen.

use std::sync::{Arc, OnceLock};

use log::{debug, trace, warn};

use crate::alpha_mask::AlphaMask;
use crate::basics::{ClipRect, RectD, WindingRule, POLY_MAX_COORD};
use crate::bounding_rect::bounding_rect_transformed;
use crate::cache::{Outline, OutlineCache, OutlineKey};
use crate::config::RasterConfig;
use crate::context::{ContextPool, RasterContext};
use crate::conv_clip::{ClosedPathDetector, FillClipper, StrokeClipper};
use crate::conv_monotone::Monotonizer;
use crate::conv_transform::{inverse_bounds, Strategy, TransformStage};
use crate::error::RasterError;
use crate::path_consumer::PathConsumer;
use crate::path_storage::{Path, PathRecorder};
use crate::rasterizer_scanline_aa::{MaskRenderer, RenderMode};
use crate::trans_affine::{TransAffine, AFFINE_EPSILON};
use crate::vcgen_dash::{DashScratch, Dasher};
use crate::vcgen_stroke::{StrokeScratch, StrokeStyle, Stroker};

/// Extra distance added to the stroke reach when culling stroke input.
const STROKE_MARGIN_EPSILON: f64 = 1e-3;

/// Rasterize `path` into a coverage mask positioned in `clip` space.
///
/// Uses the process-wide context pool and default configuration.
pub fn rasterize(
    path: &Path,
    stroke: Option<&StrokeStyle>,
    transform: &TransAffine,
    clip: ClipRect,
    antialiased: bool,
) -> Result<Arc<AlphaMask>, RasterError> {
    static DEFAULT: OnceLock<Rasterizer<'static>> = OnceLock::new();
    DEFAULT
        .get_or_init(Rasterizer::new)
        .rasterize(path, stroke, transform, clip, antialiased)
}

/// Everything decided about a call before any geometry moves.
struct Plan<'a> {
    path: &'a Path,
    stroke: Option<&'a StrokeStyle>,
    transform: TransAffine,
    /// Clip rectangle plus margin, in device space.
    work: RectD,
    winding: WindingRule,
}

/// The stroke-side scratch of a context.
struct StageScratch<'c> {
    stroke: &'c mut StrokeScratch,
    dash: &'c mut DashScratch,
    detector: &'c mut ClosedPathDetector,
}

/// Holds the configuration, the context pool and the outline cache shared
/// by a family of calls.
pub struct Rasterizer<'p> {
    config: RasterConfig,
    pool: &'p ContextPool,
    cache: OutlineCache,
}

impl Rasterizer<'static> {
    pub fn new() -> Self {
        Self::with_config(RasterConfig::default())
    }

    pub fn with_config(config: RasterConfig) -> Self {
        Self::with_pool(config, ContextPool::global())
    }
}

impl Default for Rasterizer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Rasterizer<'p> {
    pub fn with_pool(config: RasterConfig, pool: &'p ContextPool) -> Self {
        Self {
            cache: OutlineCache::new(config.cache_capacity()),
            config,
            pool,
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn pool(&self) -> &ContextPool {
        self.pool
    }

    pub fn cache(&self) -> &OutlineCache {
        &self.cache
    }

    /// Rasterize one path. See [`rasterize()`].
    pub fn rasterize(
        &self,
        path: &Path,
        stroke: Option<&StrokeStyle>,
        transform: &TransAffine,
        clip: ClipRect,
        antialiased: bool,
    ) -> Result<Arc<AlphaMask>, RasterError> {
        let Some(plan) = self.plan(path, stroke, transform, clip)? else {
            return Ok(AlphaMask::empty());
        };
        let mut ctx = self.pool.checkout();
        let RasterContext {
            render,
            stroke: stroke_scratch,
            dash,
            detector,
        } = &mut *ctx;

        let mode = RenderMode::from_antialiased(antialiased);
        let mut renderer = MaskRenderer::new(render, clip, plan.winding, mode)
            .with_approximation_scale(self.config.approximation_scale());
        self.feed_outline(
            &plan,
            StageScratch {
                stroke: stroke_scratch,
                dash,
                detector,
            },
            &mut renderer,
        );
        trace!("rendered {} cells", renderer.cell_count());
        Ok(renderer.into_mask())
    }

    /// Like [`rasterize`](Self::rasterize) but reuses the clipped
    /// device-space outline of an identical earlier call.
    pub fn rasterize_cached(
        &self,
        path: &Path,
        stroke: Option<&StrokeStyle>,
        transform: &TransAffine,
        clip: ClipRect,
        antialiased: bool,
    ) -> Result<Arc<AlphaMask>, RasterError> {
        let Some(plan) = self.plan(path, stroke, transform, clip)? else {
            return Ok(AlphaMask::empty());
        };
        let key = OutlineKey::new(path, stroke, transform, clip);
        let mut ctx = self.pool.checkout();
        let RasterContext {
            render,
            stroke: stroke_scratch,
            dash,
            detector,
        } = &mut *ctx;

        let outline = match self.cache.get(&key) {
            Some(outline) => {
                trace!("outline cache hit {:016x}", key.geometry);
                outline
            }
            None => {
                let mut recorder = PathRecorder::new(plan.winding);
                self.feed_outline(
                    &plan,
                    StageScratch {
                        stroke: stroke_scratch,
                        dash,
                        detector,
                    },
                    &mut recorder,
                );
                let outline: Arc<Outline> = Arc::new(recorder.into_path());
                self.cache.insert(key, Arc::clone(&outline));
                outline
            }
        };

        let mode = RenderMode::from_antialiased(antialiased);
        let mut renderer = MaskRenderer::new(render, clip, plan.winding, mode)
            .with_approximation_scale(self.config.approximation_scale());
        outline.feed(&mut renderer);
        Ok(renderer.into_mask())
    }

    /// Validate the inputs and decide whether there is anything to draw.
    fn plan<'a>(
        &self,
        path: &'a Path,
        stroke: Option<&'a StrokeStyle>,
        transform: &TransAffine,
        clip: ClipRect,
    ) -> Result<Option<Plan<'a>>, RasterError> {
        if let Some(style) = stroke {
            style.validate()?;
            if style.width == 0.0 {
                debug!("zero stroke width, nothing to draw");
                return Ok(None);
            }
        }
        if clip.is_empty() || path.is_empty() {
            debug!("empty clip or path, nothing to draw");
            return Ok(None);
        }
        if !transform.is_finite() || transform.is_singular(AFFINE_EPSILON) {
            warn!("singular transform {:?}, nothing to draw", transform);
            return Ok(None);
        }

        let margin = self.config.clip_margin();
        let mut work = clip.to_rect_d().expand(margin);
        work.x1 = work.x1.max(-POLY_MAX_COORD);
        work.y1 = work.y1.max(-POLY_MAX_COORD);
        work.x2 = work.x2.min(POLY_MAX_COORD);
        work.y2 = work.y2.min(POLY_MAX_COORD);

        // Conservative device bounds: control points plus the stroke reach
        // scaled by the largest stretch of the transform.
        let reach = stroke.map_or(0.0, |s| {
            s.width * s.reach() * max_stretch(transform) + STROKE_MARGIN_EPSILON
        });
        match bounding_rect_transformed(path.segments(), transform) {
            Some(bounds) if bounds.expand(reach).overlaps(&work) => {}
            _ => {
                debug!("path outside clip, nothing to draw");
                return Ok(None);
            }
        }

        Ok(Some(Plan {
            path,
            stroke,
            transform: *transform,
            work,
            winding: match stroke {
                Some(_) => WindingRule::NonZero,
                None => path.winding(),
            },
        }))
    }

    /// Run every stage before the renderer, delivering the clipped
    /// device-space outline to `sink`.
    fn feed_outline<S: PathConsumer>(
        &self,
        plan: &Plan<'_>,
        scratch: StageScratch<'_>,
        sink: &mut S,
    ) {
        let fill = Monotonizer::with_epsilon(
            FillClipper::new(sink, plan.work),
            self.config.collinearity_epsilon(),
        );
        let approx = self.config.approximation_scale();

        let Some(style) = plan.stroke else {
            let mut stage = TransformStage::new(fill, plan.transform);
            plan.path.feed(&mut stage);
            let unclassified = stage.into_inner().unclassified();
            if unclassified > 0 {
                debug!("{unclassified} curves flattened by the monotonizer");
            }
            return;
        };

        let strategy = Strategy::select(&plan.transform, self.config.similarity_epsilon());
        debug!("stroke strategy {strategy:?}");
        match strategy {
            Strategy::DeviceSpace { scale } => {
                let width = style.width * scale;
                let rect = plan.work.expand(width * style.reach() + STROKE_MARGIN_EPSILON);
                let stroker = Stroker::new(fill, style, width, approx, scratch.stroke);
                run_stroke(
                    plan,
                    style,
                    Some(&plan.transform),
                    scale,
                    approx,
                    rect,
                    stroker,
                    scratch.dash,
                    scratch.detector,
                );
            }
            Strategy::LocalSpace => {
                let Some(local) = inverse_bounds(&plan.transform, &plan.work, AFFINE_EPSILON)
                else {
                    warn!("transform not invertible, nothing to draw");
                    return;
                };
                let rect = local.expand(style.width * style.reach() + STROKE_MARGIN_EPSILON);
                let approx = approx * plan.transform.get_scale();
                let stroker = Stroker::new(
                    TransformStage::new(fill, plan.transform),
                    style,
                    style.width,
                    approx,
                    scratch.stroke,
                );
                run_stroke(
                    plan,
                    style,
                    None,
                    1.0,
                    approx,
                    rect,
                    stroker,
                    scratch.dash,
                    scratch.detector,
                );
            }
        }
    }
}

/// Feed the path through the dasher or the stroke clipper into `stroker`,
/// transforming it first when `pre` is given.
#[allow(clippy::too_many_arguments)]
fn run_stroke<D: PathConsumer>(
    plan: &Plan<'_>,
    style: &StrokeStyle,
    pre: Option<&TransAffine>,
    dash_scale: f64,
    approx: f64,
    rect: RectD,
    mut stroker: Stroker<'_, D>,
    dash: &mut DashScratch,
    detector: &mut ClosedPathDetector,
) {
    if style.is_dashed() {
        let mut dasher = Dasher::new(
            &mut stroker,
            &style.dashes,
            style.dash_phase,
            dash_scale,
            approx,
            Some(rect),
            dash,
        );
        feed_through(plan.path, pre, &mut dasher);
        let (emitted, culled) = dasher.span_counts();
        trace!("dasher emitted {emitted} spans, culled {culled}");
    } else {
        let mut clipper = StrokeClipper::new(&mut stroker, rect, detector);
        feed_through(plan.path, pre, &mut clipper);
        trace!("stroke clipper culled {} segments", clipper.culled());
    }
    trace!("stroker emitted {} polygons", stroker.polygons());
}

fn feed_through<C: PathConsumer>(path: &Path, pre: Option<&TransAffine>, head: &mut C) {
    match pre {
        Some(m) => path.feed(&mut TransformStage::new(head, *m)),
        None => path.feed(head),
    }
}

/// Largest factor by which `m` can lengthen a vector.
fn max_stretch(m: &TransAffine) -> f64 {
    let c1 = (m.sx * m.sx + m.shy * m.shy).sqrt();
    let c2 = (m.shx * m.shx + m.sy * m.sy).sqrt();
    c1 + c2
}
