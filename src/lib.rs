//! # pathmask
//!
//! Vector path to 8-bit alpha mask rasterization, built on the
//! Anti-Grain Geometry cell rasterizer.
//!
//! A call takes a [`Path`] (lines, quadratic and cubic curves), an optional
//! [`StrokeStyle`] with dashing, an affine [`TransAffine`] and an integer
//! [`ClipRect`], and returns an [`AlphaMask`] cropped to the covered pixels.
//!
//! ## Pipeline
//!
//! Every stage implements [`PathConsumer`] and owns (or borrows) the next:
//!
//! 1. **Transform** maps path space to device space
//! 2. **Dasher** or **stroke clipper** cut the centerline
//! 3. **Stroker** turns the centerline into a fill outline
//! 4. **Monotonizer** splits curves into monotone pieces and drops
//!    degenerate segments
//! 5. **Fill clipper** limits geometry to the clip rectangle plus a margin
//! 6. **Renderer** accumulates exact area coverage and sweeps it into spans
//!
//! Fills skip steps 2 and 3. For transforms that are not a similarity,
//! steps 2 and 3 run before the transform.
//!
//! Scratch memory lives in pooled [`RasterContext`]s, so steady-state calls
//! do not allocate outside the returned mask.
//!
//! ```
//! use pathmask::{rasterize, ClipRect, Path, StrokeStyle, TransAffine};
//!
//! let mut path = Path::new();
//! path.move_to(10.0, 10.0);
//! path.line_to(90.0, 10.0);
//! let style = StrokeStyle::new(4.0);
//! let mask = rasterize(&path, Some(&style), &TransAffine::new(), ClipRect::new(0, 0, 100, 100), true)
//!     .unwrap();
//! assert_eq!((mask.x(), mask.y(), mask.width(), mask.height()), (10, 8, 80, 4));
//! ```

// Geometry and path model
pub mod array;
pub mod basics;
pub mod bounding_rect;
pub mod curves;
pub mod math;
pub mod path_consumer;
pub mod path_storage;
pub mod trans_affine;

// Path stages
pub mod clip_liang_barsky;
pub mod conv_clip;
pub mod conv_monotone;
pub mod conv_transform;
pub mod math_stroke;
pub mod vcgen_dash;
pub mod vcgen_stroke;

// Scan conversion
pub mod alpha_mask;
pub mod rasterizer_cells_aa;
pub mod rasterizer_scanline_aa;
pub mod scanline_u;

// Calls
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod rasterize;

pub use alpha_mask::AlphaMask;
pub use basics::{ClipRect, WindingRule};
pub use cache::{Outline, OutlineCache, OutlineKey};
pub use config::RasterConfig;
pub use context::{ContextPool, PooledContext, RasterContext};
pub use error::{RasterError, StrokeParamError};
pub use math_stroke::{LineCap, LineJoin};
pub use path_consumer::PathConsumer;
pub use path_storage::{Path, Segment};
pub use rasterize::{rasterize, Rasterizer};
pub use rasterizer_scanline_aa::RenderMode;
pub use trans_affine::TransAffine;
pub use vcgen_stroke::{StrokePlacement, StrokeStyle};
