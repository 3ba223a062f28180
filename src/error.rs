//! Error types for rasterization calls.

use thiserror::Error;

/// Errors that fail a rasterization call.
///
/// Invalid geometry never surfaces here: non-finite segments are dropped
/// when the path is built and degenerate results produce the empty mask.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("invalid stroke parameter: {0}")]
    InvalidStrokeParameter(#[from] StrokeParamError),
}

/// The specific stroke parameter that was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrokeParamError {
    #[error("stroke width must be finite and non-negative, got {0}")]
    Width(f64),
    #[error("miter limit must be at least 1, got {0}")]
    MiterLimit(f64),
    #[error("dash element {index} must be finite and positive, got {value}")]
    DashElement { index: usize, value: f64 },
    #[error("dash lengths must have a positive sum, got {0}")]
    DashSum(f64),
    #[error("dash phase must be finite and non-negative, got {0}")]
    DashPhase(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e: RasterError = StrokeParamError::MiterLimit(0.5).into();
        assert_eq!(
            e.to_string(),
            "invalid stroke parameter: miter limit must be at least 1, got 0.5"
        );
        let e = StrokeParamError::DashElement {
            index: 2,
            value: -1.0,
        };
        assert_eq!(e.to_string(), "dash element 2 must be finite and positive, got -1");
    }
}
