//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, TIFF, JSON and array-shape errors, and provides semantic
//! variants for parameter validation, degenerate input and engine invariant failures.
use thiserror::Error;

use crate::core::params::ParamError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("This filter only works with stacks, got {frames} frame(s)")]
    NotAStack { frames: usize },

    #[error("Invalid parameters: {}", join_violations(.0))]
    InvalidParameters(Vec<ParamError>),

    #[error("Frame {frame} has a mean intensity of zero and cannot be normalized")]
    ZeroMeanFrame { frame: usize },

    #[error("Histograms need {bytes} bytes, over the {limit} byte limit; raise the compression")]
    HistogramTooLarge { bytes: u64, limit: u64 },

    #[error("Frame {index} is {actual} samples, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("Frame {index} is out of range 1..={count}")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("Histogram invariant violated at pixel {pixel}: {reason}")]
    InvariantViolation { pixel: usize, reason: &'static str },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

fn join_violations(violations: &[ParamError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
