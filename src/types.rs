//! Shared types and constants used across tmedian.
//! Includes `FrameDimensions`, the histogram counter width `CountWidth`, and the
//! sample range of the supported 16-bit frames.
use serde::{Deserialize, Serialize};

/// Number of distinct values a 16-bit sample can take.
pub const SAMPLE_LEVELS: u32 = 1 << 16;

/// Scale applied to intensity ratios in normalized mode.
pub const NORMALIZATION_SCALE: u64 = 1000;

/// Width and height of every frame in a stack.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: usize,
    pub height: usize,
}

impl FrameDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Samples per frame.
    pub fn dimension(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Unsigned integer width used for the per-pixel histogram counters.
///
/// A bin never holds more than `window_size` samples, so the narrowest type
/// that fits the window keeps memory at its minimum.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum CountWidth {
    U8,
    U16,
    U32,
}

impl CountWidth {
    pub fn for_window(window_size: usize) -> Self {
        if window_size <= u8::MAX as usize {
            CountWidth::U8
        } else if window_size <= u16::MAX as usize {
            CountWidth::U16
        } else {
            CountWidth::U32
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            CountWidth::U8 => 1,
            CountWidth::U16 => 2,
            CountWidth::U32 => 4,
        }
    }
}

impl std::fmt::Display for CountWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountWidth::U8 => write!(f, "u8"),
            CountWidth::U16 => write!(f, "u16"),
            CountWidth::U32 => write!(f, "u32"),
        }
    }
}
