//! Intensity normalization pre-pass.
//!
//! Each sample is ranked relative to its own frame's mean brightness, which
//! removes global drift (photobleaching, lamp flicker) from the median. The
//! ratio is scaled by [`NORMALIZATION_SCALE`] into an integer histogram space.
use std::ops::Range;

use tracing::{debug, info};

use crate::core::processing::rebin::Rebinning;
use crate::error::{Error, Result};
use crate::io::FrameSource;
use crate::types::NORMALIZATION_SCALE;

/// Truncating integer mean of a frame.
pub fn frame_mean(samples: &[u16]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u64 = samples.iter().map(|&s| s as u64).sum();
    (sum / samples.len() as u64) as u32
}

/// `floor(rebinned / mean * 1000)`, computed exactly in integers.
#[inline]
pub fn normalized_bin(rebinned: u32, mean: u32) -> u32 {
    debug_assert!(mean > 0);
    (rebinned as u64 * NORMALIZATION_SCALE / mean as u64) as u32
}

/// Per-frame means for a contiguous range of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMeans {
    first: usize,
    means: Vec<u32>,
    peak_bin: u32,
}

impl FrameMeans {
    /// Scan `frames` of `source` once, recording each frame's mean and the
    /// largest normalized bin any of its samples can reach.
    pub fn compute<S: FrameSource + ?Sized>(
        source: &mut S,
        frames: Range<usize>,
        rebin: &Rebinning,
    ) -> Result<Self> {
        let dimension = source.dimensions().dimension();
        let mut buf = vec![0u16; dimension];
        let mut means = Vec::with_capacity(frames.len());
        let mut peak_bin = 0u32;

        info!(
            "Computing mean intensity of frames {}..{}",
            frames.start, frames.end
        );

        for frame in frames.clone() {
            source.read_frame(frame, &mut buf)?;
            let mean = frame_mean(&buf);
            if mean == 0 {
                return Err(Error::ZeroMeanFrame { frame });
            }
            let max = buf.iter().copied().max().unwrap_or(0);
            peak_bin = peak_bin.max(normalized_bin(rebin.bin(max), mean));
            debug!("frame {}: mean={} max={}", frame, mean, max);
            means.push(mean);
        }

        Ok(Self {
            first: frames.start,
            means,
            peak_bin,
        })
    }

    /// Mean of frame `index` (1-based), if it was part of the pre-pass.
    pub fn mean(&self, index: usize) -> Option<u32> {
        index
            .checked_sub(self.first)
            .and_then(|i| self.means.get(i))
            .copied()
    }

    /// Histogram width that holds every normalized bin of the scanned frames.
    pub fn colors(&self) -> usize {
        self.peak_bin as usize + 1
    }

    pub fn frames(&self) -> Range<usize> {
        self.first..self.first + self.means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InMemoryStack;
    use crate::types::FrameDimensions;

    #[test]
    fn test_frame_mean_truncates() {
        assert_eq!(frame_mean(&[1, 2]), 1);
        assert_eq!(frame_mean(&[100, 200, 301]), 200);
        assert_eq!(frame_mean(&[u16::MAX; 4]), 65535);
        assert_eq!(frame_mean(&[]), 0);
    }

    #[test]
    fn test_normalized_bin_scales_ratio_by_thousand() {
        assert_eq!(normalized_bin(100, 100), 1000);
        assert_eq!(normalized_bin(50, 100), 500);
        assert_eq!(normalized_bin(1, 3), 333);
        assert_eq!(normalized_bin(65535, 1), 65_535_000);
    }

    #[test]
    fn test_proportional_frames_share_bins() {
        assert_eq!(normalized_bin(50, 100), normalized_bin(100, 200));
        assert_eq!(normalized_bin(150, 100), normalized_bin(300, 200));
    }

    fn stack() -> InMemoryStack {
        let dims = FrameDimensions::new(2, 1);
        InMemoryStack::from_frames(
            dims,
            &[vec![50, 150], vec![100, 300], vec![10, 30], vec![7, 9]],
        )
        .unwrap()
    }

    #[test]
    fn test_prepass_records_means_for_range() {
        let mut source = stack();
        let rebin = Rebinning::new(1).unwrap();
        let means = FrameMeans::compute(&mut source, 1..3, &rebin).unwrap();
        assert_eq!(means.mean(1), Some(100));
        assert_eq!(means.mean(2), Some(200));
        assert_eq!(means.mean(3), None);
        assert_eq!(means.mean(0), None);
        assert_eq!(means.frames(), 1..3);
        // 150 / 100 and 300 / 200 both reach bin 1500
        assert_eq!(means.colors(), 1501);
    }

    #[test]
    fn test_prepass_uses_rebinned_samples() {
        let mut source = stack();
        let rebin = Rebinning::new(2).unwrap();
        let means = FrameMeans::compute(&mut source, 1..2, &rebin).unwrap();
        // mean stays in raw units, numerator is rebinned: 75 / 100
        assert_eq!(means.colors(), 751);
    }

    #[test]
    fn test_zero_mean_frame_is_rejected() {
        let dims = FrameDimensions::new(2, 1);
        let mut source =
            InMemoryStack::from_frames(dims, &[vec![5, 5], vec![0, 1], vec![5, 5]]).unwrap();
        let rebin = Rebinning::new(1).unwrap();
        let err = FrameMeans::compute(&mut source, 1..3, &rebin).unwrap_err();
        assert!(matches!(err, Error::ZeroMeanFrame { frame: 2 }));
    }
}
