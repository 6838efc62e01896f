//! Sample-to-bin mappings.
//!
//! The median engine only ever sees bin indices. A mapping converts a whole
//! frame at a time and knows how to turn a median bin of a given frame back
//! into sample units, so the plain and normalized runs share one engine.
use crate::core::processing::normalize::{FrameMeans, normalized_bin};
use crate::core::processing::rebin::Rebinning;
use crate::error::{Error, Result};
use crate::types::NORMALIZATION_SCALE;

pub trait BinMapping: Send + Sync {
    /// Histogram width in bins; every mapped bin is below this.
    fn colors(&self) -> usize;

    /// Map the samples of frame `index` into `bins`.
    fn map_frame(&self, index: usize, samples: &[u16], bins: &mut [u32]) -> Result<()>;

    /// Multiplier turning a median bin of frame `index` into sample units.
    fn median_scale(&self, index: usize) -> Result<f64>;
}

/// Plain rebinning: `bin = sample / factor`.
#[derive(Debug, Clone)]
pub struct DirectMapping {
    rebin: Rebinning,
}

impl DirectMapping {
    pub fn new(rebin: Rebinning) -> Self {
        Self { rebin }
    }
}

impl BinMapping for DirectMapping {
    fn colors(&self) -> usize {
        self.rebin.colors()
    }

    fn map_frame(&self, _index: usize, samples: &[u16], bins: &mut [u32]) -> Result<()> {
        for (bin, &sample) in bins.iter_mut().zip(samples) {
            *bin = self.rebin.bin(sample);
        }
        Ok(())
    }

    fn median_scale(&self, _index: usize) -> Result<f64> {
        Ok(self.rebin.factor() as f64)
    }
}

/// Rebinning followed by division by the frame mean.
#[derive(Debug, Clone)]
pub struct NormalizedMapping {
    rebin: Rebinning,
    means: FrameMeans,
}

impl NormalizedMapping {
    pub fn new(rebin: Rebinning, means: FrameMeans) -> Self {
        Self { rebin, means }
    }

    fn mean(&self, index: usize) -> Result<u32> {
        self.means.mean(index).ok_or_else(|| {
            Error::Processing(format!(
                "frame {index} is outside the normalized range {:?}",
                self.means.frames()
            ))
        })
    }
}

impl BinMapping for NormalizedMapping {
    fn colors(&self) -> usize {
        self.means.colors()
    }

    fn map_frame(&self, index: usize, samples: &[u16], bins: &mut [u32]) -> Result<()> {
        let mean = self.mean(index)?;
        for (bin, &sample) in bins.iter_mut().zip(samples) {
            *bin = normalized_bin(self.rebin.bin(sample), mean);
        }
        Ok(())
    }

    fn median_scale(&self, index: usize) -> Result<f64> {
        let mean = self.mean(index)?;
        Ok(self.rebin.factor() as f64 * mean as f64 / NORMALIZATION_SCALE as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::InMemoryStack;
    use crate::types::FrameDimensions;

    #[test]
    fn test_direct_mapping_rebins() {
        let mapping = DirectMapping::new(Rebinning::new(4).unwrap());
        let mut bins = [0u32; 3];
        mapping.map_frame(7, &[3, 4, 65535], &mut bins).unwrap();
        assert_eq!(bins, [0, 1, 16383]);
        assert_eq!(mapping.colors(), 16384);
        assert_eq!(mapping.median_scale(7).unwrap(), 4.0);
    }

    #[test]
    fn test_normalized_mapping_uses_frame_mean() {
        let dims = FrameDimensions::new(2, 1);
        let mut source =
            InMemoryStack::from_frames(dims, &[vec![50, 150], vec![100, 300], vec![1, 1]])
                .unwrap();
        let rebin = Rebinning::new(1).unwrap();
        let means = FrameMeans::compute(&mut source, 1..3, &rebin).unwrap();
        let mapping = NormalizedMapping::new(rebin, means);

        let mut a = [0u32; 2];
        let mut b = [0u32; 2];
        mapping.map_frame(1, &[50, 150], &mut a).unwrap();
        mapping.map_frame(2, &[100, 300], &mut b).unwrap();
        assert_eq!(a, [500, 1500]);
        assert_eq!(a, b);

        assert!((mapping.median_scale(2).unwrap() - 0.2).abs() < 1e-12);
        assert!(mapping.map_frame(3, &[1, 1], &mut a).is_err());
        assert!(mapping.median_scale(3).is_err());
    }
}
