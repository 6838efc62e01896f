use crate::core::params::is_valid_compression;
use crate::error::{Error, Result};
use crate::types::SAMPLE_LEVELS;

/// Maps 16-bit samples onto a coarser histogram by integer division.
///
/// All samples sharing a bin rank as equal; the resolution lost is at most
/// `factor - 1` sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebinning {
    factor: u32,
}

impl Rebinning {
    pub fn new(factor: u32) -> Result<Self> {
        if !is_valid_compression(factor) {
            return Err(Error::Processing(format!(
                "compression factor {factor} is not a power of two dividing {SAMPLE_LEVELS}"
            )));
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Histogram width in bins.
    pub fn colors(&self) -> usize {
        (SAMPLE_LEVELS / self.factor) as usize
    }

    #[inline]
    pub fn bin(&self, sample: u16) -> u32 {
        sample as u32 / self.factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_factor() {
        let r = Rebinning::new(1).unwrap();
        assert_eq!(r.colors(), 65536);
        assert_eq!(r.bin(0), 0);
        assert_eq!(r.bin(u16::MAX), 65535);
    }

    #[test]
    fn test_bin_floors() {
        let r = Rebinning::new(8).unwrap();
        assert_eq!(r.colors(), 8192);
        assert_eq!(r.bin(7), 0);
        assert_eq!(r.bin(8), 1);
        assert_eq!(r.bin(15), 1);
        assert_eq!(r.bin(u16::MAX), 8191);
    }

    #[test]
    fn test_rebinning_is_idempotent() {
        for factor in [1u32, 2, 4, 16, 1024, 65536] {
            let r = Rebinning::new(factor).unwrap();
            for x in (0..=u16::MAX).step_by(7).chain([u16::MAX]) {
                let b = r.bin(x);
                // lowest sample of the bin
                let floor = b * factor;
                assert_eq!(r.bin(floor as u16), b, "factor={factor} x={x}");
                assert!(x as u32 - floor < factor);
            }
        }
    }

    #[test]
    fn test_every_bin_fits_the_histogram() {
        for factor in [1u32, 2, 32, 65536] {
            let r = Rebinning::new(factor).unwrap();
            assert!((r.bin(u16::MAX) as usize) < r.colors());
        }
    }

    #[test]
    fn test_rejects_invalid_factor() {
        assert!(Rebinning::new(0).is_err());
        assert!(Rebinning::new(3).is_err());
        assert!(Rebinning::new(1 << 17).is_err());
    }
}
