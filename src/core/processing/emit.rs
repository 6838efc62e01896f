use rayon::prelude::*;

use crate::core::processing::median::MedianState;

/// Subtract the descaled per-pixel median from `samples` into `out`.
///
/// `scale` turns a median bin into sample units. Differences are truncated
/// toward zero and clamped at 0, so an output sample never exceeds its input.
pub fn subtract_median(samples: &[u16], medians: &[MedianState], scale: f64, out: &mut [u16]) {
    out.par_iter_mut()
        .zip(samples.par_iter())
        .zip(medians.par_iter())
        .for_each(|((dst, &sample), state)| {
            let background = state.median_bin as f64 * scale;
            *dst = (sample as f64 - background).max(0.0) as u16;
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(bins: &[u32]) -> Vec<MedianState> {
        bins.iter()
            .map(|&b| MedianState {
                median_bin: b,
                position_in_bin: 1,
            })
            .collect()
    }

    #[test]
    fn test_subtracts_and_clamps_at_zero() {
        let samples = [10u16, 5, 0, 65535];
        let mut out = [0u16; 4];
        subtract_median(&samples, &states(&[4, 9, 3, 0]), 1.0, &mut out);
        assert_eq!(out, [6, 0, 0, 65535]);
    }

    #[test]
    fn test_compression_scale_is_applied() {
        let samples = [100u16, 100];
        let mut out = [0u16; 2];
        subtract_median(&samples, &states(&[12, 13]), 8.0, &mut out);
        assert_eq!(out, [4, 0]);
    }

    #[test]
    fn test_fractional_background_truncates() {
        // 1000 bins at mean 125 is 125.0; 999 bins is 124.875
        let samples = [200u16, 200];
        let mut out = [0u16; 2];
        subtract_median(&samples, &states(&[1000, 999]), 0.125, &mut out);
        assert_eq!(out, [75, 75]);
    }

    #[test]
    fn test_output_never_exceeds_input() {
        let samples: Vec<u16> = (0..500).map(|i| (i * 131 % 65536) as u16).collect();
        let medians = states(&(0..500).map(|i| (i * 37 % 200) as u32).collect::<Vec<_>>());
        let mut out = vec![0u16; 500];
        subtract_median(&samples, &medians, 3.5, &mut out);
        for (o, s) in out.iter().zip(&samples) {
            assert!(o <= s);
        }
    }
}
