use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::types::SAMPLE_LEVELS;

/// Filter parameters suitable for config files and CLI presets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianParams {
    /// First frame of the first window (1-based)
    pub start: usize,
    /// Last frame considered; None means the last frame of the stack
    pub end: Option<usize>,
    /// Number of frames in each median window
    pub window_size: usize,
    /// Power-of-two divisor applied to samples before binning
    pub compression_factor: u32,
    /// Scale samples by their frame's mean intensity before ranking
    pub normalize: bool,
    /// Refuse to run when the histograms would exceed this many bytes
    pub max_histogram_bytes: Option<u64>,
}

impl Default for MedianParams {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
            window_size: 27,
            compression_factor: 1,
            normalize: false,
            max_histogram_bytes: None,
        }
    }
}

/// A single broken bound, with the range that would have been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("the start frame must be between 1 and {max}, got {start}")]
    Start { start: usize, max: i64 },

    #[error("the end frame must be between {min} and {max}, got {end}")]
    End { end: usize, min: usize, max: usize },

    #[error("the window size must be between 2 and {max}, got {window_size}")]
    Window { window_size: usize, max: usize },

    #[error("the compression factor must be a power of two between 1 and {max}, got {factor}")]
    Compression { factor: u32, max: u32 },

    #[error("the start frame {start} leaves no full window before end frame {end}")]
    EmptyRange { start: usize, end: usize },
}

/// Parameters checked against a concrete stack; immutable for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatedParams {
    pub start: usize,
    pub end: usize,
    pub window_size: usize,
    pub compression_factor: u32,
    pub normalize: bool,
}

impl ValidatedParams {
    /// Number of frames the run emits.
    pub fn output_frame_count(&self) -> usize {
        self.end - self.window_size - self.start + 1
    }

    /// Last frame index that gets emitted.
    pub fn last_output_frame(&self) -> usize {
        self.end - self.window_size
    }

    /// 1-based rank of the median sample inside a sorted window (lower median).
    pub fn median_rank(&self) -> usize {
        self.window_size.div_ceil(2)
    }
}

impl MedianParams {
    /// Check the parameters against a stack of `size` frames.
    ///
    /// Every broken bound is reported, not just the first one.
    pub fn validate(&self, size: usize) -> Result<ValidatedParams> {
        if size < 2 {
            return Err(Error::NotAStack { frames: size });
        }

        let end = self.end.unwrap_or(size);
        let window_size = self.window_size;
        let mut violations = Vec::new();

        let start_max = size as i64 - window_size as i64;
        if self.start < 1 || self.start as i64 > start_max {
            violations.push(ParamError::Start {
                start: self.start,
                max: start_max,
            });
        }
        if end > size || end < window_size {
            violations.push(ParamError::End {
                end,
                min: window_size,
                max: size,
            });
        }
        if window_size < 2 || window_size > size {
            violations.push(ParamError::Window {
                window_size,
                max: size,
            });
        }
        if !is_valid_compression(self.compression_factor) {
            violations.push(ParamError::Compression {
                factor: self.compression_factor,
                max: SAMPLE_LEVELS,
            });
        }
        if violations.is_empty() && self.start + window_size > end {
            violations.push(ParamError::EmptyRange {
                start: self.start,
                end,
            });
        }

        if !violations.is_empty() {
            return Err(Error::InvalidParameters(violations));
        }

        Ok(ValidatedParams {
            start: self.start,
            end,
            window_size,
            compression_factor: self.compression_factor,
            normalize: self.normalize,
        })
    }
}

pub(crate) fn is_valid_compression(factor: u32) -> bool {
    factor.is_power_of_two() && factor <= SAMPLE_LEVELS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start: usize, end: Option<usize>, window_size: usize) -> MedianParams {
        MedianParams {
            start,
            end,
            window_size,
            ..MedianParams::default()
        }
    }

    fn violations(err: Error) -> Vec<ParamError> {
        match err {
            Error::InvalidParameters(v) => v,
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_match_reference_dialog() {
        let p = MedianParams::default();
        assert_eq!(p.start, 1);
        assert_eq!(p.end, None);
        assert_eq!(p.window_size, 27);
        assert_eq!(p.compression_factor, 1);
        assert!(!p.normalize);
    }

    #[test]
    fn test_valid_configuration_uses_stack_size_for_end() {
        let v = params(1, None, 5).validate(30).unwrap();
        assert_eq!(v.end, 30);
        assert_eq!(v.output_frame_count(), 26);
        assert_eq!(v.last_output_frame(), 25);
        assert_eq!(v.median_rank(), 3);
    }

    #[test]
    fn test_window_of_one_is_always_rejected() {
        for size in [2, 3, 10, 1000] {
            for start in [1, 2] {
                let err = params(start, None, 1).validate(size).unwrap_err();
                let v = violations(err);
                assert!(
                    v.iter()
                        .any(|e| matches!(e, ParamError::Window { window_size: 1, .. })),
                    "size={size} start={start}: {v:?}"
                );
            }
        }
    }

    #[test]
    fn test_single_frame_is_not_a_stack() {
        let err = params(1, None, 2).validate(1).unwrap_err();
        assert!(matches!(err, Error::NotAStack { frames: 1 }));
    }

    #[test]
    fn test_start_bounds() {
        let v = violations(params(0, None, 5).validate(30).unwrap_err());
        assert_eq!(v, vec![ParamError::Start { start: 0, max: 25 }]);

        let v = violations(params(26, None, 5).validate(30).unwrap_err());
        assert!(v.contains(&ParamError::Start { start: 26, max: 25 }));

        assert!(params(25, None, 5).validate(30).is_ok());
    }

    #[test]
    fn test_end_bounds() {
        let v = violations(params(1, Some(31), 5).validate(30).unwrap_err());
        assert!(v.contains(&ParamError::End {
            end: 31,
            min: 5,
            max: 30
        }));

        let v = violations(params(1, Some(4), 5).validate(30).unwrap_err());
        assert!(v.contains(&ParamError::End {
            end: 4,
            min: 5,
            max: 30
        }));
    }

    #[test]
    fn test_all_violations_are_reported_together() {
        let v = violations(params(0, Some(50), 40).validate(30).unwrap_err());
        assert_eq!(v.len(), 3);
        let msg = Error::InvalidParameters(v).to_string();
        assert!(msg.contains("start frame"));
        assert!(msg.contains("end frame"));
        assert!(msg.contains("window size must be between 2 and 30"));
    }

    #[test]
    fn test_compression_must_be_power_of_two() {
        for factor in [0u32, 3, 6, 100, 1 << 17] {
            let p = MedianParams {
                compression_factor: factor,
                ..params(1, None, 5)
            };
            let v = violations(p.validate(30).unwrap_err());
            assert!(
                matches!(v[0], ParamError::Compression { .. }),
                "factor {factor}"
            );
        }
        for factor in [1u32, 2, 4, 256, 1 << 16] {
            let p = MedianParams {
                compression_factor: factor,
                ..params(1, None, 5)
            };
            assert!(p.validate(30).is_ok(), "factor {factor}");
        }
    }

    #[test]
    fn test_window_past_end_is_an_empty_range() {
        let v = violations(params(20, Some(22), 5).validate(30).unwrap_err());
        assert_eq!(v, vec![ParamError::EmptyRange { start: 20, end: 22 }]);
    }

    #[test]
    fn test_preset_json_fills_missing_fields_with_defaults() {
        let p: MedianParams =
            serde_json::from_str(r#"{"window_size": 9, "normalize": true}"#).unwrap();
        assert_eq!(p.window_size, 9);
        assert!(p.normalize);
        assert_eq!(p.start, 1);
        assert_eq!(p.compression_factor, 1);
    }
}
