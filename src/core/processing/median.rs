//! Sliding-window histogram median, one histogram per pixel.
//!
//! Every pixel keeps a histogram of the bins currently inside the window and a
//! [`MedianState`] naming the median bin plus the median's rank among the tied
//! samples of that bin. When the window slides, one sample leaves and one
//! enters; the rank pointer moves by at most one position, and the median bin
//! only changes when the pointer runs off the edge of its bin. The scan for the
//! next occupied bin is paid for by the samples it skips, so a slide costs O(1)
//! amortized per pixel.
//!
//! Pixels are independent, so fills and slides are split across rayon tasks
//! over contiguous pixel ranges. A call returns once every pixel is updated.
use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Pixels handled by one rayon task.
const PIXELS_PER_TASK: usize = 4096;

const BIN_OUT_OF_RANGE: &str = "bin index outside the histogram";
const UNCOUNTED_SAMPLE: &str = "outgoing sample was never counted";
const EMPTY_HISTOGRAM: &str = "histogram holds fewer samples than the median rank";
const NO_BIN_ABOVE: &str = "no occupied bin above the median";
const NO_BIN_BELOW: &str = "no occupied bin below the median";

/// Unsigned counter stored in each histogram bin.
pub trait BinCount: Copy + Default + Send + Sync + 'static {
    const MAX: usize;

    fn get(self) -> usize;
    fn increment(&mut self);
    fn decrement(&mut self);
}

macro_rules! impl_bin_count {
    ($($t:ty),+) => {
        $(
            impl BinCount for $t {
                const MAX: usize = <$t>::MAX as usize;

                #[inline]
                fn get(self) -> usize {
                    self as usize
                }

                #[inline]
                fn increment(&mut self) {
                    *self += 1;
                }

                #[inline]
                fn decrement(&mut self) {
                    *self -= 1;
                }
            }
        )+
    };
}

impl_bin_count!(u8, u16, u32);

/// Where a pixel's median currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MedianState {
    pub median_bin: u32,
    /// 1-based rank of the median among the samples of `median_bin`, counted from below.
    pub position_in_bin: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// The first window is being loaded.
    Filling { loaded: usize },
    /// Histograms hold exactly one window and medians are valid.
    Windowed { slides: usize },
}

pub struct SlidingMedian<C: BinCount> {
    dimension: usize,
    colors: usize,
    window_size: usize,
    counts: Vec<C>,
    medians: Vec<MedianState>,
    phase: EnginePhase,
}

impl<C: BinCount> SlidingMedian<C> {
    pub fn new(dimension: usize, colors: usize, window_size: usize) -> Result<Self> {
        if colors == 0 {
            return Err(Error::Processing("histogram needs at least one bin".into()));
        }
        if window_size == 0 || window_size > C::MAX {
            return Err(Error::Processing(format!(
                "window of {window_size} frames does not fit counters of max {}",
                C::MAX
            )));
        }
        let cells = dimension.checked_mul(colors).ok_or_else(|| {
            Error::Processing(format!("{dimension} pixels x {colors} bins overflows"))
        })?;

        Ok(Self {
            dimension,
            colors,
            window_size,
            counts: vec![C::default(); cells],
            medians: vec![MedianState::default(); dimension],
            phase: EnginePhase::Filling { loaded: 0 },
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn colors(&self) -> usize {
        self.colors
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Rank of the median inside a sorted window (lower median for even windows).
    pub fn median_rank(&self) -> usize {
        self.window_size.div_ceil(2)
    }

    pub fn medians(&self) -> &[MedianState] {
        &self.medians
    }

    pub fn median_bin(&self, pixel: usize) -> u32 {
        self.medians[pixel].median_bin
    }

    pub fn pixel_histogram(&self, pixel: usize) -> &[C] {
        &self.counts[pixel * self.colors..(pixel + 1) * self.colors]
    }

    /// Number of samples currently counted for `pixel`.
    pub fn pixel_total(&self, pixel: usize) -> usize {
        self.pixel_histogram(pixel).iter().map(|c| c.get()).sum()
    }

    /// Count one frame of bins into the first window.
    ///
    /// The medians are derived as soon as the window is full.
    pub fn accumulate(&mut self, bins: &[u32]) -> Result<()> {
        let loaded = match self.phase {
            EnginePhase::Filling { loaded } => loaded,
            EnginePhase::Windowed { .. } => {
                return Err(Error::Processing(
                    "window is already full; use slide() to advance it".into(),
                ));
            }
        };
        self.check_len(bins.len())?;

        let colors = self.colors;
        self.counts
            .par_chunks_mut(colors * PIXELS_PER_TASK)
            .zip(bins.par_chunks(PIXELS_PER_TASK))
            .enumerate()
            .try_for_each(|(task, (hist, bins))| -> Result<()> {
                for (p, (h, &bin)) in hist.chunks_mut(colors).zip(bins).enumerate() {
                    match h.get_mut(bin as usize) {
                        Some(count) => count.increment(),
                        None => return Err(violation(task, p, BIN_OUT_OF_RANGE)),
                    }
                }
                Ok(())
            })?;

        let loaded = loaded + 1;
        if loaded == self.window_size {
            self.seal()?;
            self.phase = EnginePhase::Windowed { slides: 0 };
        } else {
            self.phase = EnginePhase::Filling { loaded };
        }
        Ok(())
    }

    /// Advance the window by one frame: `outgoing` leaves, `incoming` enters.
    pub fn slide(&mut self, outgoing: &[u32], incoming: &[u32]) -> Result<()> {
        let slides = match self.phase {
            EnginePhase::Windowed { slides } => slides,
            EnginePhase::Filling { loaded } => {
                return Err(Error::Processing(format!(
                    "cannot slide a window holding {loaded} of {} frames",
                    self.window_size
                )));
            }
        };
        self.check_len(outgoing.len())?;
        self.check_len(incoming.len())?;

        let colors = self.colors;
        self.counts
            .par_chunks_mut(colors * PIXELS_PER_TASK)
            .zip(self.medians.par_chunks_mut(PIXELS_PER_TASK))
            .zip(outgoing.par_chunks(PIXELS_PER_TASK))
            .zip(incoming.par_chunks(PIXELS_PER_TASK))
            .enumerate()
            .try_for_each(|(task, (((hist, states), old), new))| -> Result<()> {
                for (p, (h, state)) in hist.chunks_mut(colors).zip(states.iter_mut()).enumerate() {
                    slide_pixel(h, state, old[p], new[p])
                        .map_err(|reason| violation(task, p, reason))?;
                }
                Ok(())
            })?;

        self.phase = EnginePhase::Windowed { slides: slides + 1 };
        Ok(())
    }

    fn seal(&mut self) -> Result<()> {
        let colors = self.colors;
        let target = self.median_rank();
        self.medians
            .par_chunks_mut(PIXELS_PER_TASK)
            .zip(self.counts.par_chunks(colors * PIXELS_PER_TASK))
            .enumerate()
            .try_for_each(|(task, (states, hist))| -> Result<()> {
                for (p, (state, h)) in states.iter_mut().zip(hist.chunks(colors)).enumerate() {
                    *state = seal_pixel(h, target).map_err(|reason| violation(task, p, reason))?;
                }
                Ok(())
            })
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.dimension {
            return Err(Error::Processing(format!(
                "expected {} bins per frame, got {len}",
                self.dimension
            )));
        }
        Ok(())
    }
}

#[inline]
fn violation(task: usize, offset: usize, reason: &'static str) -> Error {
    Error::InvariantViolation {
        pixel: task * PIXELS_PER_TASK + offset,
        reason,
    }
}

/// Locate the `target`-th smallest sample of a freshly filled histogram.
fn seal_pixel<C: BinCount>(
    hist: &[C],
    target: usize,
) -> std::result::Result<MedianState, &'static str> {
    let mut below = 0;
    for (bin, count) in hist.iter().enumerate() {
        let count = count.get();
        if below + count >= target {
            return Ok(MedianState {
                median_bin: bin as u32,
                position_in_bin: (target - below) as u32,
            });
        }
        below += count;
    }
    Err(EMPTY_HISTOGRAM)
}

fn slide_pixel<C: BinCount>(
    hist: &mut [C],
    state: &mut MedianState,
    old: u32,
    new: u32,
) -> std::result::Result<(), &'static str> {
    let (old, new) = (old as usize, new as usize);
    if old >= hist.len() || new >= hist.len() {
        return Err(BIN_OUT_OF_RANGE);
    }
    if hist[old].get() == 0 {
        return Err(UNCOUNTED_SAMPLE);
    }
    hist[old].decrement();
    hist[new].increment();

    let median = state.median_bin as usize;
    match (old.cmp(&median), new.cmp(&median)) {
        // Same side, or a tied sample replaced by another: rank unchanged.
        (Ordering::Less, Ordering::Less)
        | (Ordering::Greater, Ordering::Greater)
        | (Ordering::Equal, Ordering::Equal)
        | (Ordering::Greater, Ordering::Equal) => {}
        (Ordering::Less, Ordering::Greater) => {
            if state.position_in_bin as usize == hist[median].get() {
                advance(hist, state)?;
            } else {
                state.position_in_bin += 1;
            }
        }
        (Ordering::Greater, Ordering::Less) | (Ordering::Equal, Ordering::Less) => {
            if state.position_in_bin == 1 {
                retreat(hist, state)?;
            } else {
                state.position_in_bin -= 1;
            }
        }
        (Ordering::Less, Ordering::Equal) => state.position_in_bin += 1,
        (Ordering::Equal, Ordering::Greater) => {
            // the bin already lost the outgoing sample
            if state.position_in_bin as usize == hist[median].get() + 1 {
                advance(hist, state)?;
            }
        }
    }
    Ok(())
}

fn advance<C: BinCount>(
    hist: &[C],
    state: &mut MedianState,
) -> std::result::Result<(), &'static str> {
    let from = state.median_bin as usize + 1;
    let next = hist[from..]
        .iter()
        .position(|c| c.get() > 0)
        .ok_or(NO_BIN_ABOVE)?;
    state.median_bin = (from + next) as u32;
    state.position_in_bin = 1;
    Ok(())
}

fn retreat<C: BinCount>(
    hist: &[C],
    state: &mut MedianState,
) -> std::result::Result<(), &'static str> {
    let prev = hist[..state.median_bin as usize]
        .iter()
        .rposition(|c| c.get() > 0)
        .ok_or(NO_BIN_BELOW)?;
    state.median_bin = prev as u32;
    state.position_in_bin = hist[prev].get() as u32;
    Ok(())
}
