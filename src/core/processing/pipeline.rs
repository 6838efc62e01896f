use serde::Serialize;
use tracing::{debug, info};

use crate::core::params::{MedianParams, ValidatedParams};
use crate::core::processing::emit::subtract_median;
use crate::core::processing::mapping::{BinMapping, DirectMapping, NormalizedMapping};
use crate::core::processing::median::{BinCount, SlidingMedian};
use crate::core::processing::normalize::FrameMeans;
use crate::core::processing::rebin::Rebinning;
use crate::error::{Error, Result};
use crate::io::{FrameSink, FrameSource};
use crate::types::{CountWidth, FrameDimensions};

/// What a finished run did, suitable for logging and sidecar files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub params: ValidatedParams,
    pub dimensions: FrameDimensions,
    pub first_frame: usize,
    pub last_frame: usize,
    pub frames_emitted: usize,
    pub histogram_bins: usize,
    pub count_width: CountWidth,
    pub histogram_bytes: u64,
}

/// Approximate histogram allocation for a run.
pub fn histogram_bytes(dimension: usize, colors: usize, width: CountWidth) -> u64 {
    (dimension as u64)
        .saturating_mul(colors as u64)
        .saturating_mul(width.bytes())
}

/// Subtract the running temporal median from every frame of `source` and feed
/// the results to `sink`.
///
/// Frames `start ..= end - window_size` are emitted in order; frame `k` has the
/// median of frames `k .. k + window_size - 1` removed.
pub fn run_temporal_median<S, K>(
    source: &mut S,
    params: &MedianParams,
    sink: &mut K,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let plan = params.validate(source.frame_count())?;
    let dims = source.dimensions();
    let rebin = Rebinning::new(plan.compression_factor)?;

    info!(
        "Temporal median: frames {}..={}, window {}, compression {}, normalize {}",
        plan.start, plan.end, plan.window_size, plan.compression_factor, plan.normalize
    );

    let mapping: Box<dyn BinMapping> = if plan.normalize {
        let means = FrameMeans::compute(source, plan.start..plan.end, &rebin)?;
        Box::new(NormalizedMapping::new(rebin, means))
    } else {
        Box::new(DirectMapping::new(rebin))
    };

    let count_width = CountWidth::for_window(plan.window_size);
    let bytes = histogram_bytes(dims.dimension(), mapping.colors(), count_width);
    info!(
        "Histogram memory (approx): {:.2} MB ({} pixels x {} bins, {} counters)",
        bytes as f64 / 1024.0 / 1024.0,
        dims.dimension(),
        mapping.colors(),
        count_width
    );
    if let Some(limit) = params.max_histogram_bytes {
        if bytes > limit {
            return Err(Error::HistogramTooLarge { bytes, limit });
        }
    }

    let frames_emitted = match count_width {
        CountWidth::U8 => slide_stack::<u8, _, _>(source, sink, &plan, mapping.as_ref())?,
        CountWidth::U16 => slide_stack::<u16, _, _>(source, sink, &plan, mapping.as_ref())?,
        CountWidth::U32 => slide_stack::<u32, _, _>(source, sink, &plan, mapping.as_ref())?,
    };
    sink.finish()?;

    info!("Temporal median complete: {} frames emitted", frames_emitted);

    Ok(RunSummary {
        params: plan,
        dimensions: dims,
        first_frame: plan.start,
        last_frame: plan.last_output_frame(),
        frames_emitted,
        histogram_bins: mapping.colors(),
        count_width,
        histogram_bytes: bytes,
    })
}

fn slide_stack<C, S, K>(
    source: &mut S,
    sink: &mut K,
    plan: &ValidatedParams,
    mapping: &dyn BinMapping,
) -> Result<usize>
where
    C: BinCount,
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let dimension = source.dimensions().dimension();
    let mut engine = SlidingMedian::<C>::new(dimension, mapping.colors(), plan.window_size)?;

    // Reused for every slide
    let mut samples = vec![0u16; dimension];
    let mut outgoing = vec![0u32; dimension];
    let mut incoming = vec![0u32; dimension];
    let mut output = vec![0u16; dimension];

    for frame in plan.start..plan.start + plan.window_size {
        load_bins(source, mapping, frame, &mut samples, &mut incoming)?;
        engine.accumulate(&incoming)?;
    }

    let mut emitted = 0;
    for k in plan.start..=plan.last_output_frame() {
        if k > plan.start {
            // `outgoing` still holds the bins of frame k - 1 from the previous emit
            let entering = k + plan.window_size - 1;
            load_bins(source, mapping, entering, &mut samples, &mut incoming)?;
            engine.slide(&outgoing, &incoming)?;
        }

        // frame k leaves the window on the next slide
        load_bins(source, mapping, k, &mut samples, &mut outgoing)?;
        let scale = mapping.median_scale(k)?;
        subtract_median(&samples, engine.medians(), scale, &mut output);
        sink.push_frame(k, &output)?;
        emitted += 1;

        debug!("Frame {}/{}", k, plan.last_output_frame());
    }

    Ok(emitted)
}

fn load_bins<S: FrameSource + ?Sized>(
    source: &mut S,
    mapping: &dyn BinMapping,
    frame: usize,
    samples: &mut [u16],
    bins: &mut [u32],
) -> Result<()> {
    source.read_frame(frame, samples)?;
    mapping.map_frame(frame, samples, bins)
}
