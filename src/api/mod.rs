//! High-level, ergonomic library API: filter stacks held in memory, TIFF stacks on
//! disk, or whole directories of TIFF stacks. Prefer these entrypoints over the
//! low-level processing modules when integrating tmedian.
use std::path::{Path, PathBuf};

use ndarray::Array3;
use tracing::{info, warn};

use crate::core::params::MedianParams;
use crate::core::processing::pipeline::{RunSummary, run_temporal_median};
use crate::error::{Error, Result};
use crate::io::sidecar::write_run_sidecar;
use crate::io::{FrameSource, InMemoryStack, StackCollector, TiffStackReader, TiffStackWriter};

/// Filter a `frames x height x width` stack entirely in memory.
///
/// The stack is moved into the run; only the filtered frames are allocated anew.
pub fn process_stack_to_buffer(
    stack: Array3<u16>,
    params: &MedianParams,
) -> Result<(Array3<u16>, RunSummary)> {
    let mut source = InMemoryStack::new(stack);
    let mut sink = StackCollector::new(source.dimensions());
    let summary = run_temporal_median(&mut source, params, &mut sink)?;
    Ok((sink.into_array()?, summary))
}

/// Filter the TIFF stack at `input` into a new TIFF stack at `output`.
pub fn process_tiff_to_path(
    input: &Path,
    output: &Path,
    params: &MedianParams,
) -> Result<RunSummary> {
    process_tiff_with_options(input, output, params, false)
}

/// Like [`process_tiff_to_path`], optionally writing a JSON sidecar next to `output`.
///
/// Parameters are checked before `output` is created; if the run fails
/// afterwards the partial output is removed.
pub fn process_tiff_with_options(
    input: &Path,
    output: &Path,
    params: &MedianParams,
    sidecar: bool,
) -> Result<RunSummary> {
    let mut reader = TiffStackReader::open(input)?;
    let plan = params.validate(reader.frame_count())?;

    let mut writer =
        TiffStackWriter::create(output, reader.dimensions(), plan.output_frame_count())?;
    let summary = match run_temporal_median(&mut reader, params, &mut writer) {
        Ok(summary) => summary,
        Err(e) => {
            drop(writer);
            if let Err(remove) = std::fs::remove_file(output) {
                warn!("Could not remove partial output {}: {}", output.display(), remove);
            }
            return Err(e);
        }
    };

    if sidecar {
        write_run_sidecar(output, Some(input), &summary)?;
    }
    Ok(summary)
}

/// Default output location: `Med_<file name>` beside the input.
pub fn default_output_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| Error::Processing(format!("{} has no file name", input.display())))?;
    Ok(input.with_file_name(format!("Med_{}", name.to_string_lossy())))
}

/// Batch processing report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}

/// Return the `.tif`/`.tiff` files directly inside `input_dir`, sorted by name.
pub fn iterate_tiff_stacks(input_dir: &Path) -> Result<std::vec::IntoIter<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && is_tiff(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files.into_iter())
}

/// Filter every TIFF stack in `input_dir` into `output_dir` using `params`.
///
/// Inputs that are not stacks (a single page) are skipped. If `continue_on_error`
/// is true, failures are counted in the report and processing continues;
/// otherwise the first error is returned.
pub fn process_directory_to_path(
    input_dir: &Path,
    output_dir: &Path,
    params: &MedianParams,
    continue_on_error: bool,
    sidecar: bool,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir)?;

    let mut report = BatchReport::default();

    for path in iterate_tiff_stacks(input_dir)? {
        let Some(name) = path.file_name() else {
            continue;
        };
        let output_path = output_dir.join(format!("Med_{}", name.to_string_lossy()));

        match process_tiff_with_options(&path, &output_path, params, sidecar) {
            Ok(summary) => {
                info!(
                    "{} -> {} ({} frames)",
                    path.display(),
                    output_path.display(),
                    summary.frames_emitted
                );
                report.processed += 1;
            }
            Err(Error::NotAStack { frames }) => {
                warn!("Skipping {}: {} frame(s) is not a stack", path.display(), frames);
                report.skipped += 1;
            }
            Err(e) => {
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
                warn!("Failed {}: {}", path.display(), e);
            }
        }
    }

    info!(
        "Batch complete: {} processed, {} skipped, {} errors",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}
