use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tmedian::MedianParams;
use tmedian::api::{default_output_path, process_directory_to_path, process_tiff_with_options};

use super::args::CliArgs;
use super::errors::AppError;

fn load_preset(path: &Path) -> Result<MedianParams, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::PresetRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::PresetParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Preset values (or defaults) with every flag given on the command line applied on top.
fn resolve_params(args: &CliArgs) -> Result<MedianParams, AppError> {
    let mut params = match &args.config {
        Some(path) => load_preset(path)?,
        None => MedianParams::default(),
    };

    if let Some(start) = args.start {
        params.start = start;
    }
    if let Some(end) = args.end {
        params.end = Some(end);
    }
    if let Some(window) = args.window {
        params.window_size = window;
    }
    if let Some(compression) = args.compression {
        params.compression_factor = compression;
    }
    if args.normalize {
        params.normalize = true;
    }
    if let Some(mb) = args.max_histogram_mb {
        params.max_histogram_bytes = Some(mb.saturating_mul(1024 * 1024));
    }
    Ok(params)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(AppError::ZeroThreads.into());
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(AppError::from)?;
    }

    let params = resolve_params(&args)?;
    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let report = process_directory_to_path(
            &input_dir,
            &output_dir,
            &params,
            args.batch,
            args.sidecar,
        )
        .map_err(AppError::from)?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = match args.output {
            Some(output) => output,
            None => default_output_path(&input).map_err(AppError::from)?,
        };

        let summary = process_tiff_with_options(&input, &output, &params, args.sidecar)
            .map_err(AppError::from)?;
        info!(
            "Successfully processed: {:?} -> {:?} ({} frames)",
            input, output, summary.frames_emitted
        );
    }

    Ok(())
}
