#![doc = r#"
tmedian — a fast temporal median filter for 16-bit image stacks.

For every pixel the filter keeps a histogram of the samples in a sliding window of
frames, tracks the window's median as the window moves, and subtracts that median
from the frame at the start of the window. Static background disappears while
transient signal (blinking emitters, moving particles) is kept. An optional
normalization pass divides every frame by its mean intensity before ranking, so
global brightness drift does not leak into the background estimate.

The crate powers the `tmedian` CLI and can be embedded in your own Rust
applications.

Add dependency
--------------
```toml
[dependencies]
tmedian = "0.1"
```

Quick start: filter a TIFF stack to a file
------------------------------------------
```rust,no_run
use std::path::Path;
use tmedian::{process_tiff_to_path, MedianParams};

fn main() -> tmedian::Result<()> {
    let params = MedianParams {
        window_size: 51,
        compression_factor: 4,
        ..MedianParams::default()
    };

    let summary = process_tiff_to_path(
        Path::new("/data/movie.tif"),
        Path::new("/out/Med_movie.tif"),
        &params,
    )?;
    println!("emitted {} frames", summary.frames_emitted);
    Ok(())
}
```

Filter an in-memory stack
-------------------------
```rust
use ndarray::Array3;
use tmedian::{process_stack_to_buffer, MedianParams};

fn main() -> tmedian::Result<()> {
    // frames x height x width
    let stack = Array3::from_shape_fn((20, 4, 4), |(f, y, x)| {
        (100 + (f % 2) * 7 + y + x) as u16
    });
    let params = MedianParams {
        window_size: 5,
        ..MedianParams::default()
    };

    let (filtered, summary) = process_stack_to_buffer(stack, &params)?;
    assert_eq!(filtered.dim(), (summary.frames_emitted, 4, 4));
    Ok(())
}
```

Custom frame sources and sinks
------------------------------
Any type implementing [`FrameSource`] can be filtered into any [`FrameSink`]; frames
are read on demand, so stacks larger than memory only need one frame buffer at a time.

```rust,no_run
use tmedian::{run_temporal_median, FrameSink, MedianParams, TiffStackReader};

struct Peak(u16);

impl FrameSink for Peak {
    fn push_frame(&mut self, _index: usize, samples: &[u16]) -> tmedian::Result<()> {
        self.0 = self.0.max(samples.iter().copied().max().unwrap_or(0));
        Ok(())
    }
}

fn main() -> tmedian::Result<()> {
    let mut reader = TiffStackReader::open(std::path::Path::new("/data/movie.tif"))?;
    let mut peak = Peak(0);
    run_temporal_median(&mut reader, &MedianParams::default(), &mut peak)?;
    println!("brightest residual: {}", peak.0);
    Ok(())
}
```

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use tmedian::{process_directory_to_path, MedianParams};

fn main() -> tmedian::Result<()> {
    let report = process_directory_to_path(
        Path::new("/data/stacks"),
        Path::new("/out"),
        &MedianParams::default(),
        true,  // continue_on_error
        false, // sidecar
    )?;

    println!(
        "processed={} skipped={} errors={}",
        report.processed, report.skipped, report.errors
    );
    Ok(())
}
```

Error handling
--------------
All public functions return `tmedian::Result<T>`; match on `tmedian::Error` to handle
specific cases. Parameter problems are reported together before any frame is read.

```rust,no_run
use std::path::Path;
use tmedian::{process_tiff_to_path, Error, MedianParams};

fn main() {
    let params = MedianParams { window_size: 1, ..MedianParams::default() };

    match process_tiff_to_path(Path::new("/data/movie.tif"), Path::new("/out.tif"), &params) {
        Ok(_) => {}
        Err(Error::InvalidParameters(violations)) => {
            for v in violations {
                eprintln!("{v}");
            }
        }
        Err(Error::NotAStack { frames }) => eprintln!("only {frames} frame(s)"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — parameters, the sliding histogram median and the run pipeline.
- [`io`] — frame source/sink traits, in-memory and TIFF adapters, run sidecars.
- [`types`] — shared types (`FrameDimensions`, `CountWidth`).
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{MedianParams, ParamError, ValidatedParams};
pub use crate::core::processing::median::{MedianState, SlidingMedian};
pub use crate::core::processing::pipeline::{RunSummary, run_temporal_median};
pub use error::{Error, Result};
pub use types::{CountWidth, FrameDimensions};

// Sources and sinks
pub use io::sidecar::write_run_sidecar;
pub use io::{
    FrameSink, FrameSource, InMemoryStack, StackCollector, TiffStackReader, TiffStackWriter,
};

// High-level API re-exports
pub use api::{
    BatchReport, default_output_path, iterate_tiff_stacks, process_directory_to_path,
    process_stack_to_buffer, process_tiff_to_path, process_tiff_with_options,
};
