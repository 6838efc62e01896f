use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tmedian",
    version,
    about = "Subtract a sliding temporal median from 16-bit TIFF stacks"
)]
pub struct CliArgs {
    /// Input multi-page TIFF stack (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory containing TIFF stacks (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output filename (single file mode); defaults to Med_<input name> beside the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON preset with filter parameters; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// First frame of the first window (1-based)
    #[arg(long)]
    pub start: Option<usize>,

    /// Last frame considered (defaults to the last frame of the stack)
    #[arg(long)]
    pub end: Option<usize>,

    /// Number of frames in each median window
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Power-of-two divisor applied to samples before binning (1..=65536)
    #[arg(short, long)]
    pub compression: Option<u32>,

    /// Divide each frame by its mean intensity before ranking
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Refuse to run when the histograms would need more than this many MiB
    #[arg(long)]
    pub max_histogram_mb: Option<u64>,

    /// Write a JSON sidecar describing the run next to each output
    #[arg(long, default_value_t = false)]
    pub sidecar: bool,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue processing other stacks when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
