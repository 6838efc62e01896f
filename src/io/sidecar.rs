use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::processing::pipeline::RunSummary;
use crate::error::Result;

/// Contents of the `<output>.json` file written next to a filtered stack.
#[derive(Debug, Serialize)]
pub struct RunSidecar<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub created: String,
    pub input: Option<String>,
    pub output: String,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
}

pub fn sidecar_path(output: &Path) -> PathBuf {
    output.with_extension("json")
}

/// Write a JSON description of the run beside `output`.
pub fn write_run_sidecar(
    output: &Path,
    input: Option<&Path>,
    summary: &RunSummary,
) -> Result<PathBuf> {
    let sidecar = RunSidecar {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        created: chrono::Utc::now().to_rfc3339(),
        input: input.map(|p| p.display().to_string()),
        output: output.display().to_string(),
        summary,
    };
    let path = sidecar_path(output);
    let json_string = serde_json::to_string_pretty(&sidecar)?;
    std::fs::write(&path, json_string)?;
    info!("Created run sidecar: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::MedianParams;
    use crate::core::processing::pipeline::run_temporal_median;
    use crate::io::{InMemoryStack, StackCollector};
    use crate::types::FrameDimensions;
    use tempfile::tempdir;

    #[test]
    fn test_sidecar_records_parameters_and_range() {
        let dims = FrameDimensions::new(2, 1);
        let frames = vec![vec![4u16, 8]; 6];
        let mut source = InMemoryStack::from_frames(dims, &frames).unwrap();
        let mut sink = StackCollector::new(dims);
        let params = MedianParams {
            window_size: 3,
            compression_factor: 2,
            ..MedianParams::default()
        };
        let summary = run_temporal_median(&mut source, &params, &mut sink).unwrap();

        let dir = tempdir().unwrap();
        let output = dir.path().join("Med_stack.tif");
        let path = write_run_sidecar(&output, Some(Path::new("stack.tif")), &summary).unwrap();
        assert_eq!(path, dir.path().join("Med_stack.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["tool"], "tmedian");
        assert_eq!(value["input"], "stack.tif");
        assert_eq!(value["frames_emitted"], 3);
        assert_eq!(value["params"]["window_size"], 3);
        assert_eq!(value["params"]["compression_factor"], 2);
        assert_eq!(value["dimensions"]["width"], 2);
        assert!(value["created"].as_str().unwrap().contains('T'));
    }
}
