//! Command line behavior of the `tmedian` binary.

#![allow(deprecated)] // cargo_bin deprecation

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

use tmedian::{FrameDimensions, FrameSink, FrameSource, TiffStackReader, TiffStackWriter};

fn write_stack(path: &Path, frames: usize) {
    let dims = FrameDimensions::new(4, 3);
    let mut writer = TiffStackWriter::create(path, dims, frames).unwrap();
    for f in 0..frames {
        let frame: Vec<u16> = (0..dims.dimension()).map(|p| (p * 10 + f % 4) as u16).collect();
        writer.push_frame(f + 1, &frame).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_window_of_one_is_rejected_without_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("stack.tif");
    write_stack(&input, 10);

    Command::cargo_bin("tmedian")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .arg("--window")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("window size must be between 2 and 10"));

    assert!(!dir.path().join("Med_stack.tif").exists());
}

#[test]
fn test_default_output_name_and_sidecar() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("stack.tif");
    write_stack(&input, 12);

    Command::cargo_bin("tmedian")
        .unwrap()
        .args(["--window", "4", "--compression", "2", "--sidecar", "--input"])
        .arg(&input)
        .assert()
        .success();

    let output = dir.path().join("Med_stack.tif");
    let reader = TiffStackReader::open(&output).unwrap();
    assert_eq!(reader.frame_count(), 12 - 4);

    let sidecar: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("Med_stack.json")).unwrap())
            .unwrap();
    assert_eq!(sidecar["params"]["window_size"], 4);
    assert_eq!(sidecar["count_width"], "U8");
}

#[test]
fn test_single_frame_is_not_a_stack() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("single.tif");
    write_stack(&input, 1);

    Command::cargo_bin("tmedian")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("only works with stacks"));
}

#[test]
fn test_batch_requires_output_dir() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("tmedian")
        .unwrap()
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output-dir"));
}

#[test]
fn test_batch_processes_directory() {
    let dir = tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();
    write_stack(&input_dir.join("a.tif"), 9);
    write_stack(&input_dir.join("b.tif"), 5);

    Command::cargo_bin("tmedian")
        .unwrap()
        .args(["--batch", "--window", "6", "--log"])
        .arg("--input-dir")
        .arg(&input_dir)
        .arg("--output-dir")
        .arg(&output_dir)
        .assert()
        .success();

    // b.tif is shorter than the window and fails; --batch keeps going
    assert!(output_dir.join("Med_a.tif").exists());
    assert!(!output_dir.join("Med_b.tif").exists());
}
