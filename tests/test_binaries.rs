//! Integration tests for the qlut binary
//!
//! Runs the `apply`, `build` and `info` subcommands end to end against files
//! in a temporary directory.

use qlut::quantize::{build_activation_table, Activation, QuantParams};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qlut"))
}

fn run_qlut(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute qlut")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

/// Build a table with unit scales around zero point 128
fn build_table(dir: &Path, name: &str, activation: &str, extra: &[&str]) -> (PathBuf, Output) {
    let table = dir.join(name);
    let mut args = vec![
        "build",
        activation,
        path_str(&table),
        "--in-scale",
        "1",
        "--in-zero-point",
        "128",
        "--out-scale",
        "1",
        "--out-zero-point",
        "128",
    ];
    args.extend_from_slice(extra);
    let output = run_qlut(&args);
    (table, output)
}

fn unit_params() -> QuantParams {
    QuantParams::new(1.0, 128).unwrap()
}

// =============================================================================
// build
// =============================================================================

#[test]
fn test_build_writes_256_byte_table() {
    let temp = TempDir::new().unwrap();
    let (table, output) = build_table(temp.path(), "relu.lut", "relu", &[]);

    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote relu table"));

    let bytes = fs::read(&table).unwrap();
    assert_eq!(bytes.len(), 256);
    for (q, &t) in bytes.iter().enumerate() {
        assert_eq!(t, (q as u8).max(128), "entry {}", q);
    }
}

#[test]
fn test_build_passes_alpha() {
    let temp = TempDir::new().unwrap();
    let (table, output) = build_table(temp.path(), "leaky.lut", "leaky-relu", &["--alpha", "0.5"]);
    assert!(output.status.success(), "{:?}", output);

    let expected = build_activation_table(
        Activation::LeakyRelu { alpha: 0.5 },
        &unit_params(),
        &unit_params(),
    );
    let bytes = fs::read(&table).unwrap();
    assert_eq!(&bytes[..], expected.as_bytes());
    // Default alpha would give 127 here
    assert_eq!(bytes[0], 64);
}

#[test]
fn test_build_passes_beta() {
    let temp = TempDir::new().unwrap();
    let (table, output) = build_table(
        temp.path(),
        "hard.lut",
        "hard-sigmoid",
        &["--alpha", "0.1", "--beta", "0.25"],
    );
    assert!(output.status.success(), "{:?}", output);

    let expected = build_activation_table(
        Activation::HardSigmoid {
            alpha: 0.1,
            beta: 0.25,
        },
        &unit_params(),
        &unit_params(),
    );
    assert_eq!(&fs::read(&table).unwrap()[..], expected.as_bytes());
}

#[test]
fn test_build_rejects_out_of_range_zero_point() {
    let temp = TempDir::new().unwrap();
    let table = temp.path().join("bad.lut");
    let output = run_qlut(&[
        "build",
        "sigmoid",
        path_str(&table),
        "--in-scale",
        "0.1",
        "--in-zero-point",
        "300",
        "--out-scale",
        "0.004",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid value for --in-zero-point: 300"), "{}", stderr);
    assert!(!table.exists());
}

#[test]
fn test_build_rejects_unknown_activation() {
    let temp = TempDir::new().unwrap();
    let table = temp.path().join("bad.lut");
    let output = run_qlut(&[
        "build",
        "softmax",
        path_str(&table),
        "--in-scale",
        "0.1",
        "--out-scale",
        "0.1",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid value for --activation: softmax"), "{}", stderr);
}

// =============================================================================
// apply
// =============================================================================

#[test]
fn test_build_then_apply() {
    let temp = TempDir::new().unwrap();
    let (table, output) = build_table(temp.path(), "relu.lut", "relu", &[]);
    assert!(output.status.success(), "{:?}", output);

    let input = temp.path().join("input.bin");
    let result = temp.path().join("output.bin");
    let data: Vec<u8> = (0..10_000).map(|i| (i * 37 + 11) as u8).collect();
    fs::write(&input, &data).unwrap();

    let output = run_qlut(&[
        "apply",
        path_str(&table),
        path_str(&input),
        path_str(&result),
        "--threads",
        "2",
        "--chunk-size",
        "1000",
    ]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Transformed 10000 bytes"));

    let expected: Vec<u8> = data.iter().map(|&b| b.max(128)).collect();
    assert_eq!(fs::read(&result).unwrap(), expected);
    assert_eq!(fs::read(&input).unwrap(), data);
}

#[test]
fn test_apply_in_place_with_forced_level() {
    let temp = TempDir::new().unwrap();
    let table = temp.path().join("invert.lut");
    let inverted: Vec<u8> = (0..=255u8).map(|b| !b).collect();
    fs::write(&table, &inverted).unwrap();

    let data: Vec<u8> = (0..1001).map(|i| (i * 13) as u8).collect();
    let file = temp.path().join("data.bin");
    fs::write(&file, &data).unwrap();

    let output = run_qlut(&[
        "apply",
        path_str(&table),
        path_str(&file),
        path_str(&file),
        "--level",
        "portable",
        "--no-parallel",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let expected: Vec<u8> = data.iter().map(|&b| !b).collect();
    assert_eq!(fs::read(&file).unwrap(), expected);
}

#[test]
fn test_apply_rejects_invalid_level() {
    let temp = TempDir::new().unwrap();
    let output = run_qlut(&[
        "apply",
        path_str(&temp.path().join("t.lut")),
        path_str(&temp.path().join("in")),
        path_str(&temp.path().join("out")),
        "--level",
        "avx512",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("avx512"), "{}", stderr);
}

#[test]
fn test_apply_rejects_short_table() {
    let temp = TempDir::new().unwrap();
    let table = temp.path().join("short.lut");
    fs::write(&table, [0u8; 100]).unwrap();
    let input = temp.path().join("in.bin");
    fs::write(&input, b"abc").unwrap();
    let result = temp.path().join("out.bin");

    let output = run_qlut(&["apply", path_str(&table), path_str(&input), path_str(&result)]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load table"), "{}", stderr);
    assert!(!result.exists());
}

// =============================================================================
// info
// =============================================================================

#[test]
fn test_info_lists_levels() {
    let output = run_qlut(&["info"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Detected:"));
    assert!(stdout.contains("scalar"));
    assert!(stdout.contains("portable"));
}

#[test]
fn test_help_lists_subcommands() {
    let output = run_qlut(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apply"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("info"));
}
