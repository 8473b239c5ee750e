//! qlut - apply quantized byte lookup tables from the command line
//!
//! - `apply`: map a file through a 256-byte table
//! - `build`: generate a quantized activation table
//! - `info`: print the detected SIMD implementation

use anyhow::{Context, Result};
use clap::ArgMatches;
use qlut::config::TransformConfig;
use qlut::quantize::{build_activation_table, Activation, QuantParams};
use qlut::{file_ops, lookup};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = qlut::parse_args();

    match matches.subcommand() {
        Some(("apply", sub)) => run_apply(sub),
        Some(("build", sub)) => run_build(sub),
        Some(("info", _)) => {
            run_info();
            Ok(())
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing --{}", name.replace('_', "-")))
}

fn parse_value<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = required(matches, name)?;
    raw.parse()
        .with_context(|| format!("Invalid value for --{}: {}", name.replace('_', "-"), raw))
}

fn run_apply(matches: &ArgMatches) -> Result<()> {
    let table_path = Path::new(required(matches, "table")?);
    let input = Path::new(required(matches, "input")?);
    let output = Path::new(required(matches, "output")?);

    let config = TransformConfig::from_args(matches)?;
    let table = file_ops::read_table(table_path)
        .with_context(|| format!("Failed to load table {}", table_path.display()))?;

    let bytes = file_ops::transform_file(&table, input, output, &config)
        .with_context(|| format!("Failed to transform {}", input.display()))?;

    println!("Transformed {} bytes -> {}", bytes, output.display());
    Ok(())
}

fn run_build(matches: &ArgMatches) -> Result<()> {
    let mut activation: Activation = parse_value(matches, "activation")?;
    if matches.contains_id("alpha") {
        activation = activation.with_alpha(parse_value(matches, "alpha")?);
    }
    if matches.contains_id("beta") {
        activation = activation.with_beta(parse_value(matches, "beta")?);
    }

    let input = QuantParams::new(
        parse_value(matches, "in_scale")?,
        parse_value(matches, "in_zero_point")?,
    )?;
    let output = QuantParams::new(
        parse_value(matches, "out_scale")?,
        parse_value(matches, "out_zero_point")?,
    )?;

    let table = build_activation_table(activation, &input, &output);
    let path = Path::new(required(matches, "output")?);
    file_ops::write_table(path, &table)
        .with_context(|| format!("Failed to write table {}", path.display()))?;

    println!("Wrote {} table to {}", activation, path.display());
    Ok(())
}

fn run_info() {
    let detected = lookup::simd_level();
    println!("Detected: {}", detected);
    for level in lookup::SimdLevel::supported() {
        println!("  {:<9} {} bytes/iteration", level.name(), level.chunk_width());
    }
}
