//! Reading tables and applying them to files

use crate::config::TransformConfig;
use crate::error::LutResult;
use crate::lookup::transform_in_place_parallel;
use crate::table::LookupTable;
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Load a table from a file holding exactly 256 raw bytes
pub fn read_table(path: &Path) -> LutResult<LookupTable> {
    let bytes = fs::read(path)?;
    let table = LookupTable::from_bytes(&bytes)?;
    debug!("Loaded lookup table from {}", path.display());
    Ok(table)
}

/// Write a table as 256 raw bytes
pub fn write_table(path: &Path, table: &LookupTable) -> LutResult<()> {
    fs::write(path, table.as_bytes())?;
    Ok(())
}

/// Apply `table` to every byte of `input` and write the result to `output`
///
/// Returns the number of bytes transformed. `input` and `output` may name
/// the same file.
pub fn transform_file(
    table: &LookupTable,
    input: &Path,
    output: &Path,
    config: &TransformConfig,
) -> LutResult<usize> {
    let mut buf = fs::read(input)?;
    transform_in_place_parallel(table, &mut buf, config);
    fs::write(output, &buf)?;

    info!(
        "Transformed {} bytes: {} -> {}",
        buf.len(),
        input.display(),
        output.display()
    );
    Ok(buf.len())
}
