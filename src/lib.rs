//! Fast 256-entry byte lookup-table transforms for quantized `u8` data
//!
//! The core operation is `output[i] = table[input[i]]`, used to apply a
//! precomputed quantization re-mapping (for example a quantized activation)
//! to a flat byte buffer. SIMD kernels emulate the 256-entry lookup with the
//! narrower native table-lookup instructions and are bit-identical to the
//! scalar fallback.
//!
//! - [`lookup`] - dispatch, safe API and the kernels
//! - [`table`] - the [`LookupTable`] type
//! - [`quantize`] - building tables from scale/zero-point parameters
//! - [`config`] - parallel transform configuration
//! - [`file_ops`] - tables and transforms on files

pub mod args;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod lookup;
pub mod quantize;
pub mod table;

pub use args::parse_args;
pub use config::TransformConfig;
pub use error::{LutError, LutResult};
pub use lookup::{
    detect_simd_support, simd_level, transform, transform_in_place, transform_parallel,
    try_transform, SimdLevel,
};
pub use table::LookupTable;
