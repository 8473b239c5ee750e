//! Error types for table construction and file operations
//!
//! The transform itself cannot fail; these errors come from the layers around it.

use thiserror::Error;

/// Errors that can occur while building tables or applying them to files
#[derive(Debug, Error)]
pub enum LutError {
    /// Table data did not contain exactly 256 entries
    #[error("Lookup table must have exactly 256 entries, got {0}")]
    TableLength(usize),

    /// Output buffer does not match the input length
    #[error("Output length {output} does not match input length {input}")]
    LengthMismatch { input: usize, output: usize },

    /// Quantization scale is zero, negative or not finite
    #[error("Invalid quantization scale {0}: must be finite and positive")]
    InvalidScale(f32),

    /// Activation name not recognised
    #[error("Unknown activation '{0}'")]
    UnknownActivation(String),

    /// SIMD level name not recognised
    #[error("Unknown SIMD level '{0}'")]
    UnknownSimdLevel(String),

    /// I/O error when reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for results carrying a [`LutError`]
pub type LutResult<T> = Result<T, LutError>;
