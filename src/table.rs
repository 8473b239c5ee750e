//! 256-entry byte lookup tables
//!
//! A [`LookupTable`] always holds exactly one entry per byte value, so any input
//! byte is a valid index and the kernels never need a bounds check.
//!
//! ```rust
//! use qlut::table::LookupTable;
//!
//! let invert = LookupTable::from_fn(|b| 255 - b);
//! let mut out = [0u8; 3];
//! invert.apply(&[0, 1, 255], &mut out);
//! assert_eq!(out, [255, 254, 0]);
//! ```

use crate::error::{LutError, LutResult};
use std::fmt;
use std::ops::Index;

/// Number of entries in every lookup table
pub const TABLE_SIZE: usize = 256;

/// Width of one window as addressed by a 4-register NEON `TBL`/`TBX`
pub const WINDOW_SIZE: usize = 64;

/// Number of 64-entry windows in a full table
pub const WINDOW_COUNT: usize = TABLE_SIZE / WINDOW_SIZE;

/// Immutable byte-to-byte mapping covering all 256 byte values
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LookupTable {
    entries: [u8; TABLE_SIZE],
}

impl LookupTable {
    pub const fn new(entries: [u8; TABLE_SIZE]) -> Self {
        Self { entries }
    }

    /// Table mapping every byte to itself
    pub fn identity() -> Self {
        Self::from_fn(|b| b)
    }

    /// Table mapping every byte to `value`
    pub const fn constant(value: u8) -> Self {
        Self::new([value; TABLE_SIZE])
    }

    /// Build a table by evaluating `f` for each byte value 0..=255 in order
    pub fn from_fn<F: FnMut(u8) -> u8>(mut f: F) -> Self {
        let mut entries = [0u8; TABLE_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = f(i as u8);
        }
        Self { entries }
    }

    /// Build a table from raw bytes, which must be exactly 256 long
    pub fn from_bytes(bytes: &[u8]) -> LutResult<Self> {
        let entries: [u8; TABLE_SIZE] = bytes
            .try_into()
            .map_err(|_| LutError::TableLength(bytes.len()))?;
        Ok(Self { entries })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; TABLE_SIZE] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, index: u8) -> u8 {
        self.entries[index as usize]
    }

    /// The `k`-th 64-entry window, covering indices `[64k, 64k + 63]`
    ///
    /// # Panics
    /// Panics if `k >= WINDOW_COUNT`.
    pub fn window(&self, k: usize) -> &[u8] {
        assert!(k < WINDOW_COUNT, "window index {} out of range", k);
        let start = k * WINDOW_SIZE;
        &self.entries[start..start + WINDOW_SIZE]
    }

    /// Apply this table: `output[i] = self[input[i]]`
    ///
    /// # Panics
    /// Panics if `input` and `output` have different lengths.
    pub fn apply(&self, input: &[u8], output: &mut [u8]) {
        crate::lookup::transform(self, input, output);
    }

    /// Apply this table in place: `buf[i] = self[buf[i]]`
    pub fn apply_in_place(&self, buf: &mut [u8]) {
        crate::lookup::transform_in_place(self, buf);
    }

    /// Compose two tables: the result maps `b` to `next[self[b]]`
    pub fn then(&self, next: &LookupTable) -> LookupTable {
        Self::from_fn(|b| next.get(self.get(b)))
    }
}

impl Default for LookupTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[u8; TABLE_SIZE]> for LookupTable {
    fn from(entries: [u8; TABLE_SIZE]) -> Self {
        Self::new(entries)
    }
}

impl TryFrom<&[u8]> for LookupTable {
    type Error = LutError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl Index<u8> for LookupTable {
    type Output = u8;

    #[inline]
    fn index(&self, index: u8) -> &u8 {
        &self.entries[index as usize]
    }
}

impl AsRef<[u8]> for LookupTable {
    fn as_ref(&self) -> &[u8] {
        &self.entries
    }
}

impl fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 256 entries is too noisy for assertion output; show the window edges
        f.debug_struct("LookupTable")
            .field("first", &&self.entries[..8])
            .field("last", &&self.entries[TABLE_SIZE - 8..])
            .finish_non_exhaustive()
    }
}
