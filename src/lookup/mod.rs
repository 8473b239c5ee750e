//! Byte lookup-table transform: `output[i] = table[input[i]]`
//!
//! Provides platform-specific SIMD implementations with dispatch resolved once
//! per process:
//! - x86_64: PSHUFB (AVX2 → SSSE3) → scalar
//! - aarch64: NEON TBL/TBX → scalar
//! - Other: scalar
//!
//! All paths are bit-identical to [`scalar::lookup_scalar_raw`], which defines
//! the semantics.
//!
//! ## In-place operation
//!
//! Every kernel loads a whole chunk before storing it and stages the tail
//! through a stack buffer, so [`transform_in_place`] is supported on all paths.
//!
//! ## Example
//!
//! ```rust
//! use qlut::lookup::transform;
//! use qlut::table::LookupTable;
//!
//! let table = LookupTable::from_fn(|b| b / 2);
//! let input = [0u8, 10, 200, 255];
//! let mut output = [0u8; 4];
//! transform(&table, &input, &mut output);
//! assert_eq!(output, [0, 5, 100, 127]);
//! ```

#[cfg(target_arch = "aarch64")]
pub mod neon;
#[cfg(target_arch = "x86_64")]
pub mod pshufb;
pub mod scalar;
pub mod windowed;

use crate::config::TransformConfig;
use crate::error::{LutError, LutResult};
use crate::table::{LookupTable, TABLE_SIZE};
use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

// Global SIMD level detection (done once at first use)
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Lookup implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdLevel {
    /// No SIMD, use the scalar loop
    None,
    /// Lane-array emulation of the windowed algorithm (any target)
    Portable,
    /// x86_64 SSSE3 (128-bit PSHUFB)
    Ssse3,
    /// x86_64 AVX2 (256-bit PSHUFB)
    Avx2,
    /// aarch64 NEON (TBL/TBX over 64-entry windows)
    Neon,
}

impl SimdLevel {
    pub const ALL: [SimdLevel; 5] = [
        SimdLevel::None,
        SimdLevel::Portable,
        SimdLevel::Ssse3,
        SimdLevel::Avx2,
        SimdLevel::Neon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SimdLevel::None => "scalar",
            SimdLevel::Portable => "portable",
            SimdLevel::Ssse3 => "ssse3",
            SimdLevel::Avx2 => "avx2",
            SimdLevel::Neon => "neon",
        }
    }

    /// Bytes consumed per vector iteration (the scalar loop batches 4)
    pub fn chunk_width(self) -> usize {
        match self {
            SimdLevel::None => 4,
            SimdLevel::Portable => windowed::LANES,
            SimdLevel::Ssse3 | SimdLevel::Neon => 16,
            SimdLevel::Avx2 => 32,
        }
    }

    /// Whether this level can run on the current CPU
    pub fn is_supported(self) -> bool {
        match self {
            SimdLevel::None | SimdLevel::Portable => true,
            SimdLevel::Ssse3 => has_ssse3(),
            SimdLevel::Avx2 => has_avx2(),
            SimdLevel::Neon => cfg!(target_arch = "aarch64"),
        }
    }

    /// All levels that can run on the current CPU
    pub fn supported() -> Vec<SimdLevel> {
        Self::ALL.into_iter().filter(|l| l.is_supported()).collect()
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimdLevel {
    type Err = LutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" | "none" => Ok(SimdLevel::None),
            "portable" => Ok(SimdLevel::Portable),
            "ssse3" => Ok(SimdLevel::Ssse3),
            "avx2" => Ok(SimdLevel::Avx2),
            "neon" => Ok(SimdLevel::Neon),
            _ => Err(LutError::UnknownSimdLevel(s.to_string())),
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn has_ssse3() -> bool {
    pshufb::has_ssse3()
}

#[cfg(not(target_arch = "x86_64"))]
fn has_ssse3() -> bool {
    false
}

#[cfg(target_arch = "x86_64")]
fn has_avx2() -> bool {
    pshufb::has_avx2()
}

#[cfg(not(target_arch = "x86_64"))]
fn has_avx2() -> bool {
    false
}

/// Detect the best lookup implementation for the current CPU
///
/// # Platform-specific behavior:
/// - **x86_64**: AVX2, then SSSE3. The portable emulation is slower than scalar here.
/// - **aarch64**: NEON
/// - **Other**: scalar
pub fn detect_simd_support() -> SimdLevel {
    if has_avx2() {
        return SimdLevel::Avx2;
    }
    if has_ssse3() {
        return SimdLevel::Ssse3;
    }
    if cfg!(target_arch = "aarch64") {
        return SimdLevel::Neon;
    }
    SimdLevel::None
}

/// The detected level, cached after the first call
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| {
        let level = detect_simd_support();
        debug!("Byte lookup dispatch: {}", level);
        level
    })
}

/// Run the kernel for `level`, falling back to scalar if the CPU lacks it
///
/// # Safety
/// - `src` must be valid for reads and `dst` valid for writes of `len` bytes
/// - The regions must either be identical or not overlap at all
unsafe fn run_kernel(
    level: SimdLevel,
    table: &[u8; TABLE_SIZE],
    src: *const u8,
    dst: *mut u8,
    len: usize,
) {
    if len == 0 {
        return;
    }

    match level {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if has_avx2() => pshufb::lookup_avx2(table, src, dst, len),
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Ssse3 if has_ssse3() => pshufb::lookup_ssse3(table, src, dst, len),
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon => neon::lookup_neon(table, src, dst, len),
        SimdLevel::Portable => windowed::lookup_windowed(table, src, dst, len),
        _ => scalar::lookup_scalar_raw(table, src, dst, len),
    }
}

#[inline]
#[track_caller]
fn assert_same_len(input: usize, output: usize) {
    assert_eq!(
        input, output,
        "lookup output length {} does not match input length {}",
        output, input
    );
}

/// Apply `table` to `input`, writing `output[i] = table[input[i]]`
///
/// Uses the fastest implementation for this CPU.
///
/// # Panics
/// Panics if `output.len() != input.len()`.
pub fn transform(table: &LookupTable, input: &[u8], output: &mut [u8]) {
    transform_with_level(simd_level(), table, input, output);
}

/// Like [`transform`], but reports a length mismatch instead of panicking
pub fn try_transform(table: &LookupTable, input: &[u8], output: &mut [u8]) -> LutResult<()> {
    if input.len() != output.len() {
        return Err(LutError::LengthMismatch {
            input: input.len(),
            output: output.len(),
        });
    }
    transform(table, input, output);
    Ok(())
}

/// Apply `table` to `buf` in place
pub fn transform_in_place(table: &LookupTable, buf: &mut [u8]) {
    transform_in_place_with_level(simd_level(), table, buf);
}

/// Apply `table` with a specific implementation
///
/// A level the current CPU cannot run falls back to scalar.
///
/// # Panics
/// Panics if `output.len() != input.len()`.
pub fn transform_with_level(
    level: SimdLevel,
    table: &LookupTable,
    input: &[u8],
    output: &mut [u8],
) {
    assert_same_len(input.len(), output.len());
    // SAFETY: both slices are valid for `input.len()` bytes and, being a shared
    // and a mutable borrow, cannot overlap.
    unsafe {
        run_kernel(
            level,
            table.as_bytes(),
            input.as_ptr(),
            output.as_mut_ptr(),
            input.len(),
        );
    }
}

/// In-place variant of [`transform_with_level`]
pub fn transform_in_place_with_level(level: SimdLevel, table: &LookupTable, buf: &mut [u8]) {
    let ptr = buf.as_mut_ptr();
    // SAFETY: identical source and destination regions are supported by every kernel
    unsafe { run_kernel(level, table.as_bytes(), ptr, ptr, buf.len()) };
}

// Worker pools keyed by thread count, built on first use
static POOLS: OnceLock<Mutex<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();

/// Shared `threads`-thread pool, or `None` if it cannot be built
fn pool_for(threads: usize) -> Option<Arc<ThreadPool>> {
    let pools = POOLS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut pools = pools.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(pool) = pools.get(&threads) {
        return Some(Arc::clone(pool));
    }

    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => {
            debug!("Built {}-thread lookup pool", threads);
            let pool = Arc::new(pool);
            pools.insert(threads, Arc::clone(&pool));
            Some(pool)
        }
        Err(err) => {
            warn!(
                "Could not build a {}-thread pool ({}), using the global pool",
                threads, err
            );
            None
        }
    }
}

/// Run `job` on a `threads`-thread pool
///
/// The global pool is used directly when it already has `threads` workers.
fn with_pool<F: FnOnce() + Send>(threads: usize, job: F) {
    if threads == rayon::current_num_threads() {
        return job();
    }
    match pool_for(threads) {
        Some(pool) => pool.install(job),
        None => job(),
    }
}

/// Apply `table` across a rayon thread pool
///
/// The buffer is split into `config.chunk_size` pieces. Buffers no larger than
/// one chunk, single-thread configs and `parallel == false` run on the calling
/// thread. Output is identical to [`transform`].
///
/// # Panics
/// Panics if `output.len() != input.len()`.
pub fn transform_parallel(
    table: &LookupTable,
    input: &[u8],
    output: &mut [u8],
    config: &TransformConfig,
) {
    assert_same_len(input.len(), output.len());
    let level = config.level.unwrap_or_else(simd_level);
    let chunk_size = config.chunk_size.max(1);
    let threads = config.effective_threads();

    if threads <= 1 || input.len() <= chunk_size {
        transform_with_level(level, table, input, output);
        return;
    }

    debug!(
        "Parallel lookup: {} bytes, {} threads, {}-byte chunks, {}",
        input.len(),
        threads,
        chunk_size,
        level
    );

    with_pool(threads, move || {
        input
            .par_chunks(chunk_size)
            .zip(output.par_chunks_mut(chunk_size))
            .for_each(|(src, dst)| transform_with_level(level, table, src, dst));
    });
}

/// In-place variant of [`transform_parallel`]
pub fn transform_in_place_parallel(table: &LookupTable, buf: &mut [u8], config: &TransformConfig) {
    let level = config.level.unwrap_or_else(simd_level);
    let chunk_size = config.chunk_size.max(1);
    let threads = config.effective_threads();

    if threads <= 1 || buf.len() <= chunk_size {
        transform_in_place_with_level(level, table, buf);
        return;
    }

    with_pool(threads, move || {
        buf.par_chunks_mut(chunk_size)
            .for_each(|chunk| transform_in_place_with_level(level, table, chunk));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_simd_support_returns_supported_level() {
        let level = detect_simd_support();
        assert!(level.is_supported());

        #[cfg(target_arch = "x86_64")]
        {
            // On x86_64 the portable emulation is never chosen automatically
            assert_ne!(level, SimdLevel::Portable);
            assert_ne!(level, SimdLevel::Neon);
        }

        #[cfg(target_arch = "aarch64")]
        assert_eq!(level, SimdLevel::Neon);
    }

    #[test]
    fn simd_level_is_cached() {
        assert_eq!(simd_level(), simd_level());
        assert_eq!(simd_level(), detect_simd_support());
    }

    #[test]
    fn simd_level_names_round_trip() {
        for level in SimdLevel::ALL {
            assert_eq!(level.name().parse::<SimdLevel>().unwrap(), level);
        }
        assert_eq!("NONE".parse::<SimdLevel>().unwrap(), SimdLevel::None);
        assert!(matches!(
            "avx512".parse::<SimdLevel>(),
            Err(LutError::UnknownSimdLevel(_))
        ));
    }

    #[test]
    fn scalar_and_portable_always_supported() {
        let supported = SimdLevel::supported();
        assert!(supported.contains(&SimdLevel::None));
        assert!(supported.contains(&SimdLevel::Portable));
    }

    #[test]
    fn unsupported_level_falls_back_to_scalar() {
        let table = LookupTable::from_fn(|b| b ^ 0xFF);
        let input: Vec<u8> = (0..50).collect();
        for level in SimdLevel::ALL {
            let mut output = vec![0u8; input.len()];
            transform_with_level(level, &table, &input, &mut output);
            for (x, y) in input.iter().zip(&output) {
                assert_eq!(*y, x ^ 0xFF, "{}", level);
            }
        }
    }

    #[test]
    #[should_panic(expected = "does not match input length")]
    fn transform_panics_on_length_mismatch() {
        let table = LookupTable::identity();
        let mut output = [0u8; 3];
        transform(&table, &[1, 2, 3, 4], &mut output);
    }

    #[test]
    fn try_transform_reports_length_mismatch() {
        let table = LookupTable::identity();
        let mut output = [0u8; 3];
        let err = try_transform(&table, &[1, 2, 3, 4], &mut output).unwrap_err();
        assert!(matches!(
            err,
            LutError::LengthMismatch {
                input: 4,
                output: 3
            }
        ));
        assert_eq!(output, [0, 0, 0]);
    }

    #[test]
    fn worker_pools_are_reused() {
        let first = pool_for(5).unwrap();
        let second = pool_for(5).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.current_num_threads(), 5);

        let other = pool_for(6).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn repeated_parallel_calls_share_one_pool() {
        let table = LookupTable::from_fn(|b| b.rotate_left(3));
        let input: Vec<u8> = (0..20_000).map(|i| (i * 7) as u8).collect();
        let expected: Vec<u8> = input.iter().map(|&b| b.rotate_left(3)).collect();
        let config = TransformConfig::new(7, true).with_chunk_size(1024);

        let pool = pool_for(7).unwrap();
        for _ in 0..200 {
            let mut output = vec![0u8; input.len()];
            transform_parallel(&table, &input, &mut output, &config);
            assert_eq!(output, expected);
        }
        assert!(Arc::ptr_eq(&pool, &pool_for(7).unwrap()));
    }

    #[test]
    fn zero_length_is_a_no_op() {
        let table = LookupTable::constant(9);
        let input: [u8; 0] = [];
        let mut output: [u8; 0] = [];
        for level in SimdLevel::ALL {
            transform_with_level(level, &table, &input, &mut output);
            transform_in_place_with_level(level, &table, &mut output);
        }
    }
}
