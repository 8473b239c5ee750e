//! Portable emulation of the windowed vector lookup
//!
//! Runs the same algorithm as the NEON kernel (four 64-entry windows folded
//! into one accumulator) on plain lane arrays, so the window/merge logic can be
//! exercised on every target. Each merge step is an explicit masked select
//! rather than a hardware preserve-if-out-of-range lookup.
//!
//! # Performance Note
//! On x86_64 this is slower than the scalar loop and is never auto-selected.
//! It can still be forced with `SimdLevel::Portable` for testing and benchmarks.

use crate::table::{TABLE_SIZE, WINDOW_COUNT, WINDOW_SIZE};
use std::ptr;

/// Bytes processed per chunk
pub const LANES: usize = 16;

type Lanes = [u8; LANES];

/// Lane-wise `mask ? new : old`, with `mask` lanes being 0x00 or 0xFF
#[inline(always)]
fn select(mask: &Lanes, new: &Lanes, old: &Lanes) -> Lanes {
    std::array::from_fn(|i| (mask[i] & new[i]) | (!mask[i] & old[i]))
}

/// 0xFF for lanes whose index addresses a window, 0x00 otherwise
#[inline(always)]
fn in_window(idx: &Lanes) -> Lanes {
    idx.map(|i| if (i as usize) < WINDOW_SIZE { 0xFF } else { 0x00 })
}

/// Look up each lane in a 64-entry window; out-of-range lanes read an
/// arbitrary entry and must be masked by the caller
#[inline(always)]
fn gather(window: &[u8], idx: &Lanes) -> Lanes {
    idx.map(|i| window[i as usize & (WINDOW_SIZE - 1)])
}

#[inline(always)]
fn sub_lanes(idx: &Lanes, offset: u8) -> Lanes {
    idx.map(|i| i.wrapping_sub(offset))
}

/// Full 256-entry lookup of one chunk by folding four window lookups
#[inline(always)]
fn lookup_chunk(table: &[u8; TABLE_SIZE], idx: &Lanes) -> Lanes {
    let zero = [0u8; LANES];
    let mut acc = select(&in_window(idx), &gather(&table[..WINDOW_SIZE], idx), &zero);

    for k in 1..WINDOW_COUNT {
        let start = k * WINDOW_SIZE;
        let shifted = sub_lanes(idx, start as u8);
        let looked = gather(&table[start..start + WINDOW_SIZE], &shifted);
        acc = select(&in_window(&shifted), &looked, &acc);
    }

    acc
}

/// Store the first `n` (< 16) bytes of `chunk` using 8/4/2/1-byte stores
#[inline(always)]
unsafe fn store_prefix(dst: *mut u8, chunk: &Lanes, n: usize) {
    let mut offset = 0;
    for width in [8, 4, 2, 1] {
        if n & width != 0 {
            ptr::copy_nonoverlapping(chunk.as_ptr().add(offset), dst.add(offset), width);
            offset += width;
        }
    }
}

/// Windowed lookup over raw pointers: `dst[i] = table[src[i]]` for `i < len`
///
/// Each chunk is fully loaded before it is stored, and the tail is staged
/// through a zero-padded scratch buffer, so `src == dst` is allowed.
///
/// # Safety
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The regions must either be identical or not overlap at all
pub unsafe fn lookup_windowed(table: &[u8; TABLE_SIZE], src: *const u8, dst: *mut u8, len: usize) {
    let mut pos = 0;

    while pos + LANES <= len {
        let mut idx = [0u8; LANES];
        ptr::copy_nonoverlapping(src.add(pos), idx.as_mut_ptr(), LANES);
        let result = lookup_chunk(table, &idx);
        ptr::copy_nonoverlapping(result.as_ptr(), dst.add(pos), LANES);
        pos += LANES;
    }

    let remaining = len - pos;
    if remaining > 0 {
        let mut scratch = [0u8; LANES];
        ptr::copy_nonoverlapping(src.add(pos), scratch.as_mut_ptr(), remaining);
        let result = lookup_chunk(table, &scratch);
        store_prefix(dst.add(pos), &result, remaining);
    }
}
