//! ARM NEON 256-entry byte lookup
//!
//! Uses the four-register table lookup instructions, which address a 64-entry
//! table held in a `uint8x16x4_t`:
//! - `vqtbl4q_u8` (TBL): out-of-range lanes become 0
//! - `vqtbx4q_u8` (TBX): out-of-range lanes keep the destination value
//!
//! The table is split into four 64-entry windows. Window 0 seeds the
//! accumulator with TBL, then windows 1..3 are merged with TBX using the index
//! shifted down by 64 per step. Every step writes into the same accumulator;
//! TBX's preserve semantics are what make the four partial lookups add up to
//! one 256-entry lookup.

use crate::table::{TABLE_SIZE, WINDOW_COUNT, WINDOW_SIZE};
use std::arch::aarch64::*;
use std::ptr;

/// Bytes processed per chunk
pub const WIDTH: usize = 16;

#[inline(always)]
unsafe fn lookup_chunk(luts: &[uint8x16x4_t; WINDOW_COUNT], idx: uint8x16_t) -> uint8x16_t {
    let v64 = vdupq_n_u8(WINDOW_SIZE as u8);

    let mut acc = vqtbl4q_u8(luts[0], idx);
    let mut shifted = idx;
    for lut in &luts[1..] {
        shifted = vsubq_u8(shifted, v64);
        acc = vqtbx4q_u8(acc, *lut, shifted);
    }

    acc
}

/// Store the low `n` (< 16) bytes of `v` with 8/4/2/1-byte stores
#[inline(always)]
unsafe fn store_partial(mut dst: *mut u8, v: uint8x16_t, n: usize) {
    let mut half = vget_low_u8(v);
    if n & 8 != 0 {
        vst1_u8(dst, half);
        dst = dst.add(8);
        half = vget_high_u8(v);
    }
    if n & 4 != 0 {
        (dst as *mut u32).write_unaligned(vget_lane_u32::<0>(vreinterpret_u32_u8(half)));
        dst = dst.add(4);
        half = vext_u8::<4>(half, half);
    }
    if n & 2 != 0 {
        (dst as *mut u16).write_unaligned(vget_lane_u16::<0>(vreinterpret_u16_u8(half)));
        dst = dst.add(2);
        half = vext_u8::<2>(half, half);
    }
    if n & 1 != 0 {
        *dst = vget_lane_u8::<0>(half);
    }
}

/// NEON lookup: `dst[i] = table[src[i]]` for `i < len`, 16 bytes per iteration
///
/// # Safety
/// - Requires NEON (present on all aarch64 targets)
/// - `src` must be valid for reads and `dst` valid for writes of `len` bytes
/// - The regions must either be identical or not overlap at all
#[target_feature(enable = "neon")]
pub unsafe fn lookup_neon(table: &[u8; TABLE_SIZE], src: *const u8, dst: *mut u8, len: usize) {
    let t = table.as_ptr();
    let luts = [
        vld1q_u8_x4(t),
        vld1q_u8_x4(t.add(WINDOW_SIZE)),
        vld1q_u8_x4(t.add(2 * WINDOW_SIZE)),
        vld1q_u8_x4(t.add(3 * WINDOW_SIZE)),
    ];

    let mut pos = 0;
    while pos + WIDTH <= len {
        let idx = vld1q_u8(src.add(pos));
        vst1q_u8(dst.add(pos), lookup_chunk(&luts, idx));
        pos += WIDTH;
    }

    let remaining = len - pos;
    if remaining > 0 {
        let mut tail = [0u8; WIDTH];
        ptr::copy_nonoverlapping(src.add(pos), tail.as_mut_ptr(), remaining);
        let result = lookup_chunk(&luts, vld1q_u8(tail.as_ptr()));
        store_partial(dst.add(pos), result, remaining);
    }
}
