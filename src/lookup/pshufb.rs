//! PSHUFB-based 256-entry byte lookup for x86_64
//!
//! ## Technique
//!
//! **Key insight**: PSHUFB can only address a 16-entry table. We have a 256-entry table.
//! **Solution**: Split the table into sixteen 16-entry windows and fold one lookup
//! per window into a single accumulator.
//!
//! For window K (covering indices `[16K, 16K + 15]`):
//! 1. `looked = pshufb(lut[K], idx & 0x0F)`
//! 2. `in_range = (idx & 0xF0) == 16K`, i.e. the shifted index `idx - 16K` is in `[0, 16)`
//! 3. `acc = (in_range & looked) | (!in_range & acc)`
//!
//! Window 0 seeds the accumulator with zero in every lane it does not own. The
//! merge is an explicit masked select, so no lane is ever written by a window
//! that does not contain its index.
//!
//! ## Widths
//!
//! - SSSE3: 16 bytes per chunk
//! - AVX2: 32 bytes per chunk, windows broadcast to both 128-bit lanes
//!
//! The tail is staged through a zero-padded stack buffer and written back with
//! 16/8/4/2/1-byte stores, so nothing past `len` is ever touched.

use crate::table::TABLE_SIZE;
use std::arch::x86_64::*;
use std::ptr;

/// Bytes processed per SSSE3 chunk
pub const SSE_WIDTH: usize = 16;

/// Bytes processed per AVX2 chunk
pub const AVX2_WIDTH: usize = 32;

const WINDOWS: usize = TABLE_SIZE / 16;

pub fn has_ssse3() -> bool {
    is_x86_feature_detected!("ssse3")
}

pub fn has_avx2() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3")
}

#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn load_windows_128(table: &[u8; TABLE_SIZE]) -> [__m128i; WINDOWS] {
    let mut luts = [_mm_setzero_si128(); WINDOWS];
    for (k, lut) in luts.iter_mut().enumerate() {
        *lut = _mm_loadu_si128(table.as_ptr().add(16 * k) as *const __m128i);
    }
    luts
}

#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn lookup_chunk_128(luts: &[__m128i; WINDOWS], idx: __m128i) -> __m128i {
    let mask_0x0f = _mm_set1_epi8(0x0F);
    let lo_nib = _mm_and_si128(idx, mask_0x0f);
    let hi_nib = _mm_andnot_si128(mask_0x0f, idx);

    let in_range = _mm_cmpeq_epi8(hi_nib, _mm_setzero_si128());
    let mut acc = _mm_and_si128(in_range, _mm_shuffle_epi8(luts[0], lo_nib));

    for (k, lut) in luts.iter().enumerate().skip(1) {
        let in_range = _mm_cmpeq_epi8(hi_nib, _mm_set1_epi8(((k as u8) << 4) as i8));
        let looked = _mm_shuffle_epi8(*lut, lo_nib);
        acc = _mm_or_si128(
            _mm_and_si128(in_range, looked),
            _mm_andnot_si128(in_range, acc),
        );
    }

    acc
}

/// Store the low `n` (< 16) bytes of `v` with width-decreasing stores
#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn store_partial_128(mut dst: *mut u8, mut v: __m128i, n: usize) {
    if n & 8 != 0 {
        _mm_storel_epi64(dst as *mut __m128i, v);
        dst = dst.add(8);
        v = _mm_srli_si128::<8>(v);
    }
    if n & 4 != 0 {
        (dst as *mut i32).write_unaligned(_mm_cvtsi128_si32(v));
        dst = dst.add(4);
        v = _mm_srli_si128::<4>(v);
    }
    if n & 2 != 0 {
        (dst as *mut u16).write_unaligned(_mm_cvtsi128_si32(v) as u16);
        dst = dst.add(2);
        v = _mm_srli_si128::<2>(v);
    }
    if n & 1 != 0 {
        *dst = _mm_cvtsi128_si32(v) as u8;
    }
}

/// SSSE3 lookup: `dst[i] = table[src[i]]` for `i < len`, 16 bytes per iteration
///
/// # Safety
/// - Requires SSSE3 CPU support. Caller must check before calling.
/// - `src` must be valid for reads and `dst` valid for writes of `len` bytes.
/// - The regions must either be identical or not overlap at all.
#[target_feature(enable = "ssse3")]
pub unsafe fn lookup_ssse3(table: &[u8; TABLE_SIZE], src: *const u8, dst: *mut u8, len: usize) {
    let luts = load_windows_128(table);

    let mut pos = 0;
    while pos + SSE_WIDTH <= len {
        let idx = _mm_loadu_si128(src.add(pos) as *const __m128i);
        let result = lookup_chunk_128(&luts, idx);
        _mm_storeu_si128(dst.add(pos) as *mut __m128i, result);
        pos += SSE_WIDTH;
    }

    let remaining = len - pos;
    if remaining > 0 {
        let mut tail = [0u8; SSE_WIDTH];
        ptr::copy_nonoverlapping(src.add(pos), tail.as_mut_ptr(), remaining);
        let idx = _mm_loadu_si128(tail.as_ptr() as *const __m128i);
        let result = lookup_chunk_128(&luts, idx);
        store_partial_128(dst.add(pos), result, remaining);
    }
}

#[inline]
#[target_feature(enable = "avx2", enable = "ssse3")]
unsafe fn load_windows_256(table: &[u8; TABLE_SIZE]) -> [__m256i; WINDOWS] {
    let mut luts = [_mm256_setzero_si256(); WINDOWS];
    for (k, lut) in luts.iter_mut().enumerate() {
        // PSHUFB shuffles within each 128-bit lane, so both lanes need the window
        *lut = _mm256_broadcastsi128_si256(_mm_loadu_si128(
            table.as_ptr().add(16 * k) as *const __m128i
        ));
    }
    luts
}

#[inline]
#[target_feature(enable = "avx2", enable = "ssse3")]
unsafe fn lookup_chunk_256(luts: &[__m256i; WINDOWS], idx: __m256i) -> __m256i {
    let mask_0x0f = _mm256_set1_epi8(0x0F);
    let lo_nib = _mm256_and_si256(idx, mask_0x0f);
    let hi_nib = _mm256_andnot_si256(mask_0x0f, idx);

    let in_range = _mm256_cmpeq_epi8(hi_nib, _mm256_setzero_si256());
    let mut acc = _mm256_and_si256(in_range, _mm256_shuffle_epi8(luts[0], lo_nib));

    for (k, lut) in luts.iter().enumerate().skip(1) {
        let in_range = _mm256_cmpeq_epi8(hi_nib, _mm256_set1_epi8(((k as u8) << 4) as i8));
        let looked = _mm256_shuffle_epi8(*lut, lo_nib);
        acc = _mm256_or_si256(
            _mm256_and_si256(in_range, looked),
            _mm256_andnot_si256(in_range, acc),
        );
    }

    acc
}

/// AVX2 lookup: `dst[i] = table[src[i]]` for `i < len`, 32 bytes per iteration
///
/// # Safety
/// - Requires AVX2 and SSSE3 CPU support. Caller must check before calling.
/// - `src` must be valid for reads and `dst` valid for writes of `len` bytes.
/// - The regions must either be identical or not overlap at all.
#[target_feature(enable = "avx2", enable = "ssse3")]
pub unsafe fn lookup_avx2(table: &[u8; TABLE_SIZE], src: *const u8, dst: *mut u8, len: usize) {
    let luts = load_windows_256(table);

    let mut pos = 0;
    while pos + AVX2_WIDTH <= len {
        let idx = _mm256_loadu_si256(src.add(pos) as *const __m256i);
        let result = lookup_chunk_256(&luts, idx);
        _mm256_storeu_si256(dst.add(pos) as *mut __m256i, result);
        pos += AVX2_WIDTH;
    }

    let remaining = len - pos;
    if remaining > 0 {
        let mut tail = [0u8; AVX2_WIDTH];
        ptr::copy_nonoverlapping(src.add(pos), tail.as_mut_ptr(), remaining);
        let idx = _mm256_loadu_si256(tail.as_ptr() as *const __m256i);
        let result = lookup_chunk_256(&luts, idx);

        let mut out = dst.add(pos);
        let mut half = _mm256_castsi256_si128(result);
        if remaining & 16 != 0 {
            _mm_storeu_si128(out as *mut __m128i, half);
            out = out.add(16);
            half = _mm256_extracti128_si256::<1>(result);
        }
        store_partial_128(out, half, remaining & 15);
    }
}
