//! Scalar byte table lookup
//!
//! This is the reference semantics for every vector kernel and the path used on
//! targets without a supported SIMD instruction set. The 4-wide unroll exists
//! purely for throughput and must never change results.

use crate::table::TABLE_SIZE;

/// Scalar lookup over raw pointers: `dst[i] = table[src[i]]` for `i < len`
///
/// All four bytes of a batch are read before any of them is written, so
/// `src == dst` is allowed.
///
/// # Safety
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The regions must either be identical or not overlap at all
#[inline]
pub unsafe fn lookup_scalar_raw(table: &[u8; TABLE_SIZE], src: *const u8, dst: *mut u8, len: usize) {
    let mut pos = 0;

    while pos + 4 <= len {
        let x0 = *src.add(pos) as usize;
        let x1 = *src.add(pos + 1) as usize;
        let x2 = *src.add(pos + 2) as usize;
        let x3 = *src.add(pos + 3) as usize;

        *dst.add(pos) = table[x0];
        *dst.add(pos + 1) = table[x1];
        *dst.add(pos + 2) = table[x2];
        *dst.add(pos + 3) = table[x3];

        pos += 4;
    }

    while pos < len {
        *dst.add(pos) = table[*src.add(pos) as usize];
        pos += 1;
    }
}

/// Safe scalar lookup; processes `min(input.len(), output.len())` bytes
pub fn lookup_scalar(table: &[u8; TABLE_SIZE], input: &[u8], output: &mut [u8]) {
    let len = input.len().min(output.len());

    let mut in_chunks = input[..len].chunks_exact(4);
    let mut out_chunks = output[..len].chunks_exact_mut(4);

    for (src, dst) in (&mut in_chunks).zip(&mut out_chunks) {
        dst[0] = table[src[0] as usize];
        dst[1] = table[src[1] as usize];
        dst[2] = table[src[2] as usize];
        dst[3] = table[src[3] as usize];
    }

    for (src, dst) in in_chunks
        .remainder()
        .iter()
        .zip(out_chunks.into_remainder())
    {
        *dst = table[*src as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverse_table() -> [u8; TABLE_SIZE] {
        let mut table = [0u8; TABLE_SIZE];
        for (i, v) in table.iter_mut().enumerate() {
            *v = 255 - i as u8;
        }
        table
    }

    #[test]
    fn lookup_scalar_matches_direct_indexing() {
        let table = reverse_table();
        for len in 0..=11 {
            let input: Vec<u8> = (0..len).map(|i| (i * 37) as u8).collect();
            let mut output = vec![0u8; len];
            lookup_scalar(&table, &input, &mut output);

            for (x, y) in input.iter().zip(&output) {
                assert_eq!(*y, 255 - *x, "len {}", len);
            }
        }
    }

    #[test]
    fn lookup_scalar_raw_in_place() {
        let table = reverse_table();
        let mut buf: Vec<u8> = (0..=255u8).collect();
        let ptr = buf.as_mut_ptr();
        unsafe { lookup_scalar_raw(&table, ptr, ptr, buf.len()) };

        for (i, b) in buf.iter().enumerate() {
            assert_eq!(*b, 255 - i as u8);
        }
    }

    #[test]
    fn lookup_scalar_uses_shorter_length() {
        let table = reverse_table();
        let input = [1u8, 2, 3, 4, 5, 6];
        let mut output = [0xAAu8; 4];
        lookup_scalar(&table, &input, &mut output);
        assert_eq!(output, [254, 253, 252, 251]);
    }
}
