//! Bit-packing of window accumulators
//!
//! Each group of 8 accumulator entries becomes one byte, most significant
//! bit first. An entry packs to 1 only if its sum is strictly positive;
//! zero and negative sums both pack to 0.
//!
//! # Example
//!
//! ```
//! use kmer_signatures::operations::packing::pack_signature;
//!
//! let sums = [3, 0, -1, 1, 0, 0, 0, 7];
//! assert_eq!(pack_signature(&sums), vec![0b1001_0001]);
//! ```

/// Pack `sums` into `sums.len() / 8` bytes
///
/// `sums.len()` must be a multiple of 8; a trailing partial group is ignored.
pub fn pack_signature(sums: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(sums.len() / 8);
    pack_signature_into(sums, &mut out);
    out
}

/// Append the packed form of `sums` to `out`
#[inline]
pub fn pack_signature_into(sums: &[i32], out: &mut Vec<u8>) {
    debug_assert_eq!(sums.len() % 8, 0);
    out.extend(sums.chunks_exact(8).map(|group| {
        group
            .iter()
            .enumerate()
            .fold(0u8, |byte, (j, &sum)| byte | (((sum > 0) as u8) << (7 - j)))
    }));
}

/// Number of differing bits between two packed signatures
///
/// The comparison primitive for downstream similarity search. Signatures
/// must have equal length.
///
/// ```
/// use kmer_signatures::operations::packing::hamming_distance;
///
/// assert_eq!(hamming_distance(&[0b1010_0000, 0xFF], &[0b0010_0000, 0x0F]), 5);
/// ```
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}
