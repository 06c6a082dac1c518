//! Sparse ternary projection of a single k-mer
//!
//! Each term is mapped to a vector of length L over {-1, 0, +1} with exactly
//! `non_zero / 2` entries set to +1 and `non_zero / 2` set to -1, all at
//! distinct positions. Positions are drawn by rejection sampling from an
//! [`IsaacRng`] seeded with the term bytes, so the vector is a pure function
//! of the term's content.
//!
//! # Algorithm
//!
//! ```text
//! rng = IsaacRng::from_term(term)
//! repeat until non_zero/2 positives claimed:
//!     pos = rng.next_bounded(L)
//!     if v[pos] == 0: v[pos] = +1
//! repeat until non_zero/2 negatives claimed (same rng stream):
//!     pos = rng.next_bounded(L)
//!     if v[pos] == 0: v[pos] = -1
//! ```
//!
//! # Example
//!
//! ```
//! use kmer_signatures::operations::projection::ProjectionGenerator;
//!
//! let generator = ProjectionGenerator::new(64, 21);
//! let v = generator.generate(b"CST")?;
//!
//! assert_eq!(v.len(), 64);
//! assert_eq!(v.positive_count(), 6);
//! assert_eq!(v.negative_count(), 6);
//! assert_eq!(v, generator.generate(b"CST")?);
//! # Ok::<(), kmer_signatures::SignatureError>(())
//! ```

use crate::error::{Result, SignatureError};
use crate::operations::isaac::IsaacRng;

/// Draws allowed per signature position before giving up
///
/// Far above what any density up to 100% needs (coupon collector on L
/// slots is ~L ln L draws).
pub const DRAWS_PER_POSITION: usize = 4096;

/// Immutable ternary projection of one term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionVector {
    values: Box<[i8]>,
}

impl ProjectionVector {
    /// Signature length L
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a zero-length vector
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in position order
    pub fn as_slice(&self) -> &[i8] {
        &self.values
    }

    /// Number of +1 entries
    pub fn positive_count(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0).count()
    }

    /// Number of -1 entries
    pub fn negative_count(&self) -> usize {
        self.values.iter().filter(|&&v| v < 0).count()
    }

    /// Number of non-zero entries
    pub fn non_zero_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0).count()
    }

    /// Element-wise add into an accumulator of the same length
    #[inline]
    pub fn add_to(&self, accumulator: &mut [i32]) {
        debug_assert_eq!(accumulator.len(), self.values.len());
        for (acc, &v) in accumulator.iter_mut().zip(self.values.iter()) {
            *acc += v as i32;
        }
    }
}

/// Deterministic term → [`ProjectionVector`] mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionGenerator {
    signature_len: usize,
    half_non_zero: usize,
}

impl ProjectionGenerator {
    /// Create a generator for signatures of `signature_len` bits at
    /// `density` percent non-zero entries
    ///
    /// Callers are expected to have validated the pair through
    /// [`SignatureConfig::validate`](crate::SignatureConfig::validate).
    pub fn new(signature_len: usize, density: usize) -> Self {
        let non_zero = signature_len * density / 100;
        Self {
            signature_len,
            half_non_zero: non_zero / 2,
        }
    }

    /// Signature length L
    pub fn signature_len(&self) -> usize {
        self.signature_len
    }

    /// Entries of each sign in every generated vector
    pub fn half_non_zero(&self) -> usize {
        self.half_non_zero
    }

    /// Upper bound on RNG draws for one vector
    pub fn draw_ceiling(&self) -> usize {
        self.signature_len.saturating_mul(DRAWS_PER_POSITION)
    }

    /// Project a term
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::RejectionSamplingExhausted`] if the
    /// rejection loop runs past [`draw_ceiling`](Self::draw_ceiling). This
    /// indicates a broken configuration and is never expected in practice.
    pub fn generate(&self, term: &[u8]) -> Result<ProjectionVector> {
        let mut values = vec![0i8; self.signature_len].into_boxed_slice();
        if self.half_non_zero == 0 {
            return Ok(ProjectionVector { values });
        }

        let mut rng = IsaacRng::from_term(term);
        let ceiling = self.draw_ceiling();
        let mut draws = 0usize;

        for sign in [1i8, -1i8] {
            let mut claimed = 0;
            while claimed < self.half_non_zero {
                if draws >= ceiling {
                    return Err(SignatureError::RejectionSamplingExhausted {
                        term: String::from_utf8_lossy(term).into_owned(),
                        draws,
                    });
                }
                draws += 1;

                let pos = rng.next_bounded(self.signature_len as u32) as usize;
                if values[pos] == 0 {
                    values[pos] = sign;
                    claimed += 1;
                }
            }
        }

        Ok(ProjectionVector { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_split() {
        let generator = ProjectionGenerator::new(64, 21);
        assert_eq!(generator.half_non_zero(), 6);

        for term in [b"CST".as_ref(), b"PAG", b"NDE", b"WWW"] {
            let v = generator.generate(term).unwrap();
            assert_eq!(v.len(), 64);
            assert_eq!(v.positive_count(), 6);
            assert_eq!(v.negative_count(), 6);
            assert_eq!(v.non_zero_count(), 12);
        }
    }

    #[test]
    fn test_zero_density_is_all_zero() {
        let generator = ProjectionGenerator::new(64, 0);
        let v = generator.generate(b"CST").unwrap();
        assert_eq!(v.non_zero_count(), 0);
    }

    #[test]
    fn test_full_density_fills_every_slot() {
        let generator = ProjectionGenerator::new(16, 100);
        let v = generator.generate(b"ACGT").unwrap();
        assert_eq!(v.positive_count(), 8);
        assert_eq!(v.negative_count(), 8);
        assert!(v.as_slice().iter().all(|&x| x != 0));
    }

    #[test]
    fn test_odd_non_zero_rounds_down() {
        // 64 * 21 / 100 = 13 -> six of each sign
        let generator = ProjectionGenerator::new(64, 21);
        assert_eq!(generator.generate(b"KMI").unwrap().non_zero_count(), 12);
    }

    #[test]
    fn test_positives_drawn_before_negatives() {
        // Replaying the rng: the first distinct positions drawn are the +1 slots
        let generator = ProjectionGenerator::new(64, 21);
        let v = generator.generate(b"LVF").unwrap();

        let mut rng = IsaacRng::from_term(b"LVF");
        let mut seen = Vec::new();
        while seen.len() < 6 {
            let pos = rng.next_bounded(64) as usize;
            if !seen.contains(&pos) {
                seen.push(pos);
            }
        }
        for pos in seen {
            assert_eq!(v.as_slice()[pos], 1);
        }
    }

    #[test]
    fn test_add_to_accumulates() {
        let generator = ProjectionGenerator::new(8, 50);
        let v = generator.generate(b"AC").unwrap();
        let mut acc = vec![0i32; 8];
        v.add_to(&mut acc);
        v.add_to(&mut acc);
        for (a, &x) in acc.iter().zip(v.as_slice()) {
            assert_eq!(*a, 2 * x as i32);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: exactly half_non_zero entries of each sign, at distinct positions
            #[test]
            fn prop_density_invariant(
                term in prop::collection::vec(any::<u8>(), 1..16),
                bytes in 1usize..17,
                density in 0usize..=100,
            ) {
                let len = bytes * 8;
                let generator = ProjectionGenerator::new(len, density);
                let half = len * density / 100 / 2;

                let v = generator.generate(&term).unwrap();
                prop_assert_eq!(v.len(), len);
                prop_assert_eq!(v.positive_count(), half);
                prop_assert_eq!(v.negative_count(), half);
                prop_assert!(v.as_slice().iter().all(|x| matches!(x, -1..=1)));
            }

            /// Property: identical bytes give identical vectors
            #[test]
            fn prop_deterministic(term in "[CSTPAGNDEQHRKMILVFYW]{3}") {
                let generator = ProjectionGenerator::new(64, 21);
                prop_assert_eq!(
                    generator.generate(term.as_bytes()).unwrap(),
                    generator.generate(term.as_bytes()).unwrap()
                );
            }
        }
    }
}
