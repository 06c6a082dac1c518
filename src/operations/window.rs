//! Sliding-window partitioning and accumulation
//!
//! A document is cut into windows of `partition_size` bytes that advance by
//! half a window. Every k-mer fully inside a window contributes its
//! projection vector to that window's accumulator.
//!
//! # Window geometry
//!
//! The start offsets follow a do-while loop: the first window at offset 0 is
//! always emitted, then the offset advances by the stride while
//! `offset + stride < len`. The final window may be shorter than
//! `partition_size`; a window shorter than K contains no k-mers and yields
//! an all-zero accumulator.
//!
//! The number of windows is given by [`window_count`], which is used both to
//! size output buffers and to check the loop after every document:
//!
//! ```text
//! window_count(len) = max(1, (len - 1) / stride)
//! ```
//!
//! # Example
//!
//! ```
//! use kmer_signatures::operations::window::{window_count, WindowStarts};
//!
//! // 20 bytes, 16-byte windows, stride 8
//! let windows: Vec<_> = WindowStarts::new(20, 16).collect();
//! assert_eq!(windows, vec![0..16, 8..20]);
//! assert_eq!(window_count(20, 16), 2);
//! ```

use std::ops::Range;

use tracing::trace;

use crate::error::{Result, SignatureError};
use crate::operations::cache::SignatureCache;

/// Number of windows emitted for a document of `len` bytes
///
/// # Panics
///
/// Panics if `partition_size < 2` (zero stride); configurations are
/// validated before any document is partitioned.
pub fn window_count(len: usize, partition_size: usize) -> usize {
    let stride = partition_size / 2;
    assert!(stride > 0, "window size must be at least 2");
    (len.saturating_sub(1) / stride).max(1)
}

/// Iterator over window byte ranges of a document
#[derive(Debug, Clone)]
pub struct WindowStarts {
    len: usize,
    partition_size: usize,
    stride: usize,
    next: Option<usize>,
}

impl WindowStarts {
    /// Windows of a document of `len` bytes
    ///
    /// # Panics
    ///
    /// Panics if `partition_size < 2`.
    pub fn new(len: usize, partition_size: usize) -> Self {
        let stride = partition_size / 2;
        assert!(stride > 0, "window size must be at least 2");
        Self {
            len,
            partition_size,
            stride,
            next: Some(0),
        }
    }
}

impl Iterator for WindowStarts {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        let width = self.partition_size.min(self.len - start);

        let advanced = start + self.stride;
        self.next = if advanced + self.stride < self.len {
            Some(advanced)
        } else {
            None
        };

        Some(start..start + width)
    }
}

/// Signed per-position sums for one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowAccumulator {
    sums: Vec<i32>,
}

impl WindowAccumulator {
    /// Zeroed accumulator of `signature_len` entries
    pub fn new(signature_len: usize) -> Self {
        Self {
            sums: vec![0; signature_len],
        }
    }

    /// Reset every entry to zero
    pub fn clear(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0);
    }

    /// Current sums
    pub fn as_slice(&self) -> &[i32] {
        &self.sums
    }

    /// Mutable sums
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.sums
    }
}

/// Drives projection lookups over the windows of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPartitioner {
    partition_size: usize,
    word_len: usize,
    signature_len: usize,
}

impl WindowPartitioner {
    /// Create a partitioner
    ///
    /// # Panics
    ///
    /// Panics if `partition_size < 2` or `word_len == 0`.
    pub fn new(partition_size: usize, word_len: usize, signature_len: usize) -> Self {
        assert!(partition_size >= 2, "window size must be at least 2");
        assert!(word_len >= 1, "k-mer length must be at least 1");
        Self {
            partition_size,
            word_len,
            signature_len,
        }
    }

    /// Window length P
    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Windows a document of `len` bytes produces
    pub fn window_count(&self, len: usize) -> usize {
        window_count(len, self.partition_size)
    }

    /// Window ranges of a document of `len` bytes
    pub fn windows(&self, len: usize) -> WindowStarts {
        WindowStarts::new(len, self.partition_size)
    }

    /// Accumulate every window of `sequence`, handing each finished
    /// accumulator to `emit` in window order
    ///
    /// A single accumulator is reused across windows, so `emit` must consume
    /// it before returning. Returns the number of windows emitted.
    ///
    /// # Errors
    ///
    /// Propagates cache / generator errors and errors from `emit`. Returns
    /// [`SignatureError::WindowCountMismatch`] if the loop disagrees with
    /// [`window_count`].
    pub fn partition<C, F>(&self, sequence: &[u8], cache: &mut C, mut emit: F) -> Result<usize>
    where
        C: SignatureCache + ?Sized,
        F: FnMut(&WindowAccumulator) -> Result<()>,
    {
        let mut accumulator = WindowAccumulator::new(self.signature_len);
        let mut emitted = 0;

        for window in self.windows(sequence.len()) {
            accumulator.clear();
            let slice = &sequence[window];

            if slice.len() >= self.word_len {
                for term in slice.windows(self.word_len) {
                    let projection = cache.get_or_compute(term)?;
                    projection.add_to(accumulator.as_mut_slice());
                }
            }

            emit(&accumulator)?;
            emitted += 1;
        }

        let expected = self.window_count(sequence.len());
        if emitted != expected {
            return Err(SignatureError::WindowCountMismatch {
                length: sequence.len(),
                expected,
                actual: emitted,
            });
        }

        trace!(length = sequence.len(), windows = emitted, "partitioned document");
        Ok(emitted)
    }
}
