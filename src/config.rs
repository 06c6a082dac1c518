//! Pipeline configuration
//!
//! All parameters are fixed when a [`SignaturePipeline`](crate::SignaturePipeline)
//! is constructed. Defaults reproduce the reference signature files
//! (`part16_sigs03_64`): 64-bit signatures, 21% density, 3-mers and
//! 16-byte windows.
//!
//! # Example
//!
//! ```
//! use kmer_signatures::{CacheMode, SignatureConfig};
//!
//! let config = SignatureConfig::default()
//!     .with_cache_mode(CacheMode::Shared)
//!     .with_workers(4);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.stride(), 8);
//! assert_eq!(config.signature_bytes(), 8);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SignatureError};

/// How memoized projection vectors are shared between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Every worker owns a private cache (no locking, duplicated entries)
    #[default]
    Isolated,
    /// One cache shared by all workers behind a reader-writer lock
    Shared,
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheMode::Isolated => f.write_str("isolated"),
            CacheMode::Shared => f.write_str("shared"),
        }
    }
}

impl FromStr for CacheMode {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "isolated" => Ok(CacheMode::Isolated),
            "shared" => Ok(CacheMode::Shared),
            other => Err(SignatureError::InvalidConfig(format!(
                "unknown cache mode '{}' (expected 'isolated' or 'shared')",
                other
            ))),
        }
    }
}

/// Signature generation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    /// Signature length L in bits (multiple of 8)
    pub signature_len: usize,
    /// Percentage of non-zero entries in a term's projection vector (0-100)
    pub density: usize,
    /// K-mer length K
    pub word_len: usize,
    /// Window length P; windows advance by P/2
    pub partition_size: usize,
    /// Cache sharing strategy
    pub cache_mode: CacheMode,
    /// Number of worker threads
    pub workers: usize,
    /// Documents read and dispatched per batch
    pub batch_size: usize,
}

impl SignatureConfig {
    /// Default signature length in bits
    pub const DEFAULT_SIGNATURE_LEN: usize = 64;
    /// Default density percentage
    pub const DEFAULT_DENSITY: usize = 21;
    /// Default k-mer length
    pub const DEFAULT_WORD_LEN: usize = 3;
    /// Default window length
    pub const DEFAULT_PARTITION_SIZE: usize = 16;
    /// Default worker count
    pub const DEFAULT_WORKERS: usize = 8;
    /// Default batch size
    pub const DEFAULT_BATCH_SIZE: usize = 2000;

    /// Set the signature length in bits
    pub fn with_signature_len(mut self, signature_len: usize) -> Self {
        self.signature_len = signature_len;
        self
    }

    /// Set the density percentage
    pub fn with_density(mut self, density: usize) -> Self {
        self.density = density;
        self
    }

    /// Set the k-mer length
    pub fn with_word_len(mut self, word_len: usize) -> Self {
        self.word_len = word_len;
        self
    }

    /// Set the window length
    pub fn with_partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = partition_size;
        self
    }

    /// Set the cache mode
    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Window stride (half the window length)
    pub fn stride(&self) -> usize {
        self.partition_size / 2
    }

    /// Packed signature size in bytes
    pub fn signature_bytes(&self) -> usize {
        self.signature_len / 8
    }

    /// Reject configurations that cannot produce a meaningful run
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidConfig`] describing the first
    /// offending parameter.
    pub fn validate(&self) -> Result<()> {
        if self.signature_len == 0 || self.signature_len % 8 != 0 {
            return Err(invalid(format!(
                "signature length must be a positive multiple of 8, got {}",
                self.signature_len
            )));
        }
        if self.density > 100 {
            return Err(invalid(format!(
                "density must be within 0..=100, got {}",
                self.density
            )));
        }
        if self.word_len == 0 {
            return Err(invalid("k-mer length must be at least 1".to_string()));
        }
        if self.partition_size < 2 {
            return Err(invalid(format!(
                "window size must be at least 2, got {}",
                self.partition_size
            )));
        }
        if self.partition_size < self.word_len {
            return Err(invalid(format!(
                "window size {} is shorter than k-mer length {}; every window would be empty",
                self.partition_size, self.word_len
            )));
        }
        if self.workers == 0 {
            return Err(invalid("worker count must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Output file suffix used by the reference tooling
    ///
    /// ```
    /// use kmer_signatures::SignatureConfig;
    ///
    /// assert_eq!(SignatureConfig::default().file_suffix(), "part16_sigs03_64");
    /// ```
    pub fn file_suffix(&self) -> String {
        format!(
            "part{}_sigs{:02}_{}",
            self.partition_size, self.word_len, self.signature_len
        )
    }
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            signature_len: Self::DEFAULT_SIGNATURE_LEN,
            density: Self::DEFAULT_DENSITY,
            word_len: Self::DEFAULT_WORD_LEN,
            partition_size: Self::DEFAULT_PARTITION_SIZE,
            cache_mode: CacheMode::default(),
            workers: Self::DEFAULT_WORKERS,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

fn invalid(msg: String) -> SignatureError {
    SignatureError::InvalidConfig(msg)
}
