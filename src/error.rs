//! Error types for kmer-signatures

use thiserror::Error;

/// Result type alias for signature operations
pub type Result<T> = std::result::Result<T, SignatureError>;

/// Error types that can occur while generating signatures
#[derive(Debug, Error)]
pub enum SignatureError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid FASTA format
    #[error("Invalid FASTA format at line {line}: {msg}")]
    InvalidFastaFormat {
        /// Line number where error occurred
        line: usize,
        /// Error message
        msg: String,
    },

    /// Configuration rejected at pipeline construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rejection sampling ran past its iteration ceiling
    ///
    /// Never expected for sane densities; indicates a broken generator or
    /// configuration rather than bad input.
    #[error("Rejection sampling exhausted after {draws} draws for term {term:?}")]
    RejectionSamplingExhausted {
        /// Term being projected (lossy UTF-8)
        term: String,
        /// Number of draws performed before giving up
        draws: usize,
    },

    /// Partition loop emitted a different number of windows than `window_count`
    #[error("Window count mismatch for document of length {length}: expected {expected}, emitted {actual}")]
    WindowCountMismatch {
        /// Document length in bytes
        length: usize,
        /// Count predicted by `window_count`
        expected: usize,
        /// Count emitted by the partition loop
        actual: usize,
    },

    /// Malformed signature stream (e.g. trailing partial record)
    #[error("Invalid signature stream: {0}")]
    InvalidSignatureStream(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
