//! kmer-signatures: locality-sensitive signatures for sequence windows
//!
//! # Overview
//!
//! Every overlapping k-mer of a sequence is projected, through a
//! deterministic ISAAC stream seeded with the k-mer's bytes, onto a sparse
//! ternary vector. Vectors are summed over half-overlapping windows and the
//! sums are packed to one bit per position. The result is a compact,
//! byte-reproducible signature stream that downstream tools compare by
//! Hamming distance instead of storing raw sequences.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kmer_signatures::{DataSink, FastaStream, SignatureConfig, SignaturePipeline};
//! use kmer_signatures::io::CompressedWriter;
//!
//! # fn main() -> kmer_signatures::Result<()> {
//! let config = SignatureConfig::default();
//! let sink = DataSink::signature_file_for("proteins.fasta", &config);
//!
//! let mut pipeline = SignaturePipeline::new(config)?;
//! let mut writer = CompressedWriter::new(sink)?;
//! let summary = pipeline.run_to_writer(
//!     FastaStream::from_path("proteins.fasta")?.sequences(),
//!     &mut writer,
//! )?;
//! writer.finish()?;
//!
//! println!("{} windows", summary.windows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Output format
//!
//! One record per window, no header or separators:
//!
//! ```text
//! repeat { doc_id: u32 (native byte order) ; signature: signature_len / 8 bytes }
//! ```
//!
//! ## Module Organization
//!
//! - [`operations`]: ISAAC source, projection, caches, windows, packing
//! - [`pipeline`]: parallel batch dispatch and ordered output
//! - [`io`]: FASTA input, signature stream output and comparison
//! - [`config`]: run parameters and validation

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod io;
pub mod operations;
pub mod pipeline;
pub mod types;

// Re-export commonly used types
pub use config::{CacheMode, SignatureConfig};
pub use error::{Result, SignatureError};
pub use io::{DataSink, FastaStream, SignatureReader, SignatureWriter};
pub use operations::{CacheStats, ProjectionGenerator, ProjectionVector};
pub use pipeline::{RunSummary, SignaturePipeline};
pub use types::{Document, FastaRecord, OutputRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
