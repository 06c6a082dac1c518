//! I/O module: sequence input, signature output
//!
//! Everything outside the parallel region lives here. Input is streamed one
//! FASTA record at a time; signature records are written sequentially from
//! a single point so records never interleave.

pub mod compression;
mod fasta;
pub mod signature;
pub mod sink;

pub use compression::{CompressedReader, CompressedWriter, DataSource, MMAP_THRESHOLD};
pub use fasta::FastaStream;
pub use signature::{compare_streams, SignatureReader, SignatureWriter, StreamComparison};
pub use sink::DataSink;
