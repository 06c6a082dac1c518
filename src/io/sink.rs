//! Output destinations for signature streams
//!
//! `DataSink` is the write counterpart of
//! [`DataSource`](crate::io::compression::DataSource): a signature run does
//! not care whether it is writing to a file or to stdout.
//!
//! # Example
//!
//! ```no_run
//! use kmer_signatures::io::DataSink;
//!
//! let sink = DataSink::from_path("proteins.fasta.part16_sigs03_64");
//! let sink = DataSink::stdout();
//! ```

use std::path::{Path, PathBuf};

use crate::config::SignatureConfig;

/// Output destination for streaming writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSink {
    /// Write to a local file path (`.gz` → gzip compressed)
    Local(PathBuf),

    /// Write to standard output
    Stdout,
}

impl DataSink {
    /// Create a sink from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::Local(path.as_ref().to_path_buf())
    }

    /// Create a sink for standard output
    pub fn stdout() -> Self {
        Self::Stdout
    }

    /// Conventional signature file next to `input`
    ///
    /// Appends `.part{P}_sigs{K:02}_{L}` to the input path.
    ///
    /// ```
    /// use kmer_signatures::io::DataSink;
    /// use kmer_signatures::SignatureConfig;
    /// use std::path::PathBuf;
    ///
    /// let sink = DataSink::signature_file_for("qut2.fasta", &SignatureConfig::default());
    /// assert_eq!(sink, DataSink::Local(PathBuf::from("qut2.fasta.part16_sigs03_64")));
    /// ```
    pub fn signature_file_for<P: AsRef<Path>>(input: P, config: &SignatureConfig) -> Self {
        let mut name = input.as_ref().as_os_str().to_owned();
        name.push(".");
        name.push(config.file_suffix());
        Self::Local(PathBuf::from(name))
    }

    /// Get the file extension if this is a local file sink
    pub(crate) fn extension(&self) -> Option<&str> {
        match self {
            Self::Local(path) => path.extension().and_then(|s| s.to_str()),
            Self::Stdout => None,
        }
    }

    /// Check if this sink represents a compressed output
    pub fn is_compressed(&self) -> bool {
        matches!(self.extension(), Some("gz") | Some("gzip"))
    }
}

impl std::fmt::Display for DataSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Stdout => f.write_str("<stdout>"),
        }
    }
}
