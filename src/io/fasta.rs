//! FASTA streaming parser
//!
//! Supplies the pipeline with one sequence at a time: header metadata is
//! dropped, wrapped sequence lines are joined and line endings stripped.
//!
//! # Format
//!
//! ```text
//! >sp|P69905|HBA_HUMAN Hemoglobin subunit alpha
//! MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHF
//! DLSHGSAQVKGHGKKVADALTNAVAHV
//! >seq2
//! CSTPAGNDEQHRKMILVFYW
//! ```

use crate::error::{Result, SignatureError};
use crate::io::compression::{CompressedReader, DataSource};
use crate::types::FastaRecord;
use std::io::BufRead;
use std::path::Path;

/// FASTA streaming parser with constant memory footprint
///
/// # Example
///
/// ```no_run
/// use kmer_signatures::FastaStream;
///
/// let stream = FastaStream::from_path("proteins.fasta.gz")?;
/// for record in stream {
///     let record = record?;
///     println!("{}: {} residues", record.id, record.sequence.len());
/// }
/// # Ok::<(), kmer_signatures::SignatureError>(())
/// ```
pub struct FastaStream<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
    finished: bool,
    /// Header of the next record, read while scanning the current one
    next_line: Option<String>,
}

impl FastaStream<CompressedReader> {
    /// Create a FASTA stream from a data source
    pub fn new(source: DataSource) -> Result<Self> {
        let compressed_reader = CompressedReader::new(source)?;
        Ok(Self::from_reader(compressed_reader))
    }

    /// Create a FASTA stream from a local file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DataSource::from_path(path))
    }
}

impl<R: BufRead> FastaStream<R> {
    /// Create a FASTA stream from any buffered reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(256),
            line_number: 0,
            finished: false,
            next_line: None,
        }
    }

    /// Adapt into a stream of bare sequences, as consumed by
    /// [`SignaturePipeline::run_to_writer`](crate::SignaturePipeline::run_to_writer)
    pub fn sequences(self) -> impl Iterator<Item = Result<Vec<u8>>> {
        self.map(|record| record.map(|r| r.sequence))
    }

    /// Read a single FASTA record
    fn read_record(&mut self) -> Result<Option<FastaRecord>> {
        // Header comes from the look-ahead buffer, or the next non-empty line
        let header = loop {
            if let Some(peeked) = self.next_line.take() {
                break peeked;
            }
            if self.finished {
                return Ok(None);
            }

            self.line_buffer.clear();
            if self.reader.read_line(&mut self.line_buffer)? == 0 {
                self.finished = true;
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.line_buffer.trim_end();
            if !line.is_empty() {
                break line.to_string();
            }
        };

        if !header.starts_with('>') {
            return Err(SignatureError::InvalidFastaFormat {
                line: self.line_number,
                msg: format!("Expected '>' at start of header, got: {}", header),
            });
        }

        // ID is everything after '>' up to the first whitespace
        let id = header[1..]
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        let mut sequence = Vec::new();
        loop {
            self.line_buffer.clear();
            if self.reader.read_line(&mut self.line_buffer)? == 0 {
                self.finished = true;
                break;
            }
            self.line_number += 1;

            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('>') {
                self.next_line = Some(line.to_string());
                break;
            }
            sequence.extend_from_slice(line.as_bytes());
        }

        if sequence.is_empty() {
            return Err(SignatureError::InvalidFastaFormat {
                line: self.line_number,
                msg: format!("Record '{}' has no sequence", id),
            });
        }

        Ok(Some(FastaRecord::new(id, sequence)))
    }
}

impl<R: BufRead> Iterator for FastaStream<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
