//! Signature stream reading, writing and comparison
//!
//! A signature stream is a flat sequence of records:
//!
//! ```text
//! repeat { doc_id: u32 (native byte order) ; signature: signature_len / 8 bytes }
//! ```
//!
//! There is no header, footer or per-record length, so a reader must be told
//! the signature length used to produce the stream.

use std::io::{self, Read, Write};

use crate::error::{Result, SignatureError};
use crate::types::OutputRecord;

/// Writes records in stream layout and counts what went out
///
/// # Example
///
/// ```
/// use kmer_signatures::io::signature::SignatureWriter;
///
/// let mut writer = SignatureWriter::new(Vec::new());
/// writer.write_record(0, &[0x12; 8])?;
/// writer.write_record(0, &[0x34; 8])?;
///
/// assert_eq!(writer.records_written(), 2);
/// assert_eq!(writer.into_inner().len(), 24);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct SignatureWriter<W: Write> {
    inner: W,
    records: u64,
    bytes: u64,
}

impl<W: Write> SignatureWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: 0,
            bytes: 0,
        }
    }

    /// Write one `(doc_id, signature)` record
    pub fn write_record(&mut self, doc_id: u32, signature: &[u8]) -> io::Result<()> {
        self.inner.write_all(&doc_id.to_ne_bytes())?;
        self.inner.write_all(signature)?;
        self.records += 1;
        self.bytes += (OutputRecord::DOC_ID_BYTES + signature.len()) as u64;
        Ok(())
    }

    /// Write every window of one document
    ///
    /// `packed` holds the document's windows back to back, `signature_bytes`
    /// each.
    pub fn write_document(
        &mut self,
        doc_id: u32,
        packed: &[u8],
        signature_bytes: usize,
    ) -> io::Result<()> {
        for signature in packed.chunks_exact(signature_bytes) {
            self.write_record(doc_id, signature)?;
        }
        Ok(())
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Iterates the records of a signature stream
///
/// # Example
///
/// ```
/// use kmer_signatures::io::signature::{SignatureReader, SignatureWriter};
///
/// let mut writer = SignatureWriter::new(Vec::new());
/// writer.write_record(3, &[0xAA; 8])?;
/// let bytes = writer.into_inner();
///
/// let records: Vec<_> = SignatureReader::new(&bytes[..], 64)
///     .collect::<kmer_signatures::Result<_>>()?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].doc_id, 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SignatureReader<R: Read> {
    inner: R,
    signature_bytes: usize,
    offset: u64,
    finished: bool,
}

impl<R: Read> SignatureReader<R> {
    /// Read records of `signature_len`-bit signatures
    pub fn new(inner: R, signature_len: usize) -> Self {
        Self {
            inner,
            signature_bytes: signature_len / 8,
            offset: 0,
            finished: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<OutputRecord>> {
        let mut buf = vec![0u8; OutputRecord::DOC_ID_BYTES + self.signature_bytes];
        let filled = read_full(&mut self.inner, &mut buf)?;

        if filled == 0 {
            return Ok(None);
        }
        if filled < buf.len() {
            return Err(SignatureError::InvalidSignatureStream(format!(
                "truncated record at byte {}: {} of {} bytes",
                self.offset,
                filled,
                buf.len()
            )));
        }
        self.offset += filled as u64;

        let signature = buf.split_off(OutputRecord::DOC_ID_BYTES);
        let mut id = [0u8; OutputRecord::DOC_ID_BYTES];
        id.copy_from_slice(&buf);
        Ok(Some(OutputRecord::new(u32::from_ne_bytes(id), signature)))
    }
}

impl<R: Read> Iterator for SignatureReader<R> {
    type Item = Result<OutputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.read_record().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

/// Fill `buf` as far as the reader allows, returning bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Outcome of a byte-for-byte comparison of two signature streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamComparison {
    /// Streams are byte-identical
    Identical,
    /// The first stream ends early; the first `len` bytes match
    FirstIsPrefix {
        /// Length of the common prefix
        len: u64,
    },
    /// The second stream ends early; the first `len` bytes match
    SecondIsPrefix {
        /// Length of the common prefix
        len: u64,
    },
    /// Streams differ at `position`
    DifferAt {
        /// Offset of the first differing byte
        position: u64,
        /// Byte in the first stream
        first: u8,
        /// Byte in the second stream
        second: u8,
    },
}

impl StreamComparison {
    /// True for [`StreamComparison::Identical`]
    pub fn is_identical(&self) -> bool {
        matches!(self, StreamComparison::Identical)
    }
}

impl std::fmt::Display for StreamComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identical => f.write_str("streams are identical"),
            Self::FirstIsPrefix { len } => write!(
                f,
                "first stream is included in second, the first {} bytes are identical",
                len
            ),
            Self::SecondIsPrefix { len } => write!(
                f,
                "second stream is included in first, the first {} bytes are identical",
                len
            ),
            Self::DifferAt { position, first, second } => write!(
                f,
                "streams differ at position {}: {} <> {}",
                position, first, second
            ),
        }
    }
}

/// Compare two streams byte for byte
///
/// ```
/// use kmer_signatures::io::signature::{compare_streams, StreamComparison};
///
/// let cmp = compare_streams(&b"abcd"[..], &b"abXd"[..])?;
/// assert_eq!(cmp, StreamComparison::DifferAt { position: 2, first: b'c', second: b'X' });
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn compare_streams<A: Read, B: Read>(first: A, second: B) -> io::Result<StreamComparison> {
    let mut first = io::BufReader::new(first).bytes();
    let mut second = io::BufReader::new(second).bytes();
    let mut position = 0u64;

    loop {
        match (first.next().transpose()?, second.next().transpose()?) {
            (None, None) => return Ok(StreamComparison::Identical),
            (None, Some(_)) => return Ok(StreamComparison::FirstIsPrefix { len: position }),
            (Some(_), None) => return Ok(StreamComparison::SecondIsPrefix { len: position }),
            (Some(a), Some(b)) if a != b => {
                return Ok(StreamComparison::DifferAt {
                    position,
                    first: a,
                    second: b,
                })
            }
            _ => position += 1,
        }
    }
}
