//! Input sources and output writers with transparent gzip support
//!
//! - [`DataSource`] / [`CompressedReader`]: open a local file, memory-mapping
//!   it when it is large, and decompress gzip input detected by magic bytes.
//! - [`CompressedWriter`]: buffered writer onto a [`DataSink`], gzip
//!   compressed when the sink path ends in `.gz`.

use crate::error::Result;
use crate::io::DataSink;
use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Memory-mapped file threshold (50 MB)
///
/// Below this, buffered reads are faster than setting up a mapping.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Where input sequences come from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Local file path
    Local(PathBuf),
}

impl DataSource {
    /// Create a local file data source
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        DataSource::Local(path.as_ref().to_path_buf())
    }

    /// Open the data source and return a buffered reader
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            DataSource::Local(path) => open_local_file(path),
        }
    }
}

/// Open a local file, memory-mapping it at or above [`MMAP_THRESHOLD`]
fn open_local_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file_size = std::fs::metadata(path)?.len();

    if file_size >= MMAP_THRESHOLD {
        open_mmap_file(path)
    } else {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Map the file and hint sequential access to the kernel
#[cfg(target_os = "macos")]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    use libc::{madvise, MADV_SEQUENTIAL, MADV_WILLNEED};

    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and the file is not modified while
    // the signature run reads it.
    let mmap = unsafe { Mmap::map(&file)? };

    // SAFETY: pointer and length describe the live mapping above.
    unsafe {
        madvise(
            mmap.as_ptr() as *mut _,
            mmap.len(),
            MADV_SEQUENTIAL | MADV_WILLNEED,
        );
    }

    Ok(Box::new(io::Cursor::new(mmap)))
}

#[cfg(not(target_os = "macos"))]
fn open_mmap_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    // SAFETY: see the macOS variant.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Box::new(io::Cursor::new(mmap)))
}

/// Buffered reader that decompresses gzip (including bgzip) input
///
/// # Example
///
/// ```no_run
/// use kmer_signatures::io::compression::{CompressedReader, DataSource};
///
/// # fn main() -> kmer_signatures::Result<()> {
/// let reader = CompressedReader::new(DataSource::from_path("proteins.fasta.gz"))?;
/// # Ok(())
/// # }
/// ```
pub struct CompressedReader {
    inner: Box<dyn BufRead + Send>,
}

impl CompressedReader {
    /// Open `source`, wrapping it in a gzip decoder if it starts with the
    /// gzip magic bytes (31, 139)
    pub fn new(source: DataSource) -> Result<Self> {
        let mut reader = source.open()?;

        let is_gzipped = {
            let peeked = reader.fill_buf()?;
            peeked.len() >= 2 && peeked[0] == 31 && peeked[1] == 139
        };

        if is_gzipped {
            // Multi-member decoder: bgzip files are concatenated gzip members
            Ok(Self {
                inner: Box::new(BufReader::new(MultiGzDecoder::new(reader))),
            })
        } else {
            Ok(Self { inner: reader })
        }
    }

    /// Get the inner buffered reader
    pub fn into_inner(self) -> Box<dyn BufRead + Send> {
        self.inner
    }
}

impl Read for CompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for CompressedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Buffered writer onto a [`DataSink`]
///
/// Call [`finish`](Self::finish) to flush and finalize; dropping the writer
/// only makes a best-effort flush.
pub enum CompressedWriter {
    /// Uncompressed writer with buffering
    Plain(Option<BufWriter<Box<dyn Write + Send>>>),

    /// Gzip compressed writer (default level 6)
    Gzip(Option<GzEncoder<BufWriter<Box<dyn Write + Send>>>>),
}

impl CompressedWriter {
    /// Create a writer for `sink`
    ///
    /// Local paths ending in `.gz` are gzip compressed; everything else,
    /// including stdout, is written as-is.
    pub fn new(sink: DataSink) -> io::Result<Self> {
        let compressed = sink.is_compressed();
        let writer: Box<dyn Write + Send> = match sink {
            DataSink::Local(path) => Box::new(File::create(&path)?),
            DataSink::Stdout => Box::new(io::stdout()),
        };

        if compressed {
            Ok(Self::new_gzip(writer))
        } else {
            Ok(Self::new_plain(writer))
        }
    }

    /// Create a plain (uncompressed) writer
    pub fn new_plain(writer: Box<dyn Write + Send>) -> Self {
        Self::Plain(Some(BufWriter::new(writer)))
    }

    /// Create a gzip compressed writer
    pub fn new_gzip(writer: Box<dyn Write + Send>) -> Self {
        Self::Gzip(Some(GzEncoder::new(
            BufWriter::new(writer),
            Compression::default(),
        )))
    }

    /// Flush buffered data
    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(Some(w)) => w.flush(),
            Self::Gzip(Some(w)) => w.flush(),
            _ => Ok(()),
        }
    }

    /// Flush everything and, for gzip, write the stream trailer
    pub fn finish(mut self) -> io::Result<()> {
        match &mut self {
            Self::Plain(w) => match w.take() {
                Some(mut writer) => writer.flush(),
                None => Ok(()),
            },
            Self::Gzip(w) => match w.take() {
                Some(encoder) => encoder.finish()?.flush(),
                None => Ok(()),
            },
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(Some(w)) => w.write(buf),
            Self::Gzip(Some(w)) => w.write(buf),
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                "Cannot write to finished writer",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        CompressedWriter::flush(self)
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
