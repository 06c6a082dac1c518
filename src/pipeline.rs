//! Parallel signature pipeline
//!
//! Documents are read in batches, fanned out to a fixed-size rayon pool and
//! written back in input order from a single point.
//!
//! # Work distribution
//!
//! Each batch is split statically into one contiguous run of documents per
//! worker slot. Slot `i` processes its run with exclusive access to cache
//! `i`, so whole documents are the unit of work: a window's accumulation and
//! packing never spans workers. Slot results are collected in slot order,
//! which is document order, before anything is written.
//!
//! # Caches
//!
//! Worker caches live as long as the pipeline, so terms memoized in one
//! batch are hits in the next:
//!
//! - [`CacheMode::Isolated`]: one [`IsolatedSignatureCache`] per slot.
//! - [`CacheMode::Shared`]: one [`SharedSignatureCache`], one handle per slot.
//!
//! Both modes produce byte-identical output.
//!
//! # Example
//!
//! ```
//! use kmer_signatures::{SignatureConfig, SignaturePipeline};
//!
//! let config = SignatureConfig::default().with_workers(2);
//! let mut pipeline = SignaturePipeline::new(config)?;
//!
//! let records = pipeline.run([b"CSTPAGNDEQHRKMILVFYW".as_ref(), b"MKV".as_ref()])?;
//!
//! // 20 residues, stride 8 → 2 windows; 3 residues → 1 window
//! assert_eq!(records.len(), 3);
//! assert_eq!(records[0].doc_id, 0);
//! assert_eq!(records[2].doc_id, 1);
//! assert!(records.iter().all(|r| r.signature.len() == 8));
//! # Ok::<(), kmer_signatures::SignatureError>(())
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::config::{CacheMode, SignatureConfig};
use crate::error::{Result, SignatureError};
use crate::io::signature::SignatureWriter;
use crate::operations::cache::{
    CacheStats, IsolatedSignatureCache, SharedCacheHandle, SharedSignatureCache, SignatureCache,
};
use crate::operations::packing::pack_signature_into;
use crate::operations::projection::ProjectionGenerator;
use crate::operations::window::WindowPartitioner;
use crate::types::{Document, OutputRecord};

/// Totals for one `run_to_writer` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Documents processed
    pub documents: u64,
    /// Windows (= records) emitted
    pub windows: u64,
    /// Bytes written to the sink
    pub bytes_written: u64,
    /// Cache counters at the end of the run (cumulative over the pipeline)
    pub cache: CacheStats,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

enum WorkerCaches {
    Isolated(Vec<IsolatedSignatureCache>),
    Shared {
        cache: Arc<SharedSignatureCache>,
        handles: Vec<SharedCacheHandle>,
    },
}

impl WorkerCaches {
    fn new(mode: CacheMode, workers: usize, generator: ProjectionGenerator) -> Self {
        match mode {
            CacheMode::Isolated => WorkerCaches::Isolated(
                (0..workers)
                    .map(|_| IsolatedSignatureCache::new(generator))
                    .collect(),
            ),
            CacheMode::Shared => {
                let cache = SharedSignatureCache::new(generator);
                let handles = (0..workers).map(|_| cache.handle()).collect();
                WorkerCaches::Shared { cache, handles }
            }
        }
    }

    fn stats(&self) -> CacheStats {
        match self {
            WorkerCaches::Isolated(caches) => caches
                .iter()
                .map(SignatureCache::stats)
                .fold(CacheStats::default(), CacheStats::merge),
            WorkerCaches::Shared { cache, .. } => cache.stats(),
        }
    }
}

/// Configured signature generator with its worker pool and caches
pub struct SignaturePipeline {
    config: SignatureConfig,
    partitioner: WindowPartitioner,
    pool: ThreadPool,
    caches: WorkerCaches,
    next_doc_id: u64,
}

impl SignaturePipeline {
    /// Validate `config` and build the worker pool
    ///
    /// # Errors
    ///
    /// [`SignatureError::InvalidConfig`] for a rejected configuration,
    /// [`SignatureError::ThreadPool`] if the pool cannot be created.
    pub fn new(config: SignatureConfig) -> Result<Self> {
        config.validate()?;

        let generator = ProjectionGenerator::new(config.signature_len, config.density);
        let partitioner =
            WindowPartitioner::new(config.partition_size, config.word_len, config.signature_len);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("kmer-signatures-{}", i))
            .build()
            .map_err(|e| SignatureError::ThreadPool(e.to_string()))?;

        let caches = WorkerCaches::new(config.cache_mode, config.workers, generator);

        debug!(
            signature_len = config.signature_len,
            density = config.density,
            word_len = config.word_len,
            partition_size = config.partition_size,
            cache_mode = %config.cache_mode,
            workers = config.workers,
            "signature pipeline ready"
        );

        Ok(Self {
            config,
            partitioner,
            pool,
            caches,
            next_doc_id: 0,
        })
    }

    /// Configuration the pipeline was built with
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Id the next document will receive
    ///
    /// Reaches `u32::MAX + 1` once the last id has been handed out, after
    /// which every further document is rejected.
    pub fn next_doc_id(&self) -> u64 {
        self.next_doc_id
    }

    /// Cache counters accumulated so far
    pub fn cache_stats(&self) -> CacheStats {
        self.caches.stats()
    }

    /// Sign `documents` and collect every record in memory
    pub fn run<I, S>(&mut self, documents: I) -> Result<Vec<OutputRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let signature_bytes = self.config.signature_bytes();
        let mut records = Vec::new();

        self.drive(
            documents
                .into_iter()
                .map(|s| Ok::<_, SignatureError>(s.as_ref().to_vec())),
            |doc, packed| {
                records.extend(
                    packed
                        .chunks_exact(signature_bytes)
                        .map(|sig| OutputRecord::new(doc.id, sig.to_vec())),
                );
                Ok(())
            },
        )?;

        Ok(records)
    }

    /// Sign `documents` and stream the records to `writer`
    ///
    /// Records are written batch by batch. If an error aborts the run, the
    /// sink holds only the batches completed before it and must be treated
    /// as a partial file.
    pub fn run_to_writer<I, W>(&mut self, documents: I, writer: W) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Vec<u8>>>,
        W: Write,
    {
        let start = Instant::now();
        let signature_bytes = self.config.signature_bytes();
        let mut writer = SignatureWriter::new(writer);

        let (documents, windows) = self.drive(documents, |doc, packed| {
            writer.write_document(doc.id, packed, signature_bytes)?;
            Ok(())
        })?;
        writer.flush()?;

        let summary = RunSummary {
            documents,
            windows,
            bytes_written: writer.bytes_written(),
            cache: self.cache_stats(),
            elapsed: start.elapsed(),
        };

        info!(
            documents = summary.documents,
            windows = summary.windows,
            bytes = summary.bytes_written,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "signature run complete"
        );
        debug!(
            entries = summary.cache.entries,
            hits = summary.cache.hits,
            misses = summary.cache.misses,
            redundant = summary.cache.redundant_computes,
            hit_rate = summary.cache.hit_rate(),
            "cache statistics"
        );

        Ok(summary)
    }

    /// Batch loop shared by `run` and `run_to_writer`
    ///
    /// Calls `on_document` once per document, in input order, with the
    /// document's packed windows laid back to back.
    fn drive<I, F>(&mut self, documents: I, mut on_document: F) -> Result<(u64, u64)>
    where
        I: IntoIterator<Item = Result<Vec<u8>>>,
        F: FnMut(&Document, &[u8]) -> Result<()>,
    {
        let signature_bytes = self.config.signature_bytes();
        let mut documents = documents.into_iter();
        let mut total_documents = 0u64;
        let mut total_windows = 0u64;

        loop {
            let batch = self.next_batch(&mut documents)?;
            if batch.is_empty() {
                break;
            }

            let packed = self.process_batch(&batch)?;
            let mut batch_windows = 0u64;
            for (doc, signatures) in batch.iter().zip(&packed) {
                on_document(doc, signatures)?;
                batch_windows += (signatures.len() / signature_bytes) as u64;
            }

            debug!(
                first_doc = batch[0].id,
                documents = batch.len(),
                windows = batch_windows,
                "batch written"
            );
            total_documents += batch.len() as u64;
            total_windows += batch_windows;
        }

        Ok((total_documents, total_windows))
    }

    /// Pull up to `batch_size` documents, assigning sequential ids
    ///
    /// Ids are committed only once the whole batch has been read, so a
    /// failed read leaves `next_doc_id` untouched.
    fn next_batch<I>(&mut self, documents: &mut I) -> Result<Vec<Document>>
    where
        I: Iterator<Item = Result<Vec<u8>>>,
    {
        let mut batch = Vec::with_capacity(self.config.batch_size);
        let mut next = self.next_doc_id;
        for sequence in documents.by_ref().take(self.config.batch_size) {
            let sequence = sequence?;
            let id = u32::try_from(next).map_err(|_| {
                SignatureError::InvalidConfig("document id space (u32) exhausted".to_string())
            })?;
            batch.push(Document::new(id, sequence));
            next += 1;
        }
        self.next_doc_id = next;
        Ok(batch)
    }

    /// Sign one batch in parallel; result `i` belongs to `batch[i]`
    fn process_batch(&mut self, batch: &[Document]) -> Result<Vec<Vec<u8>>> {
        let signature_bytes = self.config.signature_bytes();
        match &mut self.caches {
            WorkerCaches::Isolated(caches) => {
                dispatch(&self.pool, &self.partitioner, signature_bytes, caches, batch)
            }
            WorkerCaches::Shared { handles, .. } => {
                dispatch(&self.pool, &self.partitioner, signature_bytes, handles, batch)
            }
        }
    }
}

impl std::fmt::Debug for SignaturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePipeline")
            .field("config", &self.config)
            .field("next_doc_id", &self.next_doc_id)
            .finish_non_exhaustive()
    }
}

/// Statically partition `batch` over the worker slots and sign it
fn dispatch<C>(
    pool: &ThreadPool,
    partitioner: &WindowPartitioner,
    signature_bytes: usize,
    caches: &mut [C],
    batch: &[Document],
) -> Result<Vec<Vec<u8>>>
where
    C: SignatureCache + Send,
{
    let chunk_size = batch.len().div_ceil(caches.len()).max(1);

    pool.install(|| {
        caches
            .par_iter_mut()
            .zip(batch.par_chunks(chunk_size))
            .map(|(cache, docs)| {
                docs.iter()
                    .map(|doc| sign_document(partitioner, signature_bytes, cache, doc))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()
            .map(|slots| slots.into_iter().flatten().collect())
    })
}

/// Packed windows of one document, back to back
fn sign_document<C>(
    partitioner: &WindowPartitioner,
    signature_bytes: usize,
    cache: &mut C,
    doc: &Document,
) -> Result<Vec<u8>>
where
    C: SignatureCache + ?Sized,
{
    let mut packed = Vec::with_capacity(partitioner.window_count(doc.len()) * signature_bytes);
    partitioner.partition(&doc.sequence, cache, |accumulator| {
        pack_signature_into(accumulator.as_slice(), &mut packed);
        Ok(())
    })?;
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHABET: &[u8] = b"CSTPAGNDEQHRKMILVFYW";

    fn corpus() -> Vec<Vec<u8>> {
        (0..50)
            .map(|i| {
                (0..(i * 7 + 1))
                    .map(|j| ALPHABET[(i * 31 + j * j) % ALPHABET.len()])
                    .collect()
            })
            .collect()
    }

    fn run_stream(config: SignatureConfig, docs: &[Vec<u8>]) -> Vec<u8> {
        let mut pipeline = SignaturePipeline::new(config).unwrap();
        let mut out = Vec::new();
        pipeline
            .run_to_writer(docs.iter().cloned().map(Ok), &mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = SignaturePipeline::new(SignatureConfig::default().with_density(150));
        assert!(matches!(result, Err(SignatureError::InvalidConfig(_))));
    }

    #[test]
    fn test_alphabet_document_two_windows() {
        let mut pipeline = SignaturePipeline::new(SignatureConfig::default()).unwrap();
        let mut out = Vec::new();
        let summary = pipeline
            .run_to_writer(vec![Ok(ALPHABET.to_vec())], &mut out)
            .unwrap();

        assert_eq!(summary.documents, 1);
        assert_eq!(summary.windows, 2);
        assert_eq!(summary.bytes_written, 24);
        assert_eq!(out.len(), 24);
        assert_eq!(&out[..4], &0u32.to_ne_bytes());
        assert_eq!(&out[12..16], &0u32.to_ne_bytes());
    }

    #[test]
    fn test_output_matches_sequential_reference() {
        // Single-threaded reimplementation of the whole pipeline
        let config = SignatureConfig::default();
        let generator = ProjectionGenerator::new(64, 21);
        let mut expected = Vec::new();
        for (id, doc) in corpus().iter().enumerate() {
            for window in WindowPartitioner::new(16, 3, 64).windows(doc.len()) {
                let mut sums = vec![0i32; 64];
                let slice = &doc[window];
                if slice.len() >= 3 {
                    for term in slice.windows(3) {
                        generator.generate(term).unwrap().add_to(&mut sums);
                    }
                }
                expected.extend_from_slice(&(id as u32).to_ne_bytes());
                pack_signature_into(&sums, &mut expected);
            }
        }

        assert_eq!(run_stream(config.clone().with_workers(4), &corpus()), expected);
        assert_eq!(
            run_stream(config.with_workers(3).with_cache_mode(CacheMode::Shared), &corpus()),
            expected
        );
    }

    #[test]
    fn test_isolated_and_shared_identical() {
        for workers in [1, 2, 8] {
            let base = SignatureConfig::default().with_workers(workers).with_batch_size(7);
            let isolated = run_stream(base.clone(), &corpus());
            let shared = run_stream(base.with_cache_mode(CacheMode::Shared), &corpus());
            assert_eq!(isolated, shared, "workers={}", workers);
        }
    }

    #[test]
    fn test_ids_sequential_across_batches_and_runs() {
        let config = SignatureConfig::default().with_workers(3).with_batch_size(4);
        let mut pipeline = SignaturePipeline::new(config).unwrap();

        let docs = corpus();
        let records = pipeline.run(&docs[..10]).unwrap();
        let mut ids: Vec<u32> = records.iter().map(|r| r.doc_id).collect();
        ids.dedup();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());

        let more = pipeline.run(&docs[10..12]).unwrap();
        assert_eq!(more.first().map(|r| r.doc_id), Some(10));
        assert_eq!(pipeline.next_doc_id(), 12);
    }

    #[test]
    fn test_caches_persist_across_batches() {
        let config = SignatureConfig::default().with_workers(1).with_batch_size(1);
        let mut pipeline = SignaturePipeline::new(config).unwrap();
        pipeline.run([b"CSTP".as_ref(), b"CSTP".as_ref()]).unwrap();

        let stats = pipeline.cache_stats();
        assert_eq!(stats.entries, 2); // CST, STP
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
    }

    #[test]
    fn test_input_error_aborts_run() {
        let mut pipeline = SignaturePipeline::new(SignatureConfig::default()).unwrap();
        let docs: Vec<Result<Vec<u8>>> = vec![
            Ok(ALPHABET.to_vec()),
            Err(SignatureError::InvalidFastaFormat {
                line: 3,
                msg: "bad".into(),
            }),
        ];
        let mut out = Vec::new();
        assert!(pipeline.run_to_writer(docs, &mut out).is_err());
        assert!(out.is_empty());

        // The failed batch consumed no ids
        assert_eq!(pipeline.next_doc_id(), 0);
        let records = pipeline.run([b"MKV".as_ref()]).unwrap();
        assert_eq!(records[0].doc_id, 0);
    }

    #[test]
    fn test_last_document_id_is_usable() {
        let mut pipeline = SignaturePipeline::new(SignatureConfig::default()).unwrap();
        pipeline.next_doc_id = u64::from(u32::MAX);

        let records = pipeline.run([b"MKV".as_ref()]).unwrap();
        assert_eq!(records[0].doc_id, u32::MAX);
        assert_eq!(pipeline.next_doc_id(), u64::from(u32::MAX) + 1);

        let exhausted = pipeline.run([b"MKV".as_ref()]);
        assert!(matches!(exhausted, Err(SignatureError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_input() {
        let mut pipeline = SignaturePipeline::new(SignatureConfig::default()).unwrap();
        let mut out = Vec::new();
        let summary = pipeline
            .run_to_writer(Vec::<Result<Vec<u8>>>::new(), &mut out)
            .unwrap();
        assert_eq!(summary.documents, 0);
        assert!(out.is_empty());
    }
}
