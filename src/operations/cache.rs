//! Memoization of term projections
//!
//! Protein and DNA alphabets give a small k-mer vocabulary (at most 20^K
//! distinct terms), so every projection is computed once and kept for the
//! lifetime of the cache. Entries are never mutated or evicted.
//!
//! # Modes
//!
//! - [`IsolatedSignatureCache`]: owned by a single worker. No locking,
//!   no sharing; every worker pays for its own misses.
//! - [`SharedSignatureCache`]: one map for all workers behind a
//!   `parking_lot::RwLock`. Workers access it through a
//!   [`SharedCacheHandle`].
//!
//! # Shared-mode race
//!
//! A shared lookup takes the read lock, and on a miss releases it, computes
//! the projection with no lock held, then takes the write lock to insert.
//! Two workers missing the same term concurrently both compute it. The
//! generator is pure, so both results are identical; the first insert wins,
//! the second caller gets the stored value back and the duplicate work is
//! counted in [`CacheStats::redundant_computes`]. The map itself is only
//! ever mutated under the write lock.
//!
//! # Example
//!
//! ```
//! use kmer_signatures::operations::cache::{
//!     IsolatedSignatureCache, SharedSignatureCache, SignatureCache,
//! };
//! use kmer_signatures::operations::projection::ProjectionGenerator;
//!
//! let generator = ProjectionGenerator::new(64, 21);
//!
//! let mut isolated = IsolatedSignatureCache::new(generator);
//! let shared = SharedSignatureCache::new(generator);
//! let mut handle = shared.handle();
//!
//! let a = isolated.get_or_compute(b"CST")?;
//! let b = handle.get_or_compute(b"CST")?;
//! assert_eq!(a, b);
//! assert_eq!(*a, generator.generate(b"CST")?);
//! # Ok::<(), kmer_signatures::SignatureError>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::operations::projection::{ProjectionGenerator, ProjectionVector};

type ProjectionMap = HashMap<Box<[u8]>, Arc<ProjectionVector>>;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct terms stored
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that computed a projection
    pub misses: u64,
    /// Misses whose insert lost to a concurrent worker (shared mode only)
    pub redundant_computes: u64,
}

impl CacheStats {
    /// Total lookups
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }

    /// Sum counters across worker caches
    ///
    /// `entries` is summed too, which counts duplicated terms once per
    /// isolated worker.
    pub fn merge(self, other: CacheStats) -> CacheStats {
        CacheStats {
            entries: self.entries + other.entries,
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            redundant_computes: self.redundant_computes + other.redundant_computes,
        }
    }
}

/// Term → projection lookup with compute-on-miss
pub trait SignatureCache {
    /// Return the projection for `term`, computing and storing it on a miss
    ///
    /// The returned vector always equals `ProjectionGenerator::generate(term)`.
    fn get_or_compute(&mut self, term: &[u8]) -> Result<Arc<ProjectionVector>>;

    /// Current counters
    fn stats(&self) -> CacheStats;
}

/// Private per-worker cache
#[derive(Debug)]
pub struct IsolatedSignatureCache {
    generator: ProjectionGenerator,
    map: ProjectionMap,
    hits: u64,
    misses: u64,
}

impl IsolatedSignatureCache {
    /// Create an empty cache
    pub fn new(generator: ProjectionGenerator) -> Self {
        Self {
            generator,
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Distinct terms stored
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SignatureCache for IsolatedSignatureCache {
    fn get_or_compute(&mut self, term: &[u8]) -> Result<Arc<ProjectionVector>> {
        if let Some(found) = self.map.get(term) {
            self.hits += 1;
            return Ok(Arc::clone(found));
        }

        self.misses += 1;
        let computed = Arc::new(self.generator.generate(term)?);
        self.map.insert(term.into(), Arc::clone(&computed));
        Ok(computed)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.map.len(),
            hits: self.hits,
            misses: self.misses,
            redundant_computes: 0,
        }
    }
}

/// Cache shared by every worker of a pipeline
#[derive(Debug)]
pub struct SharedSignatureCache {
    generator: ProjectionGenerator,
    map: RwLock<ProjectionMap>,
    hits: AtomicU64,
    misses: AtomicU64,
    redundant_computes: AtomicU64,
}

impl SharedSignatureCache {
    /// Create an empty shared cache
    pub fn new(generator: ProjectionGenerator) -> Arc<Self> {
        Arc::new(Self {
            generator,
            map: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            redundant_computes: AtomicU64::new(0),
        })
    }

    /// Worker handle onto this cache
    pub fn handle(self: &Arc<Self>) -> SharedCacheHandle {
        SharedCacheHandle {
            cache: Arc::clone(self),
        }
    }

    /// Distinct terms stored
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Lookup shared by all handles
    pub fn get_or_compute(&self, term: &[u8]) -> Result<Arc<ProjectionVector>> {
        if let Some(found) = self.map.read().get(term) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(found));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(self.generator.generate(term)?);

        let mut map = self.map.write();
        match map.entry(term.into()) {
            Entry::Occupied(existing) => {
                self.redundant_computes.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(existing.get()))
            }
            Entry::Vacant(slot) => Ok(Arc::clone(slot.insert(computed))),
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            redundant_computes: self.redundant_computes.load(Ordering::Relaxed),
        }
    }
}

/// Per-worker reference to a [`SharedSignatureCache`]
#[derive(Debug, Clone)]
pub struct SharedCacheHandle {
    cache: Arc<SharedSignatureCache>,
}

impl SignatureCache for SharedCacheHandle {
    fn get_or_compute(&mut self, term: &[u8]) -> Result<Arc<ProjectionVector>> {
        self.cache.get_or_compute(term)
    }

    fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn generator() -> ProjectionGenerator {
        ProjectionGenerator::new(64, 21)
    }

    #[test]
    fn test_isolated_hit_after_miss() {
        let mut cache = IsolatedSignatureCache::new(generator());
        let first = cache.get_or_compute(b"CST").unwrap();
        let second = cache.get_or_compute(b"CST").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.redundant_computes, 0);
    }

    #[test]
    fn test_keyed_by_content_not_position() {
        // Same bytes from two different buffers share one entry
        let doc = b"CSTPAGCST".to_vec();
        let mut cache = IsolatedSignatureCache::new(generator());
        let a = cache.get_or_compute(&doc[0..3]).unwrap();
        let b = cache.get_or_compute(&doc[6..9]).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_matches_generator() {
        let shared = SharedSignatureCache::new(generator());
        let mut handle = shared.handle();
        for term in [b"CST".as_ref(), b"PAG", b"CST"] {
            let cached = handle.get_or_compute(term).unwrap();
            assert_eq!(*cached, generator().generate(term).unwrap());
        }
        assert_eq!(shared.len(), 2);
        assert_eq!(shared.stats().hits, 1);
        assert_eq!(shared.stats().misses, 2);
    }

    #[test]
    fn test_shared_concurrent_access_is_transparent() {
        let shared = SharedSignatureCache::new(generator());
        let alphabet = b"CSTPAGNDEQHRKMILVFYW";
        let terms: Vec<Vec<u8>> = alphabet
            .iter()
            .flat_map(|&a| alphabet.iter().map(move |&b| vec![a, b, b'W']))
            .collect();

        thread::scope(|scope| {
            for _ in 0..8 {
                let mut handle = shared.handle();
                let terms = &terms;
                scope.spawn(move || {
                    for term in terms {
                        let cached = handle.get_or_compute(term).unwrap();
                        assert_eq!(*cached, generator().generate(term).unwrap());
                    }
                });
            }
        });

        let stats = shared.stats();
        assert_eq!(stats.entries, terms.len());
        assert_eq!(stats.lookups(), 8 * terms.len() as u64);
        // Every miss either inserted a new entry or lost the race
        assert_eq!(stats.misses, terms.len() as u64 + stats.redundant_computes);
    }

    #[test]
    fn test_stats_merge_and_hit_rate() {
        let a = CacheStats {
            entries: 2,
            hits: 3,
            misses: 1,
            redundant_computes: 0,
        };
        let b = CacheStats {
            entries: 1,
            hits: 1,
            misses: 3,
            redundant_computes: 1,
        };
        let merged = a.merge(b);
        assert_eq!(merged.entries, 3);
        assert_eq!(merged.lookups(), 8);
        assert_eq!(merged.hit_rate(), 0.5);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
