//! Signature generation primitives
//!
//! Leaves first:
//!
//! - `isaac`: seeded pseudorandom source keyed by k-mer bytes
//! - `projection`: k-mer → sparse ternary vector by rejection sampling
//! - `cache`: memoized projections, per-worker or shared
//! - `window`: half-stride window partitioning and accumulation
//! - `packing`: accumulator → packed bits, Hamming distance

pub mod cache;
pub mod isaac;
pub mod packing;
pub mod projection;
pub mod window;

pub use cache::{
    CacheStats, IsolatedSignatureCache, SharedCacheHandle, SharedSignatureCache, SignatureCache,
};
pub use isaac::IsaacRng;
pub use packing::{hamming_distance, pack_signature, pack_signature_into};
pub use projection::{ProjectionGenerator, ProjectionVector};
pub use window::{window_count, WindowAccumulator, WindowPartitioner, WindowStarts};
