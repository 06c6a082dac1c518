//! Benchmarks for signature generation
//!
//! Covers the per-k-mer projection cost (the cache-miss path), window
//! accumulation over a warm cache, and whole-pipeline throughput in both
//! cache modes across worker counts.
//!
//! Run with: cargo bench --bench signature_generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kmer_signatures::operations::{
    pack_signature, IsolatedSignatureCache, ProjectionGenerator, WindowPartitioner,
};
use kmer_signatures::{CacheMode, SignatureConfig, SignaturePipeline};

const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

/// Deterministic protein-like sequence
fn generate_sequence(len: usize, seed: usize) -> Vec<u8> {
    (0..len)
        .map(|i| AMINO_ACIDS[(i * 7 + seed * 13 + i / 3) % AMINO_ACIDS.len()])
        .collect()
}

fn generate_corpus(documents: usize, len: usize) -> Vec<Vec<u8>> {
    (0..documents).map(|d| generate_sequence(len, d)).collect()
}

/// Projection of a single k-mer at different signature widths
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for signature_len in [64, 256, 1024].iter() {
        let generator = ProjectionGenerator::new(*signature_len, 21);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("L={}", signature_len)),
            signature_len,
            |b, _| b.iter(|| generator.generate(black_box(b"MKV"))),
        );
    }

    group.finish();
}

/// Window accumulation and packing with every k-mer already cached
fn bench_windows_warm_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("windows_warm_cache");

    let seq = generate_sequence(400, 0);
    let partitioner = WindowPartitioner::new(16, 3, 64);
    let mut cache = IsolatedSignatureCache::new(ProjectionGenerator::new(64, 21));
    partitioner
        .partition(&seq, &mut cache, |_| Ok(()))
        .expect("warm-up");

    group.throughput(Throughput::Bytes(seq.len() as u64));
    group.bench_function("partition_pack_400aa", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            partitioner
                .partition(black_box(&seq), &mut cache, |acc| {
                    out.push(pack_signature(acc.as_slice()));
                    Ok(())
                })
                .expect("partition");
            out
        })
    });

    group.finish();
}

/// End-to-end throughput, isolated vs shared caches
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let corpus = generate_corpus(4000, 300);
    let bytes: usize = corpus.iter().map(Vec::len).sum();
    group.throughput(Throughput::Bytes(bytes as u64));

    for mode in [CacheMode::Isolated, CacheMode::Shared] {
        for workers in [1, 4, 8] {
            let config = SignatureConfig::default()
                .with_cache_mode(mode)
                .with_workers(workers);
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), format!("j={}", workers)),
                &config,
                |b, config| {
                    b.iter(|| {
                        let mut pipeline = SignaturePipeline::new(config.clone())
                            .expect("valid benchmark config");
                        pipeline
                            .run_to_writer(corpus.iter().map(|s| Ok(s.clone())), std::io::sink())
                            .expect("benchmark run")
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_projection,
    bench_windows_warm_cache,
    bench_pipeline,
);

criterion_main!(benches);
