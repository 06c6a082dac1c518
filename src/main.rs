//! kmer-signatures CLI
//!
//! Reads a FASTA file and writes one packed signature record per window to
//! `<input>.part{P}_sigs{K:02}_{L}` (or the path given with `--output`).
//!
//! ```text
//! kmer-signatures qut2.fasta -j 8 --compare test_release_qut2.fasta.part16_sigs03_64
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use kmer_signatures::io::{compare_streams, CompressedWriter};
use kmer_signatures::{CacheMode, DataSink, FastaStream, SignatureConfig, SignaturePipeline};

/// Compute k-mer window signatures for a FASTA file
#[derive(Parser, Debug)]
#[command(name = "kmer-signatures")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input FASTA file (gzip accepted)
    input: PathBuf,

    /// Output signature file; '-' writes to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Signature length in bits (multiple of 8)
    #[arg(long, default_value_t = SignatureConfig::DEFAULT_SIGNATURE_LEN)]
    signature_len: usize,

    /// Percentage of non-zero entries per k-mer projection
    #[arg(long, default_value_t = SignatureConfig::DEFAULT_DENSITY)]
    density: usize,

    /// K-mer length
    #[arg(short = 'k', long, default_value_t = SignatureConfig::DEFAULT_WORD_LEN)]
    word_len: usize,

    /// Window length; windows advance by half this
    #[arg(short = 'p', long, default_value_t = SignatureConfig::DEFAULT_PARTITION_SIZE)]
    partition_size: usize,

    /// How workers share memoized projections: isolated or shared
    #[arg(long, default_value = "isolated")]
    cache_mode: CacheMode,

    /// Worker threads
    #[arg(short = 'j', long, default_value_t = SignatureConfig::DEFAULT_WORKERS)]
    workers: usize,

    /// Documents per dispatched batch
    #[arg(long, default_value_t = SignatureConfig::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Golden signature file to compare the output against
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> SignatureConfig {
        SignatureConfig::default()
            .with_signature_len(self.signature_len)
            .with_density(self.density)
            .with_word_len(self.word_len)
            .with_partition_size(self.partition_size)
            .with_cache_mode(self.cache_mode)
            .with_workers(self.workers)
            .with_batch_size(self.batch_size)
    }

    fn sink(&self, config: &SignatureConfig) -> DataSink {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => DataSink::stdout(),
            Some(path) => DataSink::from_path(path),
            None => DataSink::signature_file_for(&self.input, config),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the output does not match the golden file
fn run(cli: &Cli) -> Result<bool> {
    let config = cli.config();
    let sink = cli.sink(&config);
    info!(input = %cli.input.display(), output = %sink, "computing signatures");

    let mut pipeline =
        SignaturePipeline::new(config).context("Failed to set up signature pipeline")?;
    let stream = FastaStream::from_path(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let mut writer = CompressedWriter::new(sink.clone())
        .with_context(|| format!("Failed to open sig file {}", sink))?;

    let summary = pipeline
        .run_to_writer(stream.sequences(), &mut writer)
        .with_context(|| format!("Signature run over {} failed", cli.input.display()))?;
    writer
        .finish()
        .with_context(|| format!("Failed to finish writing {}", sink))?;

    eprintln!(
        "{} documents, {} windows, {:.6} seconds",
        summary.documents,
        summary.windows,
        summary.elapsed.as_secs_f64()
    );

    let Some(golden) = &cli.compare else {
        return Ok(true);
    };
    let DataSink::Local(output) = &sink else {
        anyhow::bail!("--compare needs a file output, not stdout");
    };

    let comparison = compare_streams(
        File::open(output).with_context(|| format!("Failed to reopen {}", output.display()))?,
        File::open(golden).with_context(|| format!("Failed to open {}", golden.display()))?,
    )?;

    if comparison.is_identical() {
        eprintln!("Output file matches test file");
        Ok(true)
    } else {
        eprintln!("Error: output file does not match test file ({})", comparison);
        Ok(false)
    }
}
