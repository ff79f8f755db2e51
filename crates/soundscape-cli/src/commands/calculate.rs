//! Whole-recording index calculation.

use super::common::{AnalysisOptions, segment_progress};
use clap::Args;
use soundscape_analysis::{AnalysisCoordinator, AudioSource};
use soundscape_io::WavSource;
use std::path::PathBuf;

#[derive(Args)]
pub struct CalculateArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Index names, comma separated (e.g. "Ht,Hf,ACI")
    #[arg(short, long, value_delimiter = ',', required = true)]
    indices: Vec<String>,

    /// Output CSV file
    #[arg(short, long)]
    output: PathBuf,

    /// Worker threads (0 = available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Load an existing output first and skip indices it already holds
    #[arg(long)]
    resume: bool,

    #[command(flatten)]
    options: AnalysisOptions,
}

pub fn run(args: CalculateArgs) -> anyhow::Result<()> {
    let mut config = args.options.resolve()?;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let source = WavSource::from_config(&args.input, &config)?;
    let segments = source.number_of_segments();
    println!(
        "Reading {} ({} segment(s) of {}s, {} worker(s))",
        args.input.display(),
        segments,
        config.segment_duration_secs,
        config.worker_count()
    );

    let mut coordinator = AnalysisCoordinator::new(source).with_config(config);

    if args.resume && args.output.exists() {
        coordinator.load_indices(&args.output)?;
        println!(
            "Resuming from {} ({})",
            args.output.display(),
            coordinator.spectrogram().indices().join(", ")
        );
    }

    let pb = segment_progress(segments as u64)?;
    coordinator.calculate_indices_with_progress(&args.indices, |done, _| {
        pb.set_position(done as u64);
    })?;
    pb.finish();

    coordinator.save_indices(&args.output)?;

    let store = coordinator.spectrogram();
    println!(
        "Saved {} to {}",
        store.indices().join(", "),
        args.output.display()
    );

    Ok(())
}
