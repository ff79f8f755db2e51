//! Single-segment index calculation.

use super::common::{AnalysisOptions, summarize};
use clap::Args;
use soundscape_analysis::{AnalysisCoordinator, AudioSource, indices::parse_indices};
use soundscape_io::WavSource;
use std::path::PathBuf;

#[derive(Args)]
pub struct SegmentArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Segment number, starting at 0
    #[arg(value_name = "N")]
    segment: usize,

    /// Index names, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    indices: Vec<String>,

    #[command(flatten)]
    options: AnalysisOptions,
}

pub fn run(args: SegmentArgs) -> anyhow::Result<()> {
    let config = args.options.resolve()?;
    let source = WavSource::from_config(&args.input, &config)?;
    let timestamp = source.segment_to_timestamp(args.segment);

    let mut coordinator = AnalysisCoordinator::new(source).with_config(config);
    let failures = coordinator.calculate_segment(args.segment, &args.indices)?;

    println!("Segment {} at {:.1}s", args.segment, timestamp);
    println!();
    println!("{:<10} {:>12} {:>12} {:>12}", "Index", "Min", "Mean", "Max");
    println!("{}", "-".repeat(49));

    let store = coordinator.spectrogram();
    for index in parse_indices(&args.indices)? {
        if let Some((_, error)) = failures.iter().find(|(failed, _)| *failed == index) {
            println!("{:<10} failed: {}", index.name(), error);
            continue;
        }
        let row = store
            .result(index.name())?
            .row(args.segment)
            .unwrap_or_default();
        let (min, mean, max) = summarize(row);
        println!("{:<10} {:>12.6} {:>12.6} {:>12.6}", index.name(), min, mean, max);
    }

    Ok(())
}
