//! Per-segment noise floor report.

use super::common::{AnalysisOptions, segment_progress};
use clap::Args;
use soundscape_analysis::AudioSource;
use soundscape_io::WavSource;
use std::path::PathBuf;

#[derive(Args)]
pub struct NoiseArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    options: AnalysisOptions,
}

pub fn run(args: NoiseArgs) -> anyhow::Result<()> {
    let config = args.options.resolve()?;
    let source = WavSource::from_config(&args.input, &config)?;

    let pb = segment_progress(source.number_of_segments() as u64)?;
    let mut floors = Vec::with_capacity(source.number_of_segments());
    for (i, segment) in source.segments().enumerate() {
        floors.push((source.segment_to_timestamp(i), segment?.noise()));
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("{:>10}  {:>12}", "Time (s)", "Noise (dB)");
    for (timestamp, noise) in floors {
        println!("{timestamp:>10.1}  {noise:>12.2}");
    }

    Ok(())
}
