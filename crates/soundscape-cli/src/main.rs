//! Soundscape CLI - long-duration acoustic index maps from WAV recordings.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soundscape")]
#[command(author, version, about = "Soundscape acoustic index analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute index maps for a whole recording and save them as CSV
    Calculate(commands::calculate::CalculateArgs),

    /// Compute indices for a single segment and print summaries
    Segment(commands::segment::SegmentArgs),

    /// Describe a saved index table
    Inspect(commands::inspect::InspectArgs),

    /// Print the noise floor of every segment
    Noise(commands::noise::NoiseArgs),

    /// List supported acoustic indices
    Indices(commands::indices::IndicesArgs),

    /// Display WAV file information
    Info(commands::info::InfoArgs),

    /// Print the effective configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so tables and TOML on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calculate(args) => commands::calculate::run(args),
        Commands::Segment(args) => commands::segment::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Noise(args) => commands::noise::run(args),
        Commands::Indices(args) => commands::indices::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
