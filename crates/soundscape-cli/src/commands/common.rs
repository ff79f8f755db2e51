//! Shared CLI helpers used across multiple commands.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use soundscape_analysis::AnalysisConfig;
use soundscape_config::{load_config, load_or_default, validate_config};
use std::path::PathBuf;

/// Options that shape how a recording is segmented and analyzed.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Configuration file (TOML); defaults to the user config file if present
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Segment length in seconds
    #[arg(long, value_name = "SECONDS")]
    pub segment_duration: Option<f64>,

    /// Skip waveform and spectrogram denoising
    #[arg(long)]
    pub no_denoise: bool,
}

impl AnalysisOptions {
    /// Load the configuration file and apply command-line overrides.
    pub fn resolve(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => load_or_default()?,
        };

        if let Some(seconds) = self.segment_duration {
            config.segment_duration_secs = seconds;
        }
        if self.no_denoise {
            config.denoise = false;
        }

        validate_config(&config)?;
        Ok(config)
    }
}

/// Progress bar over `len` segments.
pub fn segment_progress(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

/// Minimum, mean and maximum of a row.
pub fn summarize(values: &[f32]) -> (f32, f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    (min, mean, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_row() {
        assert_eq!(summarize(&[1.0, 3.0, 2.0]), (1.0, 2.0, 3.0));
        assert_eq!(summarize(&[]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "segment_duration_secs = 20.0\nworkers = 3\n").unwrap();

        let options = AnalysisOptions {
            config: Some(path),
            segment_duration: Some(5.0),
            no_denoise: true,
        };
        let config = options.resolve().unwrap();
        assert_eq!(config.segment_duration_secs, 5.0);
        assert_eq!(config.workers, 3);
        assert!(!config.denoise);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let options = AnalysisOptions {
            config: Some(path),
            segment_duration: Some(0.0),
            no_denoise: false,
        };
        assert!(options.resolve().is_err());
    }
}
