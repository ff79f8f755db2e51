//! Configuration parameters for long-duration index analysis

use serde::{Deserialize, Serialize};

/// Number of frequency bins every index result is expressed over.
pub const NUM_FREQUENCY_BINS: usize = 256;

/// Parameters of the adaptive level equalization noise engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Envelope frame size in samples (default: 512)
    pub frame_size: usize,

    /// Histogram smoothing window for the waveform estimator (default: 3)
    pub waveform_filter_window: usize,

    /// Histogram and cross-bin smoothing window for the spectral estimator (default: 5)
    pub spectral_filter_window: usize,

    /// Standard deviations added to the histogram mode (default: 0.1)
    pub sd_count: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            waveform_filter_window: 3,
            spectral_filter_window: 5,
            sd_count: 0.1,
        }
    }
}

/// STFT parameters for per-segment power spectrograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    /// Frame size (default: 512, giving 256 retained bins)
    pub fft_size: usize,

    /// Hop between frames (default: 256)
    pub hop_size: usize,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            fft_size: 2 * NUM_FREQUENCY_BINS,
            hop_size: NUM_FREQUENCY_BINS,
        }
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Segment length in seconds for file-backed sources (default: 60.0)
    pub segment_duration_secs: f64,

    /// Denoise waveforms and spectrograms before computing indices (default: true)
    pub denoise: bool,

    /// Worker threads; 0 uses the available parallelism (default: 0)
    pub workers: usize,

    /// Maximum index names per run (default: 3)
    pub max_indices: usize,

    /// Noise engine parameters
    pub noise: NoiseConfig,

    /// Segment spectrogram parameters
    pub stft: StftConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segment_duration_secs: 60.0,
            denoise: true,
            workers: 0,
            max_indices: 3,
            noise: NoiseConfig::default(),
            stft: StftConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Number of worker threads to spawn.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stft_yields_256_bins() {
        let stft = StftConfig::default();
        assert_eq!(stft.fft_size / 2, NUM_FREQUENCY_BINS);
        assert_eq!(stft.hop_size, 256);
    }

    #[test]
    fn explicit_worker_count_wins() {
        let config = AnalysisConfig {
            workers: 3,
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn automatic_worker_count_is_positive() {
        assert!(AnalysisConfig::default().worker_count() >= 1);
    }
}
