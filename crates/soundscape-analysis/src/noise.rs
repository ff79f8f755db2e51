//! Adaptive level equalization (Towsey, 2013)
//!
//! Background noise is estimated from a histogram of levels: the smoothed
//! histogram mode is the noise mode, and the distance from the mode to the
//! point below it that holds 68% of the mass is the noise standard deviation.
//! The threshold is `mode + sd_count * std`.
//!
//! - [`NoiseEstimator`] - the histogram estimator over a 1-D sample array
//! - [`WaveformDenoiser`] - applies the estimator to a decibel amplitude envelope
//! - [`SpectrogramDenoiser`] - per-frequency-bin thresholds over a power surface

use crate::config::NoiseConfig;
use crate::smoothing::moving_average;

/// Lowest envelope level considered by the waveform estimator (dB).
pub const MIN_ENVELOPE_DB: f32 = -60.0;

/// Width of the background search band above the minimum level (dB).
pub const SEARCH_BAND_DB: f32 = 10.0;

/// Histogram bins used by the waveform estimator.
pub const WAVEFORM_HISTOGRAM_BINS: usize = 100;

/// Spectral estimators use one histogram bin per this many frames.
pub const FRAMES_PER_SPECTRAL_BIN: usize = 8;

/// Fraction of the mass below the mode treated as one standard deviation.
const ONE_SD_MASS: f32 = 0.68;

/// Fraction of the histogram the mode may occupy before being clamped.
const MODE_UPPER_FRACTION: f32 = 0.95;

/// Amplitude floor for decibel conversion.
const AMPLITUDE_FLOOR: f32 = 1e-10;

/// Range covered by the level histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistogramRange {
    /// `width_db` above the observed minimum, which is floored at `floor_db`.
    /// Samples outside the band are ignored.
    DecibelBand {
        /// Lowest admissible minimum level.
        floor_db: f32,
        /// Width of the search band.
        width_db: f32,
    },
    /// Observed minimum to observed maximum.
    DataRange,
}

/// Result of a single noise estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEstimate {
    /// Lower edge of the histogram.
    pub min_level: f32,
    /// Histogram bin width.
    pub bin_width: f32,
    /// Bin of the smoothed histogram maximum, after clamping.
    pub mode_index: usize,
    /// Steps walked below the mode before 68% of the mass was exceeded.
    pub std_index: usize,
    /// Noise mode level.
    pub mode: f32,
    /// Noise standard deviation.
    pub std: f32,
    /// Final threshold, `mode + std * sd_count`.
    pub threshold: f32,
}

/// Histogram mode/standard-deviation noise estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEstimator {
    range: HistogramRange,
    num_bins: usize,
    filter_window: usize,
    sd_count: f32,
}

impl NoiseEstimator {
    /// Create an estimator.
    ///
    /// `num_bins` and `filter_window` are clamped to at least one.
    pub fn new(
        range: HistogramRange,
        num_bins: usize,
        filter_window: usize,
        sd_count: f32,
    ) -> Self {
        Self {
            range,
            num_bins: num_bins.max(1),
            filter_window: filter_window.max(1),
            sd_count,
        }
    }

    /// Estimator for decibel envelopes: 10 dB search band above
    /// `max(min, -60 dB)`, 100 bins.
    pub fn waveform(filter_window: usize, sd_count: f32) -> Self {
        Self::new(
            HistogramRange::DecibelBand {
                floor_db: MIN_ENVELOPE_DB,
                width_db: SEARCH_BAND_DB,
            },
            WAVEFORM_HISTOGRAM_BINS,
            filter_window,
            sd_count,
        )
    }

    /// Estimator for one frequency bin of a power surface with `num_frames`
    /// frames: full data range, `num_frames / 8` bins.
    pub fn spectral(num_frames: usize, filter_window: usize, sd_count: f32) -> Self {
        Self::new(
            HistogramRange::DataRange,
            num_frames / FRAMES_PER_SPECTRAL_BIN,
            filter_window,
            sd_count,
        )
    }

    /// Number of histogram bins.
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Histogram range.
    pub fn range(&self) -> HistogramRange {
        self.range
    }

    /// Estimate the noise threshold of `samples`.
    ///
    /// Non-finite samples are ignored. An empty input yields an all-zero
    /// histogram, for which the mode is bin 0.
    pub fn estimate(&self, samples: &[f32]) -> NoiseEstimate {
        let (min_level, bin_width, histogram) = self.histogram(samples);
        self.summarize(&histogram, min_level, bin_width)
    }

    /// Shorthand for `estimate(samples).threshold`.
    pub fn threshold(&self, samples: &[f32]) -> f32 {
        self.estimate(samples).threshold
    }

    /// Build the raw level histogram, returning `(lower edge, bin width, counts)`.
    fn histogram(&self, samples: &[f32]) -> (f32, f32, Vec<f32>) {
        let mut observed_min = f32::INFINITY;
        let mut observed_max = f32::NEG_INFINITY;
        for &x in samples.iter().filter(|x| x.is_finite()) {
            observed_min = observed_min.min(x);
            observed_max = observed_max.max(x);
        }
        let has_data = observed_min.is_finite();

        let (low, width, band_limited) = match self.range {
            HistogramRange::DecibelBand { floor_db, width_db } => {
                let low = if has_data {
                    observed_min.max(floor_db)
                } else {
                    floor_db
                };
                (low, width_db, true)
            }
            HistogramRange::DataRange if has_data => {
                (observed_min, observed_max - observed_min, false)
            }
            HistogramRange::DataRange => (0.0, 0.0, false),
        };

        let bin_width = width / self.num_bins as f32;
        let high = low + width;
        let mut histogram = vec![0.0f32; self.num_bins];

        for &x in samples.iter().filter(|x| x.is_finite()) {
            if band_limited && (x < low || x > high) {
                continue;
            }
            let bin = if bin_width > 0.0 {
                ((x - low) / bin_width).max(0.0) as usize
            } else {
                0
            };
            histogram[bin.min(self.num_bins - 1)] += 1.0;
        }

        (low, bin_width, histogram)
    }

    /// Locate the mode and standard deviation of a raw histogram.
    fn summarize(&self, histogram: &[f32], min_level: f32, bin_width: f32) -> NoiseEstimate {
        let smoothed = moving_average(histogram, self.filter_window);
        let upper_bound = mode_upper_bound(smoothed.len());

        let mut mode_index = 0;
        for (i, &count) in smoothed.iter().enumerate() {
            if count > smoothed[mode_index] {
                mode_index = i;
            }
        }
        let mode_index = mode_index.min(upper_bound);

        let mass_to_mode: f32 = smoothed[..=mode_index].iter().sum();
        let target = mass_to_mode * ONE_SD_MASS;

        // Walk down from the mode; bin 0 is never visited.
        let mut std_index = 0;
        let mut accumulated = 0.0;
        for (step, bin) in (1..=mode_index).rev().enumerate() {
            accumulated += smoothed[bin];
            if accumulated > target {
                std_index = step;
                break;
            }
        }

        let mode = min_level + (mode_index + 1) as f32 * bin_width;
        let std = (mode_index - std_index) as f32 * bin_width;

        NoiseEstimate {
            min_level,
            bin_width,
            mode_index,
            std_index,
            mode,
            std,
            threshold: mode + std * self.sd_count,
        }
    }
}

/// Highest bin the mode may occupy: the 95th of 100 (index 94).
fn mode_upper_bound(num_bins: usize) -> usize {
    ((num_bins as f32 * MODE_UPPER_FRACTION) as usize).saturating_sub(1)
}

/// Convert linear amplitudes to decibels, flooring silence at -200 dB.
pub fn amplitude_to_db(samples: &[f32]) -> Vec<f32> {
    samples
        .iter()
        .map(|&x| 20.0 * x.abs().max(AMPLITUDE_FLOOR).log10())
        .collect()
}

/// Convert power values to decibels, flooring silence at -100 dB.
pub fn power_to_db(power: &[f32]) -> Vec<f32> {
    power
        .iter()
        .map(|&p| 10.0 * p.max(AMPLITUDE_FLOOR).log10())
        .collect()
}

/// Per-frame envelope: the maximum of each non-overlapping frame.
///
/// A trailing partial frame is dropped unless the signal is shorter than one
/// frame, in which case the whole signal forms a single frame.
pub fn envelope(signal: &[f32], frame_size: usize) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let frame_size = frame_size.max(1);
    if signal.len() < frame_size {
        return vec![frame_max(signal)];
    }
    signal.chunks_exact(frame_size).map(frame_max).collect()
}

fn frame_max(frame: &[f32]) -> f32 {
    frame.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Denoised waveform and the noise floor that was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoisedWaveform {
    /// `max(x - noise_threshold, 0)` for every input sample.
    pub samples: Vec<f32>,
    /// Estimated background level in dB.
    pub noise_threshold: f32,
}

/// Time-domain denoiser for decibel-scaled amplitude signals.
#[derive(Debug, Clone, Copy)]
pub struct WaveformDenoiser {
    frame_size: usize,
    estimator: NoiseEstimator,
}

impl Default for WaveformDenoiser {
    fn default() -> Self {
        Self::from_config(&NoiseConfig::default())
    }
}

impl WaveformDenoiser {
    /// Create a denoiser with the given envelope frame size and default
    /// smoothing (window 3, 0.1 standard deviations).
    pub fn new(frame_size: usize) -> Self {
        let defaults = NoiseConfig::default();
        Self {
            frame_size: frame_size.max(1),
            estimator: NoiseEstimator::waveform(defaults.waveform_filter_window, defaults.sd_count),
        }
    }

    /// Create a denoiser from noise engine settings.
    pub fn from_config(config: &NoiseConfig) -> Self {
        Self {
            frame_size: config.frame_size.max(1),
            estimator: NoiseEstimator::waveform(config.waveform_filter_window, config.sd_count),
        }
    }

    /// Estimate the noise floor of a decibel signal without denoising it.
    pub fn noise_threshold(&self, signal_db: &[f32]) -> f32 {
        self.estimator
            .threshold(&envelope(signal_db, self.frame_size))
    }

    /// Remove the estimated noise floor from a decibel signal.
    pub fn denoise(&self, signal_db: &[f32]) -> DenoisedWaveform {
        let noise_threshold = self.noise_threshold(signal_db);
        let samples = signal_db
            .iter()
            .map(|&x| (x - noise_threshold).max(0.0))
            .collect();

        DenoisedWaveform {
            samples,
            noise_threshold,
        }
    }
}

/// Frequency-domain denoiser for power surfaces indexed `[bin][frame]`.
#[derive(Debug, Clone, Copy)]
pub struct SpectrogramDenoiser {
    filter_window: usize,
    sd_count: f32,
}

impl Default for SpectrogramDenoiser {
    fn default() -> Self {
        Self::from_config(&NoiseConfig::default())
    }
}

impl SpectrogramDenoiser {
    /// Create a denoiser.
    pub fn new(filter_window: usize, sd_count: f32) -> Self {
        Self {
            filter_window: filter_window.max(1),
            sd_count,
        }
    }

    /// Create a denoiser from noise engine settings.
    pub fn from_config(config: &NoiseConfig) -> Self {
        Self::new(config.spectral_filter_window, config.sd_count)
    }

    /// Per-bin thresholds, smoothed across frequency bins.
    pub fn thresholds(&self, power: &[Vec<f32>]) -> Vec<f32> {
        let raw: Vec<f32> = power
            .iter()
            .map(|row| {
                NoiseEstimator::spectral(row.len(), self.filter_window, self.sd_count)
                    .threshold(row)
            })
            .collect();
        moving_average(&raw, self.filter_window)
    }

    /// Subtract each bin's smoothed threshold and clip at zero.
    pub fn denoise(&self, power: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let thresholds = self.thresholds(power);
        power
            .iter()
            .zip(thresholds.iter())
            .map(|(row, &threshold)| row.iter().map(|&p| (p - threshold).max(0.0)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn constant_signal_sits_in_first_bin() {
        let estimate = NoiseEstimator::waveform(3, 0.1).estimate(&[-40.0; 64]);
        assert_eq!(estimate.mode_index, 0);
        assert_eq!(estimate.std_index, 0);
        assert_close(estimate.threshold, -39.9);
    }

    #[test]
    fn empty_histogram_does_not_divide_by_zero() {
        let estimate = NoiseEstimator::waveform(3, 0.1).estimate(&[]);
        assert_eq!(estimate.mode_index, 0);
        assert_close(estimate.threshold, MIN_ENVELOPE_DB + 0.1);

        let nan = NoiseEstimator::waveform(3, 0.1).estimate(&[f32::NAN; 4]);
        assert!(nan.threshold.is_finite());
    }

    #[test]
    fn levels_below_floor_are_excluded() {
        // -80 dB lies below the -60 dB floor; -50.05 lands in the last bin,
        // so the mode is clamped to index 94.
        let mut samples = vec![-80.0];
        samples.extend(std::iter::repeat_n(-50.05, 10));
        let estimate = NoiseEstimator::waveform(3, 0.1).estimate(&samples);
        assert_close(estimate.min_level, -60.0);
        assert_eq!(estimate.mode_index, 94);
    }

    #[test]
    fn mode_and_std_follow_the_walk_below_the_mode() {
        let estimator = NoiseEstimator::new(HistogramRange::DataRange, 10, 1, 0.5);
        let histogram = [1.0, 1.0, 1.0, 1.0, 1.0, 10.0, 0.0, 0.0, 0.0, 0.0];
        let estimate = estimator.summarize(&histogram, 0.0, 1.0);

        // 68% of 15 is 10.2: the mode bin alone holds 10, one more step crosses.
        assert_eq!(estimate.mode_index, 5);
        assert_eq!(estimate.std_index, 1);
        assert_close(estimate.mode, 6.0);
        assert_close(estimate.std, 4.0);
        assert_close(estimate.threshold, 8.0);
    }

    #[test]
    fn mode_upper_bound_is_index_94_of_100() {
        assert_eq!(mode_upper_bound(100), 94);
        assert_eq!(mode_upper_bound(1), 0);
    }

    #[test]
    fn estimate_is_repeatable() {
        let samples: Vec<f32> = (0..500).map(|i| -55.0 + (i % 37) as f32 * 0.21).collect();
        let estimator = NoiseEstimator::waveform(3, 0.1);
        assert_eq!(estimator.estimate(&samples), estimator.estimate(&samples));
    }

    #[test]
    fn envelope_takes_frame_maxima() {
        let env = envelope(&[1.0, 3.0, 2.0, 5.0, 4.0], 2);
        assert_eq!(env, vec![3.0, 5.0]);
        assert_eq!(envelope(&[1.0, 2.0], 8), vec![2.0]);
        assert!(envelope(&[], 8).is_empty());
    }

    #[test]
    fn waveform_denoise_preserves_length_and_clips() {
        let signal: Vec<f32> = (0..4096)
            .map(|i| if i % 700 == 0 { -10.0 } else { -45.0 + (i % 13) as f32 * 0.3 })
            .collect();
        let denoised = WaveformDenoiser::new(64).denoise(&signal);

        assert_eq!(denoised.samples.len(), signal.len());
        assert!(denoised.samples.iter().all(|&x| x >= 0.0));
        assert!(denoised.noise_threshold > -60.0 && denoised.noise_threshold < -30.0);
    }

    #[test]
    fn spectral_constant_rows_denoise_to_zero() {
        let power = vec![vec![0.25; 64]; 6];
        let denoised = SpectrogramDenoiser::default().denoise(&power);
        assert_eq!(denoised.len(), 6);
        for row in &denoised {
            assert_eq!(row.len(), 64);
            assert!(row.iter().all(|&p| p.abs() < 1e-6));
        }
    }

    #[test]
    fn spectral_denoise_keeps_peaks() {
        let mut row: Vec<f32> = (0..256).map(|i| 0.01 + (i % 5) as f32 * 0.001).collect();
        row[100] = 5.0;
        let power = vec![row; 4];
        let denoised = SpectrogramDenoiser::default().denoise(&power);

        for row in &denoised {
            assert!(row[100] > 4.0);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn spectral_thresholds_are_smoothed_across_bins() {
        let power = vec![vec![1.0; 16], vec![1.0; 16], vec![4.0; 16]];
        let thresholds = SpectrogramDenoiser::new(5, 0.1).thresholds(&power);
        assert_close(thresholds[0], 1.0);
        assert_close(thresholds[1], 1.0);
        assert_close(thresholds[2], 2.0);
    }

    #[test]
    fn decibel_conversions() {
        assert_close(amplitude_to_db(&[1.0])[0], 0.0);
        assert_close(amplitude_to_db(&[-0.1])[0], -20.0);
        assert_close(amplitude_to_db(&[0.0])[0], -200.0);
        assert_close(power_to_db(&[0.01])[0], -20.0);
    }
}
