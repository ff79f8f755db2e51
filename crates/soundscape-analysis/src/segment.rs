//! Fixed-length audio segments with lazily derived waveform and spectrogram

use std::cell::OnceCell;

use crate::config::{AnalysisConfig, NoiseConfig, StftConfig};
use crate::fft::Window;
use crate::noise::{SpectrogramDenoiser, WaveformDenoiser, amplitude_to_db};
use crate::spectrogram::{PowerSpectrogram, StftAnalyzer};

/// Parameters a segment needs to derive its waveform and spectrogram.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentSettings {
    /// Noise engine parameters
    pub noise: NoiseConfig,
    /// Spectrogram parameters
    pub stft: StftConfig,
}

impl From<&AnalysisConfig> for SegmentSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            noise: config.noise,
            stft: config.stft,
        }
    }
}

#[derive(Debug, Clone)]
struct DerivedWaveform {
    samples: Vec<f32>,
    noise: f32,
}

/// A contiguous slice of a recording, the unit of index computation.
///
/// The decibel waveform, its noise floor, and the power spectrogram are
/// computed on first access and cached for the lifetime of the segment.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    denoise: bool,
    settings: SegmentSettings,
    waveform: OnceCell<DerivedWaveform>,
    spectrogram: OnceCell<PowerSpectrogram>,
}

impl AudioSegment {
    /// Create a segment with default settings and denoising enabled.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            denoise: true,
            settings: SegmentSettings::default(),
            waveform: OnceCell::new(),
            spectrogram: OnceCell::new(),
        }
    }

    /// Enable or disable denoising of the derived values.
    pub fn with_denoise(mut self, denoise: bool) -> Self {
        self.denoise = denoise;
        self.waveform = OnceCell::new();
        self.spectrogram = OnceCell::new();
        self
    }

    /// Replace the derivation settings.
    pub fn with_settings(mut self, settings: SegmentSettings) -> Self {
        self.settings = settings;
        self.waveform = OnceCell::new();
        self.spectrogram = OnceCell::new();
        self
    }

    /// Raw samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether derived values are denoised.
    pub fn denoise(&self) -> bool {
        self.denoise
    }

    /// Derivation settings.
    pub fn settings(&self) -> &SegmentSettings {
        &self.settings
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    fn derived_waveform(&self) -> &DerivedWaveform {
        self.waveform.get_or_init(|| {
            let db = amplitude_to_db(&self.samples);
            let denoiser = WaveformDenoiser::from_config(&self.settings.noise);
            if self.denoise {
                let denoised = denoiser.denoise(&db);
                DerivedWaveform {
                    samples: denoised.samples,
                    noise: denoised.noise_threshold,
                }
            } else {
                let noise = denoiser.noise_threshold(&db);
                DerivedWaveform { samples: db, noise }
            }
        })
    }

    /// Decibel-scaled amplitude, denoised when denoising is enabled.
    pub fn waveform(&self) -> &[f32] {
        &self.derived_waveform().samples
    }

    /// Background noise level of the decibel waveform.
    pub fn noise(&self) -> f32 {
        self.derived_waveform().noise
    }

    /// Hamming-windowed power spectrogram `[bin][frame]`, denoised when
    /// denoising is enabled.
    pub fn spectrogram(&self) -> &PowerSpectrogram {
        self.spectrogram.get_or_init(|| {
            let stft = self.settings.stft;
            let analyzer = StftAnalyzer::new(
                self.sample_rate as f32,
                stft.fft_size,
                stft.hop_size,
                Window::Hamming,
            );
            let mut spectrogram = analyzer.analyze_power(&self.samples);
            if self.denoise {
                let denoiser = SpectrogramDenoiser::from_config(&self.settings.noise);
                spectrogram.power = denoiser.denoise(&spectrogram.power);
            }
            spectrogram
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * std::f32::consts::PI * 1500.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn waveform_matches_input_length() {
        let segment = AudioSegment::new(tone(22050, 0.5), 22050);
        assert_eq!(segment.waveform().len(), segment.samples().len());
        assert!(segment.waveform().iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn derived_values_are_cached() {
        let segment = AudioSegment::new(tone(22050, 0.5), 22050);
        let first = segment.spectrogram() as *const PowerSpectrogram;
        let second = segment.spectrogram() as *const PowerSpectrogram;
        assert_eq!(first, second);
        assert_eq!(segment.noise(), segment.noise());
    }

    #[test]
    fn undenoised_waveform_is_decibels() {
        let segment = AudioSegment::new(vec![1.0, 0.1, 0.0], 22050).with_denoise(false);
        let waveform = segment.waveform();
        assert!((waveform[0] - 0.0).abs() < 1e-4);
        assert!((waveform[1] + 20.0).abs() < 1e-4);
        assert!(segment.noise().is_finite());
    }

    #[test]
    fn spectrogram_has_256_bins() {
        let segment = AudioSegment::new(tone(22050, 1.0), 22050);
        let spectrogram = segment.spectrogram();
        assert_eq!(spectrogram.num_bins(), 256);
        assert!(spectrogram.num_frames() > 0);
        assert!(spectrogram.power.iter().flatten().all(|&p| p >= 0.0));
    }

    #[test]
    fn duration_from_sample_count() {
        let segment = AudioSegment::new(vec![0.0; 44100], 22050);
        assert!((segment.duration_secs() - 2.0).abs() < 1e-9);
    }
}
