//! STFT-based spectrogram generation
//!
//! [`StftAnalyzer::analyze`] produces a magnitude [`Spectrogram`] laid out
//! `[time_frame][frequency_bin]`, used for whole-recording views.
//! [`StftAnalyzer::analyze_power`] produces the per-segment [`PowerSpectrogram`]
//! laid out `[frequency_bin][time_frame]` that the spectral indices consume.

use crate::fft::{Fft, Window};

/// Magnitude spectrogram
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// 2D magnitude data `[time_frame][frequency_bin]`
    pub data: Vec<Vec<f32>>,
    /// FFT size used
    pub fft_size: usize,
    /// Hop size between frames
    pub hop_size: usize,
    /// Sample rate
    pub sample_rate: f32,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins (fft_size / 2 + 1)
    pub num_bins: usize,
}

impl Spectrogram {
    /// Get frequency in Hz for a given bin index
    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / self.fft_size as f32
    }

    /// Get time in seconds for a given frame index
    pub fn frame_to_time(&self, frame: usize) -> f32 {
        frame as f32 * self.hop_size as f32 / self.sample_rate
    }

    /// Get duration in seconds
    pub fn duration(&self) -> f32 {
        self.frame_to_time(self.num_frames)
    }

    /// Get the spectrum for a specific time frame
    pub fn get_frame(&self, frame: usize) -> Option<&[f32]> {
        self.data.get(frame).map(|v| v.as_slice())
    }

    /// Convert to dB scale
    pub fn to_db(&self) -> Spectrogram {
        let data = self
            .data
            .iter()
            .map(|frame| frame.iter().map(|&m| 20.0 * m.max(1e-10).log10()).collect())
            .collect();

        Spectrogram {
            data,
            fft_size: self.fft_size,
            hop_size: self.hop_size,
            sample_rate: self.sample_rate,
            num_frames: self.num_frames,
            num_bins: self.num_bins,
        }
    }
}

/// Power spectral density of one segment
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrogram {
    /// Power `[frequency_bin][time_frame]`, Nyquist bin dropped
    pub power: Vec<Vec<f32>>,
    /// Frame centres in seconds
    pub times: Vec<f32>,
    /// Bin frequencies in Hz
    pub frequencies: Vec<f32>,
}

impl PowerSpectrogram {
    /// Number of frequency bins
    pub fn num_bins(&self) -> usize {
        self.power.len()
    }

    /// Number of time frames
    pub fn num_frames(&self) -> usize {
        self.times.len()
    }

    /// Frequency spacing between adjacent bins in Hz
    pub fn bin_width(&self) -> f32 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Bins whose centre frequency lies in `[low_hz, high_hz)`
    pub fn bins_in(&self, low_hz: f32, high_hz: f32) -> std::ops::Range<usize> {
        let start = self
            .frequencies
            .iter()
            .position(|&f| f >= low_hz)
            .unwrap_or(self.frequencies.len());
        let end = self
            .frequencies
            .iter()
            .position(|&f| f >= high_hz)
            .unwrap_or(self.frequencies.len());
        start..end.max(start)
    }

    /// Same surface with every value replaced by its square root (amplitude)
    pub fn amplitude(&self) -> Vec<Vec<f32>> {
        self.power
            .iter()
            .map(|row| row.iter().map(|&p| p.max(0.0).sqrt()).collect())
            .collect()
    }
}

/// STFT (Short-Time Fourier Transform) analyzer
pub struct StftAnalyzer {
    fft_size: usize,
    hop_size: usize,
    window: Window,
    sample_rate: f32,
    fft: Fft,
    window_coeffs: Vec<f32>,
}

impl StftAnalyzer {
    /// Create a new STFT analyzer
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `fft_size` - FFT size (power of 2 recommended)
    /// * `hop_size` - Hop size between frames
    /// * `window` - Window function to use
    pub fn new(sample_rate: f32, fft_size: usize, hop_size: usize, window: Window) -> Self {
        let fft = Fft::new(fft_size);
        let window_coeffs = window.coefficients(fft_size);

        Self {
            fft_size,
            hop_size: hop_size.max(1),
            window,
            sample_rate,
            fft,
            window_coeffs,
        }
    }

    fn num_frames(&self, signal_len: usize) -> usize {
        if signal_len >= self.fft_size {
            (signal_len - self.fft_size) / self.hop_size + 1
        } else {
            0
        }
    }

    fn frame_spectrum(
        &self,
        signal: &[f32],
        frame_idx: usize,
    ) -> Vec<rustfft::num_complex::Complex<f32>> {
        let start = frame_idx * self.hop_size;
        let end = start + self.fft_size;

        let mut frame: Vec<f32> = signal[start..end.min(signal.len())].to_vec();
        frame.resize(self.fft_size, 0.0);

        for (sample, &coeff) in frame.iter_mut().zip(self.window_coeffs.iter()) {
            *sample *= coeff;
        }

        self.fft.forward(&frame)
    }

    /// Compute magnitude spectrogram from audio signal
    pub fn analyze(&self, signal: &[f32]) -> Spectrogram {
        let num_frames = self.num_frames(signal.len());
        let num_bins = self.fft_size / 2 + 1;

        let data = (0..num_frames)
            .map(|frame_idx| {
                self.frame_spectrum(signal, frame_idx)
                    .iter()
                    .map(|c| c.norm())
                    .collect()
            })
            .collect();

        Spectrogram {
            data,
            fft_size: self.fft_size,
            hop_size: self.hop_size,
            sample_rate: self.sample_rate,
            num_frames,
            num_bins,
        }
    }

    /// Compute a power spectral density surface `[bin][frame]`
    ///
    /// Power is `|X|² / (sample_rate · Σw²)`. The Nyquist bin is dropped so an
    /// FFT of size `N` yields `N / 2` bins.
    pub fn analyze_power(&self, signal: &[f32]) -> PowerSpectrogram {
        let num_frames = self.num_frames(signal.len());
        let num_bins = self.fft_size / 2;
        let window_energy: f32 = self.window_coeffs.iter().map(|w| w * w).sum();
        let scale = 1.0 / (self.sample_rate * window_energy).max(f32::MIN_POSITIVE);

        let mut power = vec![Vec::with_capacity(num_frames); num_bins];
        for frame_idx in 0..num_frames {
            let spectrum = self.frame_spectrum(signal, frame_idx);
            for (row, c) in power.iter_mut().zip(spectrum.iter()) {
                row.push(c.norm_sqr() * scale);
            }
        }

        let half_frame = self.fft_size as f32 / 2.0;
        let times = (0..num_frames)
            .map(|frame| (frame as f32 * self.hop_size as f32 + half_frame) / self.sample_rate)
            .collect();
        let frequencies = (0..num_bins)
            .map(|bin| bin as f32 * self.frequency_resolution())
            .collect();

        PowerSpectrogram {
            power,
            times,
            frequencies,
        }
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get hop size
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Get frequency resolution (Hz per bin)
    pub fn frequency_resolution(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Get the window function used
    pub fn window(&self) -> Window {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn generate_sine(sample_rate: f32, freq: f32, duration_secs: f32) -> Vec<f32> {
        let num_samples = (duration_secs * sample_rate) as usize;
        (0..num_samples)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_spectrogram_dimensions() {
        let sample_rate = 44100.0;
        let signal = generate_sine(sample_rate, 440.0, 1.0);

        let analyzer = StftAnalyzer::new(sample_rate, 1024, 512, Window::Hann);
        let spectrogram = analyzer.analyze(&signal);

        assert_eq!(spectrogram.num_bins, 513);
        assert!(spectrogram.num_frames > 0);
        assert_eq!(spectrogram.data.len(), spectrogram.num_frames);
        assert_eq!(spectrogram.data[0].len(), spectrogram.num_bins);
    }

    #[test]
    fn test_power_spectrogram_layout() {
        let sample_rate = 22050.0;
        let signal = generate_sine(sample_rate, 1000.0, 1.0);

        let analyzer = StftAnalyzer::new(sample_rate, 512, 256, Window::Hamming);
        let spec = analyzer.analyze_power(&signal);

        assert_eq!(spec.num_bins(), 256);
        assert_eq!(spec.num_frames(), (22050 - 512) / 256 + 1);
        assert!(spec.power.iter().all(|row| row.len() == spec.num_frames()));
        assert!((spec.bin_width() - 22050.0 / 512.0).abs() < 1e-3);
    }

    #[test]
    fn test_power_peak_bin() {
        let sample_rate = 22050.0;
        let freq = 2000.0;
        let signal = generate_sine(sample_rate, freq, 0.5);

        let analyzer = StftAnalyzer::new(sample_rate, 512, 256, Window::Hamming);
        let spec = analyzer.analyze_power(&signal);

        let (peak_bin, _) = spec
            .power
            .iter()
            .enumerate()
            .map(|(bin, row)| (bin, row[0]))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();
        assert!((spec.frequencies[peak_bin] - freq).abs() < 50.0);
    }

    #[test]
    fn test_short_signal_has_no_frames() {
        let analyzer = StftAnalyzer::new(22050.0, 512, 256, Window::Hamming);
        let spec = analyzer.analyze_power(&[0.0; 100]);
        assert_eq!(spec.num_bins(), 256);
        assert_eq!(spec.num_frames(), 0);
    }

    #[test]
    fn test_bins_in_band() {
        let spec = PowerSpectrogram {
            power: vec![vec![]; 4],
            times: vec![],
            frequencies: vec![0.0, 100.0, 200.0, 300.0],
        };
        assert_eq!(spec.bins_in(100.0, 300.0), 1..3);
        assert_eq!(spec.bins_in(500.0, 900.0), 4..4);
    }
}
