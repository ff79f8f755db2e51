//! Segmented audio sources
//!
//! An [`AudioSource`] yields fixed-length [`AudioSegment`]s in order. Decoding
//! and file access live behind the trait; [`InMemorySource`] segments a sample
//! buffer that is already loaded.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::fft::Window;
use crate::segment::{AudioSegment, SegmentSettings};
use crate::spectrogram::{Spectrogram, StftAnalyzer};

/// A recording split into fixed-duration segments.
pub trait AudioSource {
    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Nominal segment duration in seconds.
    fn segment_duration(&self) -> f64;

    /// Number of segments, counting a trailing partial segment.
    fn number_of_segments(&self) -> usize;

    /// Produce segment `index`.
    fn segment(&self, index: usize) -> Result<AudioSegment>;

    /// Start time of segment `index` in seconds.
    fn segment_to_timestamp(&self, index: usize) -> f64 {
        index as f64 * self.segment_duration()
    }

    /// Iterate over all segments in order.
    fn segments(&self) -> Segments<'_, Self>
    where
        Self: Sized,
    {
        Segments {
            source: self,
            next: 0,
        }
    }

    /// Magnitude STFT of the whole recording.
    fn stft(&self, fft_size: usize, hop_size: usize) -> Result<Spectrogram> {
        if fft_size == 0 {
            return Err(AnalysisError::InvalidInput("FFT size must be positive".to_string()));
        }
        let mut signal = Vec::new();
        for index in 0..self.number_of_segments() {
            signal.extend_from_slice(self.segment(index)?.samples());
        }
        let analyzer =
            StftAnalyzer::new(self.sample_rate() as f32, fft_size, hop_size, Window::Hann);
        Ok(analyzer.analyze(&signal))
    }
}

/// In-order iterator over the segments of a source.
pub struct Segments<'a, S> {
    source: &'a S,
    next: usize,
}

impl<S: AudioSource> Iterator for Segments<'_, S> {
    type Item = Result<AudioSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.source.number_of_segments() {
            return None;
        }
        let segment = self.source.segment(self.next);
        self.next += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.source.number_of_segments().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Number of segments of `segment_len` needed to cover `total` samples.
pub fn segment_count(total: usize, segment_len: usize) -> usize {
    if segment_len == 0 {
        return 0;
    }
    total.div_ceil(segment_len)
}

/// Samples per segment for a duration, at least one.
pub fn segment_length(segment_duration_secs: f64, sample_rate: u32) -> usize {
    ((segment_duration_secs * sample_rate as f64).round() as usize).max(1)
}

/// Source over a mono sample buffer held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    samples: Vec<f32>,
    sample_rate: u32,
    segment_duration: f64,
    segment_len: usize,
    denoise: bool,
    settings: SegmentSettings,
}

impl InMemorySource {
    /// Create a source splitting `samples` into `segment_duration_secs` segments.
    pub fn new(samples: Vec<f32>, sample_rate: u32, segment_duration_secs: f64) -> Self {
        Self {
            samples,
            sample_rate,
            segment_duration: segment_duration_secs,
            segment_len: segment_length(segment_duration_secs, sample_rate),
            denoise: true,
            settings: SegmentSettings::default(),
        }
    }

    /// Create a source from an analysis configuration.
    pub fn from_config(samples: Vec<f32>, sample_rate: u32, config: &AnalysisConfig) -> Self {
        Self::new(samples, sample_rate, config.segment_duration_secs)
            .with_denoise(config.denoise)
            .with_settings(SegmentSettings::from(config))
    }

    /// Enable or disable segment denoising.
    pub fn with_denoise(mut self, denoise: bool) -> Self {
        self.denoise = denoise;
        self
    }

    /// Replace the settings handed to every segment.
    pub fn with_settings(mut self, settings: SegmentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for InMemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    fn number_of_segments(&self) -> usize {
        segment_count(self.samples.len(), self.segment_len)
    }

    fn segment(&self, index: usize) -> Result<AudioSegment> {
        let count = self.number_of_segments();
        if index >= count {
            return Err(AnalysisError::Source(format!(
                "segment {index} out of range ({count} segments)"
            )));
        }
        let start = index * self.segment_len;
        let end = (start + self.segment_len).min(self.samples.len());

        Ok(AudioSegment::new(self.samples[start..end].to_vec(), self.sample_rate)
            .with_denoise(self.denoise)
            .with_settings(self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_trailing_segment_is_counted() {
        let source = InMemorySource::new(vec![0.0; 2500], 1000, 1.0);
        assert_eq!(source.number_of_segments(), 3);
        assert_eq!(source.segment(2).unwrap().samples().len(), 500);
        assert!(source.segment(3).is_err());
    }

    #[test]
    fn timestamps_follow_segment_duration() {
        let source = InMemorySource::new(vec![0.0; 10], 10, 0.5);
        assert_eq!(source.segment_to_timestamp(0), 0.0);
        assert_eq!(source.segment_to_timestamp(3), 1.5);
    }

    #[test]
    fn segments_iterate_in_order() {
        let samples: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let source = InMemorySource::new(samples, 10, 1.0);
        let firsts: Vec<f32> = source
            .segments()
            .map(|segment| segment.unwrap().samples()[0])
            .collect();
        assert_eq!(firsts, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn segments_inherit_denoise_flag() {
        let source = InMemorySource::new(vec![0.0; 10], 10, 1.0).with_denoise(false);
        assert!(!source.segment(0).unwrap().denoise());
    }

    #[test]
    fn stft_covers_whole_source() {
        let source = InMemorySource::new(vec![0.1; 4096], 8000, 0.25);
        let stft = source.stft(1024, 512).unwrap();
        assert_eq!(stft.num_frames, (4096 - 1024) / 512 + 1);
        assert!(source.stft(0, 512).is_err());
    }

    #[test]
    fn segment_count_edge_cases() {
        assert_eq!(segment_count(0, 10), 0);
        assert_eq!(segment_count(10, 0), 0);
        assert_eq!(segment_count(11, 10), 2);
    }
}
