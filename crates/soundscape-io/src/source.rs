//! File-backed segmented source.

use std::path::{Path, PathBuf};

use soundscape_analysis::source::{segment_count, segment_length};
use soundscape_analysis::{
    AnalysisConfig, AnalysisError, AudioSegment, AudioSource, SegmentSettings,
};

use crate::wav::{WavInfo, read_frames, read_wav_info};
use crate::{Error, Result};

/// A WAV recording split into fixed-duration segments.
///
/// Only the header is read on open. Each call to
/// [`segment`](AudioSource::segment) reopens the file, seeks to the segment's
/// first frame and decodes that segment alone, so workers can pull segments
/// concurrently without holding the whole recording in memory.
#[derive(Debug, Clone)]
pub struct WavSource {
    path: PathBuf,
    info: WavInfo,
    segment_duration: f64,
    segment_len: usize,
    denoise: bool,
    settings: SegmentSettings,
}

impl WavSource {
    /// Open `path` and split it into `segment_duration_secs` segments.
    pub fn open<P: AsRef<Path>>(path: P, segment_duration_secs: f64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let info = read_wav_info(&path)?;
        let segment_len = segment_length(segment_duration_secs, info.sample_rate);

        tracing::debug!(
            path = %path.display(),
            channels = info.channels,
            sample_rate = info.sample_rate,
            frames = info.num_frames,
            segment_len,
            "opened recording"
        );

        Ok(Self {
            path,
            info,
            segment_duration: segment_duration_secs,
            segment_len,
            denoise: true,
            settings: SegmentSettings::default(),
        })
    }

    /// Open `path` with the segment duration, denoise flag and derivation
    /// settings of an analysis configuration.
    pub fn from_config<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::open(path, config.segment_duration_secs)?
            .with_denoise(config.denoise)
            .with_settings(SegmentSettings::from(config)))
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

    /// Path of the recording.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header metadata read on open.
    pub fn info(&self) -> &WavInfo {
        &self.info
    }

    /// Frames per full segment.
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Decode the mono samples of segment `index`.
    pub fn read_segment(&self, index: usize) -> Result<Vec<f32>> {
        let count = self.number_of_segments();
        if index >= count {
            return Err(Error::SegmentOutOfRange { index, count });
        }
        let start = index as u64 * self.segment_len as u64;
        read_frames(&self.path, start, self.segment_len)
    }
}

impl AudioSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    fn number_of_segments(&self) -> usize {
        let frames = usize::try_from(self.info.num_frames).unwrap_or(usize::MAX);
        segment_count(frames, self.segment_len)
    }

    fn segment(&self, index: usize) -> soundscape_analysis::Result<AudioSegment> {
        let samples = self
            .read_segment(index)
            .map_err(|err| AnalysisError::Source(format!("{}: {err}", self.path.display())))?;

        Ok(AudioSegment::new(samples, self.info.sample_rate)
            .with_denoise(self.denoise)
            .with_settings(self.settings))
    }
}
