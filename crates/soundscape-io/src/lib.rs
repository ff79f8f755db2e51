//! Audio file access for soundscape analysis.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav_info`], [`read_frames`] and [`write_wav`]
//! - **Segmented sources**: [`WavSource`], an [`AudioSource`](soundscape_analysis::AudioSource)
//!   that seeks to and decodes one segment at a time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use soundscape_analysis::AnalysisCoordinator;
//! use soundscape_io::WavSource;
//!
//! let source = WavSource::open("dawn_chorus.wav", 60.0)?;
//! let mut coordinator = AnalysisCoordinator::new(source);
//! coordinator.calculate_indices(&["Ht", "Hf", "ACI"])?;
//! coordinator.save_indices("dawn_chorus.csv")?;
//! ```

mod source;
mod wav;

pub use source::WavSource;
pub use wav::{WavFormat, WavInfo, WavSpec, read_frames, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Requested segment lies past the end of the recording.
    #[error("Segment {index} out of range ({count} segments)")]
    SegmentOutOfRange {
        /// Requested segment
        index: usize,
        /// Segments in the recording
        count: usize,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
