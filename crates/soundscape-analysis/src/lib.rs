//! Soundscape Analysis - long-duration acoustic index maps
//!
//! Recordings are split into fixed-length segments; every segment yields one
//! 256-bin row per acoustic index, and the rows of all segments form a
//! "long-duration spectrogram" per index.
//!
//! - [`smoothing`] - causal moving average
//! - [`noise`] - histogram-mode noise estimation and waveform/spectrogram denoising
//! - [`fft`] / [`spectrogram`] - windowed FFT and STFT power surfaces
//! - [`segment`] / [`source`] - lazily derived segment data and segmented sources
//! - [`indices`] - index registry and built-in index formulas
//! - [`analyzer`] - per-segment evaluation with shared base computations
//! - [`pool`] - segment-parallel workers
//! - [`coordinator`] - request validation, fan-out, merge, persistence
//! - [`store`] - shape-checked result store
//! - [`export`] - CSV index tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use soundscape_analysis::{AnalysisCoordinator, InMemorySource};
//!
//! # fn main() -> soundscape_analysis::Result<()> {
//! let samples = vec![0.0f32; 22050 * 180];
//! let source = InMemorySource::new(samples, 22050, 60.0);
//!
//! let mut coordinator = AnalysisCoordinator::new(source);
//! coordinator.calculate_indices(&["Ht", "Hf", "ACI"])?;
//! coordinator.save_indices("indices.csv")?;
//!
//! let aci = coordinator.spectrogram().result("ACI")?;
//! assert_eq!(aci.shape(), (3, 256));
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod fft;
pub mod indices;
pub mod noise;
pub mod pool;
pub mod segment;
pub mod smoothing;
pub mod source;
pub mod spectrogram;
pub mod store;

pub use analyzer::{SegmentAnalysis, SegmentAnalyzer};
pub use config::{AnalysisConfig, NUM_FREQUENCY_BINS, NoiseConfig, StftConfig};
pub use coordinator::{AnalysisCoordinator, ResultMerger};
pub use error::{AnalysisError, Result};
pub use export::{IndexTable, read_index_table, write_index_table};
pub use fft::{Fft, Window};
pub use indices::{AcousticIndex, BuiltinIndices, Computation, IndexLibrary, IndexValue};
pub use noise::{
    DenoisedWaveform, NoiseEstimate, NoiseEstimator, SpectrogramDenoiser, WaveformDenoiser,
};
pub use pool::WorkerPool;
pub use segment::{AudioSegment, SegmentSettings};
pub use smoothing::moving_average;
pub use source::{AudioSource, InMemorySource};
pub use spectrogram::{PowerSpectrogram, Spectrogram, StftAnalyzer};
pub use store::{IndexMatrix, SpectrogramStore};
