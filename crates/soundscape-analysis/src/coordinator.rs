//! Orchestration of whole-recording index analysis.
//!
//! [`AnalysisCoordinator`] validates a request, fans segments out to a
//! [`WorkerPool`], merges each finished segment into preallocated rows with a
//! [`ResultMerger`], and inserts the completed matrices into its
//! [`SpectrogramStore`]. Failures of one index on one segment are logged and
//! leave that row at zero.

use std::collections::BTreeMap;
use std::path::Path;

use crate::analyzer::SegmentAnalysis;
use crate::config::{AnalysisConfig, NUM_FREQUENCY_BINS};
use crate::error::{AnalysisError, Result};
use crate::export::{read_index_table, write_index_table};
use crate::indices::{AcousticIndex, BuiltinIndices, IndexLibrary, parse_indices};
use crate::pool::{WorkerPool, analyze_segment, source_failure};
use crate::source::AudioSource;
use crate::spectrogram::Spectrogram;
use crate::store::{IndexMatrix, SpectrogramStore};

/// Writes per-segment rows into preallocated matrices.
///
/// Rows are addressed by segment number, so the merged result does not depend
/// on the order segments are merged in.
#[derive(Debug, Clone)]
pub struct ResultMerger {
    indices: Vec<AcousticIndex>,
    matrices: Vec<IndexMatrix>,
}

impl ResultMerger {
    /// Zero-filled `segments × bins` matrix for each index.
    pub fn new(indices: &[AcousticIndex], segments: usize, bins: usize) -> Self {
        Self {
            indices: indices.to_vec(),
            matrices: indices.iter().map(|_| IndexMatrix::zeros(segments, bins)).collect(),
        }
    }

    /// Copy the rows of `results` into row `segment`.
    ///
    /// Indices missing from `results` keep their zero row. Rows of the wrong
    /// width and out-of-range segments are skipped.
    pub fn merge(&mut self, segment: usize, results: &BTreeMap<AcousticIndex, Vec<f32>>) {
        for (index, matrix) in self.indices.iter().zip(&mut self.matrices) {
            let Some(values) = results.get(index) else {
                continue;
            };
            match matrix.row_mut(segment) {
                Some(row) if row.len() == values.len() => row.copy_from_slice(values),
                _ => tracing::warn!(
                    segment,
                    index = %index,
                    "discarding row that does not fit the result matrix"
                ),
            }
        }
    }

    /// The merged matrices, in request order.
    pub fn finish(self) -> Vec<(AcousticIndex, IndexMatrix)> {
        self.indices.into_iter().zip(self.matrices).collect()
    }
}

fn log_failures(analysis: &SegmentAnalysis, segment: usize, timestamp: f64) {
    for (index, error) in &analysis.failures {
        tracing::warn!(
            segment,
            timestamp,
            index = %index,
            error = %error,
            "index computation failed, row left at zero"
        );
    }
}

/// Computes, stores and persists acoustic indices for one audio source.
pub struct AnalysisCoordinator<S, L = BuiltinIndices> {
    source: S,
    library: L,
    config: AnalysisConfig,
    store: SpectrogramStore,
}

impl<S: AudioSource + Sync> AnalysisCoordinator<S> {
    /// Coordinator using the built-in index library.
    pub fn new(source: S) -> Self {
        Self::with_library(source, BuiltinIndices)
    }
}

impl<S, L> AnalysisCoordinator<S, L>
where
    S: AudioSource + Sync,
    L: IndexLibrary + Sync,
{
    /// Coordinator using a custom index library.
    pub fn with_library(source: S, library: L) -> Self {
        let store = SpectrogramStore::new(source.sample_rate());
        Self {
            source,
            library,
            config: AnalysisConfig::default(),
            store,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The audio source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The result store.
    pub fn spectrogram(&self) -> &SpectrogramStore {
        &self.store
    }

    /// Consume the coordinator, keeping the result store.
    pub fn into_spectrogram(self) -> SpectrogramStore {
        self.store
    }

    /// Start time of every segment in seconds.
    pub fn timestamps(&self) -> Vec<f64> {
        (0..self.source.number_of_segments())
            .map(|i| self.source.segment_to_timestamp(i))
            .collect()
    }

    /// Parse and validate a request: known names, deduplicated, non-empty,
    /// within the configured limit.
    pub fn validate_request<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<AcousticIndex>> {
        let indices = parse_indices(names)?;
        if indices.is_empty() {
            return Err(AnalysisError::NoIndices);
        }
        if indices.len() > self.config.max_indices {
            return Err(AnalysisError::TooManyIndices {
                requested: indices.len(),
                max: self.config.max_indices,
            });
        }
        Ok(indices)
    }

    fn result_shape(&self) -> Result<(usize, usize)> {
        let segments = self.source.number_of_segments();
        if segments == 0 {
            return Err(AnalysisError::Source("audio source has no segments".to_string()));
        }
        let shape = (segments, NUM_FREQUENCY_BINS);
        match self.store.shape() {
            Some(expected) if expected != shape => Err(AnalysisError::ShapeMismatch {
                expected,
                actual: shape,
            }),
            _ => Ok(shape),
        }
    }

    /// Compute every requested index not already in the store, over all segments.
    pub fn calculate_indices<N: AsRef<str>>(&mut self, names: &[N]) -> Result<()> {
        self.calculate_indices_with_progress(names, |_, _| {})
    }

    /// [`calculate_indices`](Self::calculate_indices), calling
    /// `progress(done, total)` after each segment.
    pub fn calculate_indices_with_progress<N, P>(
        &mut self,
        names: &[N],
        mut progress: P,
    ) -> Result<()>
    where
        N: AsRef<str>,
        P: FnMut(usize, usize),
    {
        let requested = self.validate_request(names)?;
        let pending: Vec<AcousticIndex> = requested
            .into_iter()
            .filter(|index| !self.store.contains(index.name()))
            .collect();
        if pending.is_empty() {
            tracing::info!("requested indices are already calculated");
            return Ok(());
        }

        let (segments, bins) = self.result_shape()?;
        let pool = WorkerPool::new(self.config.worker_count());
        let names: Vec<&str> = pending.iter().map(|index| index.name()).collect();
        tracing::info!(
            indices = ?names,
            segments,
            workers = pool.workers(),
            "calculating indices"
        );

        let mut merger = ResultMerger::new(&pending, segments, bins);
        let source = &self.source;
        let mut done = 0;
        let mut failures = 0;
        pool.run(source, &self.library, &pending, |outcome| {
            let timestamp = source.segment_to_timestamp(outcome.segment);
            log_failures(&outcome.analysis, outcome.segment, timestamp);
            failures += outcome.analysis.failures.len();
            merger.merge(outcome.segment, &outcome.analysis.results);
            done += 1;
            progress(done, segments);
        });

        for (index, matrix) in merger.finish() {
            self.store.add_index(index.name(), matrix)?;
        }
        tracing::info!(segments, failures, "finished calculating indices");
        Ok(())
    }

    /// Compute the requested indices for segment `segment` only and write
    /// its rows, establishing the store shape if needed.
    ///
    /// Returns the indices that failed; their rows are written as zeros.
    pub fn calculate_segment<N: AsRef<str>>(
        &mut self,
        segment: usize,
        names: &[N],
    ) -> Result<Vec<(AcousticIndex, AnalysisError)>> {
        let requested = self.validate_request(names)?;
        let (segments, bins) = self.result_shape()?;
        if segment >= segments {
            return Err(AnalysisError::RowOutOfRange {
                index: segment,
                rows: segments,
            });
        }

        let mut analysis = match self.source.segment(segment) {
            Ok(audio) => analyze_segment(&audio, &self.library, &requested),
            Err(error) => source_failure(&requested, &error),
        };
        log_failures(&analysis, segment, self.source.segment_to_timestamp(segment));

        let rows: Vec<(&str, Vec<f32>)> = requested
            .iter()
            .map(|index| {
                let row = analysis
                    .results
                    .remove(index)
                    .unwrap_or_else(|| vec![0.0; bins]);
                (index.name(), row)
            })
            .collect();

        self.store.ensure_shape((segments, bins))?;
        self.store.add_segment(segment, &rows)?;
        tracing::debug!(segment, indices = rows.len(), "segment calculated");
        Ok(analysis.failures)
    }

    /// Replace the store with the contents of an index table.
    ///
    /// The current store is kept if the file cannot be read or parsed. A
    /// warning is logged when the saved timestamps differ from the source's
    /// segment start times, since [`save_indices`](Self::save_indices)
    /// rewrites them from the source.
    pub fn load_indices(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let table = read_index_table(path)?;
        let expected = self.timestamps();
        let matches = table.timestamps.len() == expected.len()
            && table
                .timestamps
                .iter()
                .zip(&expected)
                .all(|(saved, current)| (saved - current).abs() <= 1e-6);
        if !matches {
            tracing::warn!(
                path = %path.display(),
                saved = ?table.timestamps,
                current = ?expected,
                "saved timestamps differ from the source's segment layout"
            );
        }
        self.store = table.into_store(self.source.sample_rate())?;
        Ok(())
    }

    /// Write the store to an index table.
    pub fn save_indices(&self, path: impl AsRef<Path>) -> Result<()> {
        let rows = self.store.shape().map_or(0, |(rows, _)| rows);
        let timestamps: Vec<f64> = (0..rows)
            .map(|i| self.source.segment_to_timestamp(i))
            .collect();
        write_index_table(&self.store, &timestamps, path)
    }

    /// Magnitude STFT of the whole source.
    pub fn stft(&self, fft_size: usize, hop_size: usize) -> Result<Spectrogram> {
        self.source.stft(fft_size, hop_size)
    }
}
