//! Per-segment index evaluation with memoized base computations.

use std::collections::{BTreeMap, HashMap};

use crate::config::NUM_FREQUENCY_BINS;
use crate::error::{AnalysisError, Result};
use crate::indices::{AcousticIndex, Computation, IndexLibrary, IndexValue};
use crate::segment::AudioSegment;

/// Results and failures of one segment's analysis.
#[derive(Debug, Default)]
pub struct SegmentAnalysis {
    /// One row of frequency-bin values per successfully computed index
    pub results: BTreeMap<AcousticIndex, Vec<f32>>,
    /// Indices whose computation failed, with the cause
    pub failures: Vec<(AcousticIndex, AnalysisError)>,
}

impl SegmentAnalysis {
    /// Every requested index failed with the same cause.
    pub fn failed(indices: &[AcousticIndex], error: impl Fn() -> AnalysisError) -> Self {
        Self {
            results: BTreeMap::new(),
            failures: indices.iter().map(|&index| (index, error())).collect(),
        }
    }

    /// Row for `index`, if it was computed.
    pub fn row(&self, index: AcousticIndex) -> Option<&[f32]> {
        self.results.get(&index).map(Vec::as_slice)
    }

    /// Whether every requested index succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes requested indices for one segment.
///
/// Each base computation is evaluated at most once per [`compute`](Self::compute)
/// call, so `Hf`, `HfVar` and `HfMax` share one spectral entropy evaluation.
/// Failed computations are not cached and are retried for the next index that
/// needs them.
pub struct SegmentAnalyzer<'a, L: ?Sized> {
    library: &'a L,
    num_bins: usize,
}

impl<'a, L: IndexLibrary + ?Sized> SegmentAnalyzer<'a, L> {
    /// Analyzer producing rows of [`NUM_FREQUENCY_BINS`] values.
    pub fn new(library: &'a L) -> Self {
        Self {
            library,
            num_bins: NUM_FREQUENCY_BINS,
        }
    }

    /// Override the row width.
    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    /// Row width of every result.
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Compute `indices` for `segment`, collecting per-index failures.
    pub fn compute(&self, segment: &AudioSegment, indices: &[AcousticIndex]) -> SegmentAnalysis {
        let mut memo = HashMap::new();
        let mut analysis = SegmentAnalysis::default();

        for &index in indices {
            match self.project(segment, index, &mut memo) {
                Ok(row) => {
                    analysis.results.insert(index, row);
                }
                Err(error) => analysis.failures.push((index, error)),
            }
        }

        analysis
    }

    fn project(
        &self,
        segment: &AudioSegment,
        index: AcousticIndex,
        memo: &mut HashMap<Computation, Vec<IndexValue>>,
    ) -> Result<Vec<f32>> {
        let computation = index.computation();
        self.resolve(segment, computation, memo)?;

        memo.get(&computation)
            .and_then(|values| values.get(index.component()))
            .cloned()
            .ok_or_else(|| {
                AnalysisError::computation(
                    computation.name(),
                    format!("no component {} for {index}", index.component()),
                )
            })?
            .into_bins(self.num_bins)
    }

    fn resolve(
        &self,
        segment: &AudioSegment,
        computation: Computation,
        memo: &mut HashMap<Computation, Vec<IndexValue>>,
    ) -> Result<()> {
        if memo.contains_key(&computation) {
            return Ok(());
        }

        let dependencies = computation.dependencies();
        for &dependency in dependencies {
            self.resolve(segment, dependency, memo)?;
        }

        let inputs: Vec<&[IndexValue]> = dependencies
            .iter()
            .filter_map(|dependency| memo.get(dependency).map(Vec::as_slice))
            .collect();
        let values = self.library.evaluate(computation, segment, &inputs)?;

        tracing::trace!(computation = ?computation, components = values.len(), "evaluated");
        memo.insert(computation, values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Library that counts evaluations and fails the computations it is told to.
    #[derive(Default)]
    struct CountingLibrary {
        calls: Mutex<Vec<Computation>>,
        failing: Vec<Computation>,
    }

    impl IndexLibrary for CountingLibrary {
        fn evaluate(
            &self,
            computation: Computation,
            _segment: &AudioSegment,
            inputs: &[&[IndexValue]],
        ) -> Result<Vec<IndexValue>> {
            self.calls.lock().unwrap().push(computation);
            if self.failing.contains(&computation) {
                return Err(AnalysisError::computation(computation.name(), "forced"));
            }
            Ok(match computation {
                Computation::SpectralEntropy => vec![
                    IndexValue::Scalar(0.1),
                    IndexValue::Scalar(0.2),
                    IndexValue::Scalar(0.3),
                ],
                Computation::AcousticComplexity => {
                    vec![IndexValue::Bins((0..4).map(|i| i as f32).collect())]
                }
                Computation::AcousticEntropy => {
                    let ht = inputs[0][0].as_scalar().unwrap();
                    let hf = inputs[1][0].as_scalar().unwrap();
                    vec![IndexValue::Scalar(ht * hf)]
                }
                _ => vec![IndexValue::Scalar(0.5)],
            })
        }
    }

    fn segment() -> AudioSegment {
        AudioSegment::new(vec![0.0; 16], 8000)
    }

    #[test]
    fn shared_base_computation_is_evaluated_once() {
        let library = CountingLibrary::default();
        let analyzer = SegmentAnalyzer::new(&library).with_num_bins(4);
        let indices = [
            AcousticIndex::SpectralEntropy,
            AcousticIndex::SpectralVarianceEntropy,
            AcousticIndex::SpectralMaximaEntropy,
        ];
        let analysis = analyzer.compute(&segment(), &indices);

        assert!(analysis.is_complete());
        assert_eq!(library.calls.lock().unwrap().as_slice(), &[Computation::SpectralEntropy]);
        assert_eq!(analysis.row(AcousticIndex::SpectralEntropy), Some(&[0.1; 4][..]));
        assert_eq!(analysis.row(AcousticIndex::SpectralMaximaEntropy), Some(&[0.3; 4][..]));
    }

    #[test]
    fn vector_results_pass_through() {
        let library = CountingLibrary::default();
        let analyzer = SegmentAnalyzer::new(&library).with_num_bins(4);
        let analysis = analyzer.compute(&segment(), &[AcousticIndex::AcousticComplexity]);
        assert_eq!(
            analysis.row(AcousticIndex::AcousticComplexity),
            Some(&[0.0, 1.0, 2.0, 3.0][..])
        );
    }

    #[test]
    fn failure_does_not_stop_other_indices() {
        let library = CountingLibrary {
            failing: vec![Computation::AcousticComplexity],
            ..Default::default()
        };
        let analyzer = SegmentAnalyzer::new(&library).with_num_bins(4);
        let analysis = analyzer.compute(
            &segment(),
            &[
                AcousticIndex::TemporalEntropy,
                AcousticIndex::AcousticComplexity,
                AcousticIndex::SpectralEntropy,
            ],
        );

        assert_eq!(analysis.results.len(), 2);
        assert_eq!(analysis.failures.len(), 1);
        assert_eq!(analysis.failures[0].0, AcousticIndex::AcousticComplexity);
        assert!(analysis.row(AcousticIndex::AcousticComplexity).is_none());
    }

    #[test]
    fn dependencies_share_the_memo() {
        let library = CountingLibrary::default();
        let analyzer = SegmentAnalyzer::new(&library).with_num_bins(2);
        let analysis = analyzer.compute(
            &segment(),
            &[
                AcousticIndex::TemporalEntropy,
                AcousticIndex::AcousticEntropy,
                AcousticIndex::SpectralEntropy,
            ],
        );

        assert!(analysis.is_complete());
        assert_eq!(
            library.calls.lock().unwrap().as_slice(),
            &[
                Computation::TemporalEntropy,
                Computation::SpectralEntropy,
                Computation::AcousticEntropy,
            ]
        );
        let h = analysis.row(AcousticIndex::AcousticEntropy).unwrap();
        assert!((h[0] - 0.05).abs() < 1e-6);
    }

    #[test]
    fn failed_dependency_fails_dependent_index() {
        let library = CountingLibrary {
            failing: vec![Computation::SpectralEntropy],
            ..Default::default()
        };
        let analyzer = SegmentAnalyzer::new(&library).with_num_bins(2);
        let analysis = analyzer.compute(&segment(), &[AcousticIndex::AcousticEntropy]);
        assert!(analysis.results.is_empty());
        assert!(matches!(
            analysis.failures[0].1,
            AnalysisError::Computation { .. }
        ));
    }

    #[test]
    fn builtin_library_on_real_segment() {
        let samples: Vec<f32> = (0..22050)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 3000.0 * i as f32 / 22050.0).sin())
            .collect();
        let segment = AudioSegment::new(samples, 22050);
        let library = crate::indices::BuiltinIndices;
        let analysis = SegmentAnalyzer::new(&library).compute(
            &segment,
            &[
                AcousticIndex::TemporalEntropy,
                AcousticIndex::SpectralEntropy,
                AcousticIndex::AcousticComplexity,
            ],
        );

        assert!(analysis.is_complete(), "{:?}", analysis.failures);
        for row in analysis.results.values() {
            assert_eq!(row.len(), NUM_FREQUENCY_BINS);
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }
}
