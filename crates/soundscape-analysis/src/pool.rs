//! Segment-parallel worker pool.
//!
//! A feeder thread produces segments into a bounded job channel, workers
//! analyse them independently, and results come back over an unbounded
//! channel to the calling thread in completion order. Workers never touch
//! shared mutable state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

use crossbeam_channel::{bounded, unbounded};

use crate::analyzer::{SegmentAnalysis, SegmentAnalyzer};
use crate::error::AnalysisError;
use crate::indices::{AcousticIndex, IndexLibrary};
use crate::segment::AudioSegment;
use crate::source::AudioSource;

/// Jobs buffered per worker.
const QUEUE_DEPTH: usize = 2;

/// Analysis of one segment, tagged with its position.
#[derive(Debug)]
pub struct SegmentOutcome {
    /// Segment index within the source
    pub segment: usize,
    /// Rows and failures for that segment
    pub analysis: SegmentAnalysis,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Analyse one segment, turning a panic into a failure of every requested index.
pub fn analyze_segment<L: IndexLibrary + ?Sized>(
    segment: &AudioSegment,
    library: &L,
    indices: &[AcousticIndex],
) -> SegmentAnalysis {
    let analyzer = SegmentAnalyzer::new(library);
    match catch_unwind(AssertUnwindSafe(|| analyzer.compute(segment, indices))) {
        Ok(analysis) => analysis,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            SegmentAnalysis::failed(indices, || AnalysisError::WorkerPanic(message.clone()))
        }
    }
}

/// Failure of every requested index because the source could not produce the segment.
pub fn source_failure(indices: &[AcousticIndex], error: &AnalysisError) -> SegmentAnalysis {
    let message = match error {
        AnalysisError::Source(message) => message.clone(),
        other => other.to_string(),
    };
    SegmentAnalysis::failed(indices, || AnalysisError::Source(message.clone()))
}

/// Fixed-size pool of analysis workers.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Pool with `workers` threads, at least one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Analyse every segment of `source`, calling `on_result` on the calling
    /// thread as each segment completes. Returns once all segments are done.
    pub fn run<S, L, F>(&self, source: &S, library: &L, indices: &[AcousticIndex], mut on_result: F)
    where
        S: AudioSource + Sync + ?Sized,
        L: IndexLibrary + Sync + ?Sized,
        F: FnMut(SegmentOutcome),
    {
        let total = source.number_of_segments();
        let (job_tx, job_rx) = bounded::<(usize, AudioSegment)>(self.workers * QUEUE_DEPTH);
        let (result_tx, result_rx) = unbounded::<SegmentOutcome>();

        thread::scope(|scope| {
            let feeder_results = result_tx.clone();
            scope.spawn(move || {
                for segment in 0..total {
                    match source.segment(segment) {
                        Ok(audio) => {
                            if job_tx.send((segment, audio)).is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            let analysis = source_failure(indices, &error);
                            if feeder_results.send(SegmentOutcome { segment, analysis }).is_err() {
                                break;
                            }
                        }
                    }
                }
            });

            for worker in 0..self.workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for (segment, audio) in jobs.iter() {
                        let analysis = analyze_segment(&audio, library, indices);
                        tracing::debug!(worker, segment, "segment analysed");
                        if results.send(SegmentOutcome { segment, analysis }).is_err() {
                            break;
                        }
                    }
                });
            }

            // Only the spawned threads hold channel ends now, so the result
            // iterator ends when the last of them finishes.
            drop(job_rx);
            drop(result_tx);

            for outcome in result_rx.iter() {
                on_result(outcome);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::indices::{Computation, IndexValue};
    use crate::source::InMemorySource;

    struct SegmentLength;

    impl IndexLibrary for SegmentLength {
        fn evaluate(
            &self,
            _computation: Computation,
            segment: &AudioSegment,
            _inputs: &[&[IndexValue]],
        ) -> Result<Vec<IndexValue>> {
            Ok(vec![IndexValue::Scalar(segment.samples()[0])])
        }
    }

    struct Panicking;

    impl IndexLibrary for Panicking {
        fn evaluate(
            &self,
            _computation: Computation,
            segment: &AudioSegment,
            _inputs: &[&[IndexValue]],
        ) -> Result<Vec<IndexValue>> {
            if segment.samples()[0] == 1.0 {
                panic!("boom");
            }
            Ok(vec![IndexValue::Scalar(0.0)])
        }
    }

    fn ramp_source(segments: usize) -> InMemorySource {
        let samples = (0..segments * 10).map(|i| (i / 10) as f32).collect();
        InMemorySource::new(samples, 10, 1.0)
    }

    #[test]
    fn every_segment_is_reported_once() {
        let source = ramp_source(7);
        let mut seen = Vec::new();
        let indices = [AcousticIndex::TemporalEntropy];
        WorkerPool::new(3).run(&source, &SegmentLength, &indices, |outcome| {
            let row = outcome.analysis.row(AcousticIndex::TemporalEntropy).unwrap();
            assert_eq!(row[0], outcome.segment as f32);
            seen.push(outcome.segment);
        });
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn panic_fails_only_its_segment() {
        let source = ramp_source(3);
        let indices = [AcousticIndex::TemporalEntropy, AcousticIndex::AcousticComplexity];
        let mut outcomes = Vec::new();
        WorkerPool::new(2).run(&source, &Panicking, &indices, |outcome| outcomes.push(outcome));
        outcomes.sort_by_key(|outcome| outcome.segment);

        assert!(outcomes[0].analysis.is_complete());
        assert!(outcomes[2].analysis.is_complete());
        let failed = &outcomes[1].analysis;
        assert_eq!(failed.failures.len(), 2);
        assert!(matches!(&failed.failures[0].1, AnalysisError::WorkerPanic(msg) if msg == "boom"));
    }

    #[test]
    fn zero_workers_still_runs() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.workers(), 1);
        let mut count = 0;
        let indices = [AcousticIndex::TemporalEntropy];
        pool.run(&ramp_source(2), &SegmentLength, &indices, |_| count += 1);
        assert_eq!(count, 2);
    }
}
