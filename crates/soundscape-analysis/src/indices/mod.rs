//! Acoustic index registry and the built-in index library.
//!
//! Several public indices are projections of one multi-valued base
//! computation (`Hf`, `HfVar` and `HfMax` all come from [`Computation::SpectralEntropy`]).
//! The registry maps every public name to its base computation and the
//! component it exposes, so an analyzer can evaluate each base computation
//! once per segment.
//!
//! # Example
//!
//! ```rust
//! use soundscape_analysis::indices::{AcousticIndex, Computation};
//!
//! let hf: AcousticIndex = "HfMax".parse().unwrap();
//! assert_eq!(hf.computation(), Computation::SpectralEntropy);
//! assert_eq!(hf.component(), 2);
//! ```

pub mod diversity;
pub mod secondary;
pub mod spectral;
pub mod temporal;

use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};
use crate::segment::AudioSegment;

/// Which part of the segment an index is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexDomain {
    /// Waveform and amplitude envelope
    Temporal,
    /// Power spectrogram
    Spectral,
    /// Combination of other indices
    Secondary,
}

impl IndexDomain {
    /// Returns a human-readable name for the domain.
    pub const fn name(&self) -> &'static str {
        match self {
            IndexDomain::Temporal => "temporal",
            IndexDomain::Spectral => "spectral",
            IndexDomain::Secondary => "secondary",
        }
    }
}

/// Underlying calculation shared by one or more public indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Computation {
    /// Entropy of the amplitude envelope
    TemporalEntropy,
    /// Median of the waveform envelope
    AmplitudeMedian,
    /// Segment noise floor
    BackgroundNoise,
    /// Waveform peak above the noise floor
    SignalToNoise,
    /// Fraction of active envelope frames
    TemporalActivity,
    /// Event fraction and mean event duration
    TemporalEvents,
    /// Entropies of the mean, variance and maxima spectra
    SpectralEntropy,
    /// Number of recurring spectral patterns
    SpectralDiversity,
    /// Per-bin fraction of active frames
    SpectralActivity,
    /// Per-bin acoustic complexity
    AcousticComplexity,
    /// Gini coefficient of band occupancy
    AcousticEvenness,
    /// Area of the mean spectrum above its minimum
    Bioacoustic,
    /// Low, mid and high band cover
    SpectralCover,
    /// Normalized difference soundscape index
    SoundscapeIndex,
    /// Rank product of temporal entropy and amplitude median
    AcousticRichness,
    /// Product of temporal and spectral entropy
    AcousticEntropy,
}

impl Computation {
    /// Base computations whose results this one consumes, in argument order.
    pub const fn dependencies(self) -> &'static [Computation] {
        match self {
            Computation::AcousticRichness => {
                &[Computation::TemporalEntropy, Computation::AmplitudeMedian]
            }
            Computation::AcousticEntropy => {
                &[Computation::TemporalEntropy, Computation::SpectralEntropy]
            }
            _ => &[],
        }
    }

    /// Identifier used in diagnostics.
    pub fn name(self) -> String {
        format!("{self:?}")
    }
}

/// Public acoustic index names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AcousticIndex {
    /// `Ht`
    TemporalEntropy,
    /// `M`
    AmplitudeMedian,
    /// `BgN`
    BackgroundNoise,
    /// `SNR`
    SignalToNoise,
    /// `AcAct`
    AcousticActivity,
    /// `AEFrac`
    EventFraction,
    /// `AEDur`
    EventDuration,
    /// `Hf`
    SpectralEntropy,
    /// `HfVar`
    SpectralVarianceEntropy,
    /// `HfMax`
    SpectralMaximaEntropy,
    /// `SpDiv`
    SpectralDiversity,
    /// `SpAct`
    SpectralActivity,
    /// `ACI`
    AcousticComplexity,
    /// `AEI`
    AcousticEvenness,
    /// `BioI`
    Bioacoustic,
    /// `LFreqCov`
    LowFrequencyCover,
    /// `MFreqCov`
    MidFrequencyCover,
    /// `HFreqCov`
    HighFrequencyCover,
    /// `NDSI`
    SoundscapeIndex,
    /// `ARI`
    AcousticRichness,
    /// `H`
    AcousticEntropy,
}

/// Registry entry for one public index.
#[derive(Debug, Clone, Copy)]
pub struct IndexDescriptor {
    /// The index
    pub index: AcousticIndex,
    /// Public short name
    pub name: &'static str,
    /// Base computation it is projected from
    pub computation: Computation,
    /// Component of the base computation's result
    pub component: usize,
    /// Source domain
    pub domain: IndexDomain,
    /// One-line description
    pub description: &'static str,
}

const fn entry(
    index: AcousticIndex,
    name: &'static str,
    computation: Computation,
    component: usize,
    domain: IndexDomain,
    description: &'static str,
) -> IndexDescriptor {
    IndexDescriptor {
        index,
        name,
        computation,
        component,
        domain,
        description,
    }
}

// Order matches the `AcousticIndex` declaration order.
#[rustfmt::skip]
static REGISTRY: [IndexDescriptor; 21] = [
    entry(AcousticIndex::TemporalEntropy, "Ht", Computation::TemporalEntropy, 0, IndexDomain::Temporal,
        "Temporal entropy of the amplitude envelope"),
    entry(AcousticIndex::AmplitudeMedian, "M", Computation::AmplitudeMedian, 0, IndexDomain::Temporal,
        "Median of the decibel waveform envelope"),
    entry(AcousticIndex::BackgroundNoise, "BgN", Computation::BackgroundNoise, 0, IndexDomain::Temporal,
        "Background noise level (dB)"),
    entry(AcousticIndex::SignalToNoise, "SNR", Computation::SignalToNoise, 0, IndexDomain::Temporal,
        "Waveform peak above the background noise level (dB)"),
    entry(AcousticIndex::AcousticActivity, "AcAct", Computation::TemporalActivity, 0, IndexDomain::Temporal,
        "Fraction of envelope frames 3 dB above the noise level"),
    entry(AcousticIndex::EventFraction, "AEFrac", Computation::TemporalEvents, 0, IndexDomain::Temporal,
        "Fraction of the segment covered by acoustic events"),
    entry(AcousticIndex::EventDuration, "AEDur", Computation::TemporalEvents, 1, IndexDomain::Temporal,
        "Mean acoustic event duration (s)"),
    entry(AcousticIndex::SpectralEntropy, "Hf", Computation::SpectralEntropy, 0, IndexDomain::Spectral,
        "Entropy of the mean spectrum"),
    entry(AcousticIndex::SpectralVarianceEntropy, "HfVar", Computation::SpectralEntropy, 1, IndexDomain::Spectral,
        "Entropy of the spectral variance"),
    entry(AcousticIndex::SpectralMaximaEntropy, "HfMax", Computation::SpectralEntropy, 2, IndexDomain::Spectral,
        "Entropy of the spectral maxima"),
    entry(AcousticIndex::SpectralDiversity, "SpDiv", Computation::SpectralDiversity, 0, IndexDomain::Spectral,
        "Number of recurring spectral peak patterns (randomised)"),
    entry(AcousticIndex::SpectralActivity, "SpAct", Computation::SpectralActivity, 0, IndexDomain::Spectral,
        "Per-bin fraction of frames above the bin noise level"),
    entry(AcousticIndex::AcousticComplexity, "ACI", Computation::AcousticComplexity, 0, IndexDomain::Spectral,
        "Per-bin acoustic complexity index"),
    entry(AcousticIndex::AcousticEvenness, "AEI", Computation::AcousticEvenness, 0, IndexDomain::Spectral,
        "Gini coefficient of 1 kHz band occupancy"),
    entry(AcousticIndex::Bioacoustic, "BioI", Computation::Bioacoustic, 0, IndexDomain::Spectral,
        "Bioacoustic index, 2-11 kHz"),
    entry(AcousticIndex::LowFrequencyCover, "LFreqCov", Computation::SpectralCover, 0, IndexDomain::Spectral,
        "Low frequency band cover, 0-482 Hz"),
    entry(AcousticIndex::MidFrequencyCover, "MFreqCov", Computation::SpectralCover, 1, IndexDomain::Spectral,
        "Mid frequency band cover, 482-3500 Hz"),
    entry(AcousticIndex::HighFrequencyCover, "HFreqCov", Computation::SpectralCover, 2, IndexDomain::Spectral,
        "High frequency band cover, 3.5-11 kHz"),
    entry(AcousticIndex::SoundscapeIndex, "NDSI", Computation::SoundscapeIndex, 0, IndexDomain::Spectral,
        "Normalized difference soundscape index"),
    entry(AcousticIndex::AcousticRichness, "ARI", Computation::AcousticRichness, 0, IndexDomain::Secondary,
        "Acoustic richness index"),
    entry(AcousticIndex::AcousticEntropy, "H", Computation::AcousticEntropy, 0, IndexDomain::Secondary,
        "Acoustic entropy, Ht x Hf"),
];

/// All registered indices in declaration order.
pub fn registry() -> &'static [IndexDescriptor] {
    &REGISTRY
}

impl AcousticIndex {
    /// Registry entry for this index.
    pub fn descriptor(self) -> &'static IndexDescriptor {
        &REGISTRY[self as usize]
    }

    /// Public short name, e.g. `"Ht"`.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Base computation this index is projected from.
    pub fn computation(self) -> Computation {
        self.descriptor().computation
    }

    /// Component of the base computation's result.
    pub fn component(self) -> usize {
        self.descriptor().component
    }

    /// Look an index up by its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        REGISTRY.iter().find(|d| d.name == name).map(|d| d.index)
    }

    /// Every supported index.
    pub fn all() -> impl Iterator<Item = AcousticIndex> {
        REGISTRY.iter().map(|d| d.index)
    }
}

impl fmt::Display for AcousticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AcousticIndex {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        AcousticIndex::from_name(s).ok_or_else(|| AnalysisError::UnsupportedIndex(s.to_string()))
    }
}

/// Parse index names, dropping duplicates while keeping request order.
pub fn parse_indices<S: AsRef<str>>(names: &[S]) -> Result<Vec<AcousticIndex>> {
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let index: AcousticIndex = name.as_ref().trim().parse()?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }
    Ok(indices)
}

/// One component of a base computation's result.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    /// Single value per segment
    Scalar(f32),
    /// One value per frequency bin
    Bins(Vec<f32>),
}

impl IndexValue {
    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            IndexValue::Scalar(x) => Some(*x),
            IndexValue::Bins(_) => None,
        }
    }

    /// Express the value over `num_bins` frequency bins, broadcasting scalars.
    pub fn into_bins(self, num_bins: usize) -> Result<Vec<f32>> {
        match self {
            IndexValue::Scalar(x) => Ok(vec![x; num_bins]),
            IndexValue::Bins(bins) if bins.len() == num_bins => Ok(bins),
            IndexValue::Bins(bins) => Err(AnalysisError::InvalidInput(format!(
                "index vector has {} bins, expected {num_bins}",
                bins.len()
            ))),
        }
    }
}

/// Provider of base computations.
///
/// `inputs` holds the results of [`Computation::dependencies`], in order.
pub trait IndexLibrary {
    /// Evaluate one base computation for one segment.
    fn evaluate(
        &self,
        computation: Computation,
        segment: &AudioSegment,
        inputs: &[&[IndexValue]],
    ) -> Result<Vec<IndexValue>>;
}

/// Band limits (Hz) used by the built-in spectral indices.
pub mod bands {
    /// Spectral entropy band
    pub const ENTROPY: (f32, f32) = (482.0, 8820.0);
    /// Bioacoustic index band
    pub const BIOACOUSTIC: (f32, f32) = (2000.0, 11000.0);
    /// Anthrophony band for NDSI
    pub const ANTHROPHONY: (f32, f32) = (1000.0, 2000.0);
    /// Biophony band for NDSI
    pub const BIOPHONY: (f32, f32) = (2000.0, 11000.0);
    /// Low frequency cover band
    pub const LOW: (f32, f32) = (0.0, 482.0);
    /// Mid frequency cover band
    pub const MID: (f32, f32) = (482.0, 3500.0);
    /// High frequency cover band
    pub const HIGH: (f32, f32) = (3500.0, 11000.0);
}

/// Threshold above the envelope noise level for temporal activity and events (dB).
pub const TEMPORAL_ACTIVITY_DB: f32 = 3.0;

/// Threshold above the bin noise level for spectral activity (dB).
pub const SPECTRAL_ACTIVITY_DB: f32 = 6.0;

/// Cover threshold on the denoised power surface (dB).
pub const SPECTRAL_COVER_DB: f32 = 3.0;

/// Built-in implementations of every base computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIndices;

impl BuiltinIndices {
    fn scalar_input(computation: Computation, inputs: &[&[IndexValue]], at: usize) -> Result<f32> {
        inputs
            .get(at)
            .and_then(|values| values.first())
            .and_then(IndexValue::as_scalar)
            .ok_or_else(|| {
                AnalysisError::computation(computation.name(), "missing dependency result")
            })
    }
}

impl IndexLibrary for BuiltinIndices {
    fn evaluate(
        &self,
        computation: Computation,
        segment: &AudioSegment,
        inputs: &[&[IndexValue]],
    ) -> Result<Vec<IndexValue>> {
        use IndexValue::{Bins, Scalar};

        let frame_size = segment.settings().noise.frame_size;
        let noise = &segment.settings().noise;

        let values = match computation {
            Computation::TemporalEntropy => {
                vec![Scalar(temporal::temporal_entropy(segment.samples(), frame_size))]
            }
            Computation::AmplitudeMedian => {
                vec![Scalar(temporal::amplitude_median(segment.waveform(), frame_size))]
            }
            Computation::BackgroundNoise => vec![Scalar(segment.noise())],
            Computation::SignalToNoise => {
                vec![Scalar(temporal::signal_to_noise(segment.waveform(), segment.noise()))]
            }
            Computation::TemporalActivity => {
                let activity = temporal::temporal_activity(
                    segment.samples(),
                    noise,
                    TEMPORAL_ACTIVITY_DB,
                );
                vec![Scalar(activity.fraction)]
            }
            Computation::TemporalEvents => {
                let events = temporal::temporal_events(
                    segment.samples(),
                    segment.sample_rate(),
                    noise,
                    TEMPORAL_ACTIVITY_DB,
                );
                vec![Scalar(events.fraction), Scalar(events.mean_duration)]
            }
            Computation::SpectralEntropy => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                let entropy = spectral::spectral_entropy(spec, bands::ENTROPY);
                vec![
                    Scalar(entropy.average),
                    Scalar(entropy.variance),
                    Scalar(entropy.maxima),
                ]
            }
            Computation::SpectralDiversity => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                let count = diversity::spectral_diversity(spec, &mut rand::thread_rng());
                vec![Scalar(count as f32)]
            }
            Computation::SpectralActivity => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                vec![Bins(spectral::spectral_activity(spec, noise, SPECTRAL_ACTIVITY_DB))]
            }
            Computation::AcousticComplexity => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                vec![Bins(spectral::acoustic_complexity(spec))]
            }
            Computation::AcousticEvenness => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                vec![Scalar(spectral::acoustic_evenness(spec))]
            }
            Computation::Bioacoustic => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                vec![Scalar(spectral::bioacoustic_index(spec, bands::BIOACOUSTIC))]
            }
            Computation::SpectralCover => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                let [low, mid, high] =
                    [bands::LOW, bands::MID, bands::HIGH].map(|band| {
                        spectral::spectral_cover(spec, band, SPECTRAL_COVER_DB)
                    });
                vec![Scalar(low), Scalar(mid), Scalar(high)]
            }
            Computation::SoundscapeIndex => {
                let spec = spectral::require_frames(computation, segment.spectrogram())?;
                vec![Scalar(spectral::soundscape_index(
                    spec,
                    bands::BIOPHONY,
                    bands::ANTHROPHONY,
                ))]
            }
            Computation::AcousticRichness => {
                let ht = Self::scalar_input(computation, inputs, 0)?;
                let median = Self::scalar_input(computation, inputs, 1)?;
                let richness = secondary::acoustic_richness(&[ht], &[median]);
                vec![Scalar(richness.first().copied().unwrap_or(0.0))]
            }
            Computation::AcousticEntropy => {
                let ht = Self::scalar_input(computation, inputs, 0)?;
                let hf = Self::scalar_input(computation, inputs, 1)?;
                vec![Scalar(secondary::acoustic_entropy(ht, hf))]
            }
        };

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_matches_enum() {
        for (i, descriptor) in registry().iter().enumerate() {
            assert_eq!(descriptor.index as usize, i, "{}", descriptor.name);
        }
        assert_eq!(AcousticIndex::all().count(), 21);
    }

    #[test]
    fn names_round_trip() {
        for index in AcousticIndex::all() {
            assert_eq!(index.name().parse::<AcousticIndex>().unwrap(), index);
        }
    }

    #[test]
    fn shared_computations_project_distinct_components() {
        assert_eq!(AcousticIndex::EventFraction.computation(), Computation::TemporalEvents);
        assert_eq!(AcousticIndex::EventFraction.component(), 0);
        assert_eq!(AcousticIndex::EventDuration.computation(), Computation::TemporalEvents);
        assert_eq!(AcousticIndex::EventDuration.component(), 1);
        assert_eq!(AcousticIndex::HighFrequencyCover.component(), 2);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "Foo".parse::<AcousticIndex>().unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedIndex(ref name) if name == "Foo"));
    }

    #[test]
    fn parse_indices_deduplicates() {
        let parsed = parse_indices(&["Ht", "ACI", "Ht"]).unwrap();
        assert_eq!(
            parsed,
            vec![AcousticIndex::TemporalEntropy, AcousticIndex::AcousticComplexity]
        );
        assert!(parse_indices(&["Ht", "nope"]).is_err());
    }

    #[test]
    fn scalars_broadcast_and_vectors_pass_through() {
        assert_eq!(IndexValue::Scalar(2.0).into_bins(4).unwrap(), vec![2.0; 4]);
        assert_eq!(
            IndexValue::Bins(vec![1.0, 2.0]).into_bins(2).unwrap(),
            vec![1.0, 2.0]
        );
        assert!(IndexValue::Bins(vec![1.0]).into_bins(2).is_err());
    }

    #[test]
    fn secondary_computations_declare_dependencies() {
        assert_eq!(
            Computation::AcousticEntropy.dependencies(),
            &[Computation::TemporalEntropy, Computation::SpectralEntropy]
        );
        assert!(Computation::AcousticComplexity.dependencies().is_empty());
    }

    #[test]
    fn builtin_spectral_index_needs_frames() {
        let segment = AudioSegment::new(vec![0.1; 100], 22050);
        let result = BuiltinIndices.evaluate(Computation::AcousticComplexity, &segment, &[]);
        assert!(matches!(result, Err(AnalysisError::Computation { .. })));
    }

    #[test]
    fn builtin_entropy_uses_dependency_inputs() {
        let segment = AudioSegment::new(vec![0.0; 10], 22050);
        let ht = [IndexValue::Scalar(0.5)];
        let hf = [IndexValue::Scalar(0.8), IndexValue::Scalar(0.1), IndexValue::Scalar(0.2)];
        let value = BuiltinIndices
            .evaluate(Computation::AcousticEntropy, &segment, &[&ht, &hf])
            .unwrap();
        assert!((value[0].as_scalar().unwrap() - 0.4).abs() < 1e-6);

        assert!(BuiltinIndices
            .evaluate(Computation::AcousticEntropy, &segment, &[])
            .is_err());
    }
}
