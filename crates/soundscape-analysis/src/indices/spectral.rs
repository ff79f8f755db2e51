//! Spectrogram-domain indices
//!
//! Every function takes a [`PowerSpectrogram`] laid out `[bin][frame]`.
//! Band limits are in Hz and select bins by centre frequency.

use super::Computation;
use super::temporal::normalized_entropy;
use crate::config::NoiseConfig;
use crate::error::{AnalysisError, Result};
use crate::noise::{NoiseEstimator, power_to_db};
use crate::spectrogram::PowerSpectrogram;

/// Band occupancy threshold for acoustic evenness (dB).
pub const EVENNESS_DB: f32 = -50.0;

/// Upper limit of the evenness bands (Hz).
pub const EVENNESS_MAX_HZ: f32 = 10_000.0;

/// Width of each evenness band (Hz).
pub const EVENNESS_STEP_HZ: f32 = 1_000.0;

/// Reject spectrograms without any frames.
pub fn require_frames(
    computation: Computation,
    spec: &PowerSpectrogram,
) -> Result<&PowerSpectrogram> {
    if spec.num_frames() == 0 {
        return Err(AnalysisError::computation(
            computation.name(),
            "segment is shorter than one spectrogram frame",
        ));
    }
    Ok(spec)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

fn maximum(values: &[f32]) -> f32 {
    values.iter().copied().fold(0.0, f32::max)
}

/// Entropies of three spectral profiles over a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralEntropy {
    /// Entropy of the mean spectrum (`Hf`)
    pub average: f32,
    /// Entropy of the per-bin variance (`HfVar`)
    pub variance: f32,
    /// Entropy of the per-bin maxima (`HfMax`)
    pub maxima: f32,
}

/// Normalized entropies of the mean, variance and maxima spectra within `band`.
pub fn spectral_entropy(spec: &PowerSpectrogram, band: (f32, f32)) -> SpectralEntropy {
    let rows = &spec.power[spec.bins_in(band.0, band.1)];
    let profile = |f: fn(&[f32]) -> f32| rows.iter().map(|row| f(row)).collect::<Vec<f32>>();

    SpectralEntropy {
        average: normalized_entropy(&profile(mean)),
        variance: normalized_entropy(&profile(variance)),
        maxima: normalized_entropy(&profile(maximum)),
    }
}

/// Per-bin fraction of frames more than `db_threshold` above the bin's noise level.
pub fn spectral_activity(
    spec: &PowerSpectrogram,
    noise: &NoiseConfig,
    db_threshold: f32,
) -> Vec<f32> {
    let estimator = NoiseEstimator::spectral(
        spec.num_frames(),
        noise.spectral_filter_window,
        noise.sd_count,
    );
    spec.power
        .iter()
        .map(|row| {
            if row.is_empty() {
                return 0.0;
            }
            let levels = power_to_db(row);
            let threshold = estimator.threshold(&levels) + db_threshold;
            let active = levels.iter().filter(|&&level| level > threshold).count();
            active as f32 / levels.len() as f32
        })
        .collect()
}

/// Per-bin acoustic complexity: summed absolute amplitude change over summed amplitude.
pub fn acoustic_complexity(spec: &PowerSpectrogram) -> Vec<f32> {
    spec.amplitude()
        .iter()
        .map(|row| {
            let total: f32 = row.iter().sum();
            if total <= 0.0 {
                return 0.0;
            }
            let change: f32 = row.windows(2).map(|pair| (pair[1] - pair[0]).abs()).sum();
            change / total
        })
        .collect()
}

/// Gini coefficient of non-negative values; 0 for perfect equality.
pub fn gini(values: &[f32]) -> f32 {
    let n = values.len();
    let total: f32 = values.iter().sum();
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let weighted: f32 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (2.0 * (i + 1) as f32 - n as f32 - 1.0) * x)
        .sum();
    weighted / (n as f32 * total)
}

fn cover_fraction(spec: &PowerSpectrogram, band: (f32, f32), db_threshold: f32) -> Option<f32> {
    let rows = &spec.power[spec.bins_in(band.0, band.1)];
    let cells: usize = rows.iter().map(Vec::len).sum();
    if cells == 0 {
        return None;
    }
    let above: usize = rows
        .iter()
        .map(|row| power_to_db(row).iter().filter(|&&level| level > db_threshold).count())
        .sum();
    Some(above as f32 / cells as f32)
}

/// Acoustic evenness: Gini coefficient of 1 kHz band occupancy above -50 dB.
pub fn acoustic_evenness(spec: &PowerSpectrogram) -> f32 {
    let bands = (EVENNESS_MAX_HZ / EVENNESS_STEP_HZ) as usize;
    let occupancy: Vec<f32> = (0..bands)
        .filter_map(|band| {
            let low = band as f32 * EVENNESS_STEP_HZ;
            cover_fraction(spec, (low, low + EVENNESS_STEP_HZ), EVENNESS_DB)
        })
        .collect();
    gini(&occupancy)
}

/// Bioacoustic index: area of the mean decibel spectrum above its minimum
/// within `band`, in dB·kHz.
pub fn bioacoustic_index(spec: &PowerSpectrogram, band: (f32, f32)) -> f32 {
    let amplitude = spec.amplitude();
    let bins = spec.bins_in(band.0, band.1);
    let mean_db: Vec<f32> = amplitude[bins]
        .iter()
        .map(|row| 20.0 * mean(row).max(1e-10).log10())
        .collect();
    let floor = mean_db.iter().copied().fold(f32::INFINITY, f32::min);
    if !floor.is_finite() {
        return 0.0;
    }
    let bin_khz = spec.bin_width() / 1000.0;
    mean_db.iter().map(|level| level - floor).sum::<f32>() * bin_khz
}

/// Fraction of cells within `band` above `db_threshold`; 0 for an empty band.
pub fn spectral_cover(spec: &PowerSpectrogram, band: (f32, f32), db_threshold: f32) -> f32 {
    cover_fraction(spec, band, db_threshold).unwrap_or(0.0)
}

/// Normalized difference soundscape index `(bio - anthro) / (bio + anthro)`.
pub fn soundscape_index(
    spec: &PowerSpectrogram,
    biophony: (f32, f32),
    anthrophony: (f32, f32),
) -> f32 {
    let band_energy = |band: (f32, f32)| -> f32 {
        spec.power[spec.bins_in(band.0, band.1)]
            .iter()
            .map(|row| mean(row))
            .sum()
    };
    let bio = band_energy(biophony);
    let anthro = band_energy(anthrophony);
    let total = bio + anthro;
    if total <= 0.0 {
        return 0.0;
    }
    (bio - anthro) / total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(power: Vec<Vec<f32>>, bin_width: f32) -> PowerSpectrogram {
        let frames = power.first().map_or(0, Vec::len);
        let bins = power.len();
        PowerSpectrogram {
            power,
            times: (0..frames).map(|t| t as f32).collect(),
            frequencies: (0..bins).map(|b| b as f32 * bin_width).collect(),
        }
    }

    #[test]
    fn frameless_spectrogram_is_rejected() {
        let spec = surface(vec![vec![]; 4], 100.0);
        assert!(require_frames(Computation::AcousticComplexity, &spec).is_err());
    }

    #[test]
    fn flat_spectrum_has_full_entropy() {
        let spec = surface(vec![vec![1.0, 1.0, 1.0]; 100], 100.0);
        let entropy = spectral_entropy(&spec, (500.0, 8000.0));
        assert!((entropy.average - 1.0).abs() < 1e-5);
        assert!((entropy.maxima - 1.0).abs() < 1e-5);
        // no variation anywhere
        assert_eq!(entropy.variance, 0.0);
    }

    #[test]
    fn single_tone_has_low_entropy() {
        let mut power = vec![vec![0.0; 5]; 100];
        power[20] = vec![1.0; 5];
        let spec = surface(power, 100.0);
        let entropy = spectral_entropy(&spec, (500.0, 8000.0));
        assert_eq!(entropy.average, 0.0);
    }

    #[test]
    fn complexity_of_steady_and_alternating_bins() {
        let power = vec![vec![4.0, 4.0, 4.0, 4.0], vec![4.0, 0.0, 4.0, 0.0], vec![0.0; 4]];
        let spec = surface(power, 100.0);
        let aci = acoustic_complexity(&spec);
        assert_eq!(aci.len(), 3);
        assert_eq!(aci[0], 0.0);
        // amplitudes 2,0,2,0: changes 6, total 4
        assert!((aci[1] - 1.5).abs() < 1e-6);
        assert_eq!(aci[2], 0.0);
    }

    #[test]
    fn gini_extremes() {
        assert_eq!(gini(&[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert!((gini(&[0.0, 0.0, 0.0, 1.0]) - 0.75).abs() < 1e-6);
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn evenness_of_uniform_and_single_band_occupancy() {
        let loud = surface(vec![vec![1.0; 4]; 256], 43.0);
        assert!(acoustic_evenness(&loud).abs() < 1e-6);

        let mut power = vec![vec![0.0; 4]; 256];
        for row in &mut power[..23] {
            *row = vec![1.0; 4];
        }
        let one_band = surface(power, 43.0);
        assert!(acoustic_evenness(&one_band) > 0.85);
    }

    #[test]
    fn bioacoustic_area_above_minimum() {
        // bins at 0, 1000, ..., 15000 Hz; band covers 2000..11000
        let mut power = vec![vec![1.0; 2]; 16];
        power[5] = vec![100.0; 2];
        let spec = surface(power, 1000.0);
        // amplitude 10 vs 1: 20 dB above the floor, times 1 kHz
        assert!((bioacoustic_index(&spec, (2000.0, 11000.0)) - 20.0).abs() < 1e-3);
        assert_eq!(bioacoustic_index(&spec, (20000.0, 30000.0)), 0.0);
    }

    #[test]
    fn cover_counts_cells_above_threshold() {
        let spec = surface(vec![vec![10.0, 0.0], vec![0.0, 0.0]], 100.0);
        // 10 dB in one of four cells
        assert!((spectral_cover(&spec, (0.0, 200.0), 3.0) - 0.25).abs() < 1e-6);
        assert_eq!(spectral_cover(&spec, (500.0, 900.0), 3.0), 0.0);
    }

    #[test]
    fn ndsi_sign_follows_dominant_band() {
        let mut power = vec![vec![0.0; 3]; 12];
        power[1] = vec![1.0; 3];
        let anthro = surface(power, 1000.0);
        let ndsi = soundscape_index(&anthro, (2000.0, 11000.0), (1000.0, 2000.0));
        assert!((ndsi + 1.0).abs() < 1e-6);

        let mut power = vec![vec![0.0; 3]; 12];
        power[4] = vec![1.0; 3];
        let bio = surface(power, 1000.0);
        assert!((soundscape_index(&bio, (2000.0, 11000.0), (1000.0, 2000.0)) - 1.0).abs() < 1e-6);

        let silent = surface(vec![vec![0.0; 3]; 12], 1000.0);
        assert_eq!(soundscape_index(&silent, (2000.0, 11000.0), (1000.0, 2000.0)), 0.0);
    }

    #[test]
    fn silent_bins_are_inactive() {
        let spec = surface(vec![vec![0.0; 64]; 4], 100.0);
        let activity = spectral_activity(&spec, &NoiseConfig::default(), 6.0);
        assert_eq!(activity, vec![0.0; 4]);
    }

    #[test]
    fn sparse_peaks_are_active() {
        let mut row = vec![1e-6; 64];
        for t in (0..64).step_by(8) {
            row[t] = 1.0;
        }
        let spec = surface(vec![row], 100.0);
        let activity = spectral_activity(&spec, &NoiseConfig::default(), 6.0);
        assert!((activity[0] - 8.0 / 64.0).abs() < 1e-6);
    }
}
