//! Waveform-domain indices

use crate::config::NoiseConfig;
use crate::noise::{NoiseEstimator, amplitude_to_db, envelope};

/// Normalized Shannon entropy of a non-negative distribution, in `[0, 1]`.
///
/// Returns 0 for fewer than two values or an all-zero distribution.
pub fn normalized_entropy(values: &[f32]) -> f32 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let total: f64 = values.iter().map(|&v| f64::from(v.max(0.0))).sum();
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let entropy: f64 = values
        .iter()
        .map(|&v| f64::from(v.max(0.0)) / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    (entropy / (n as f64).log2()) as f32
}

fn abs_envelope(signal: &[f32], frame_size: usize) -> Vec<f32> {
    let magnitude: Vec<f32> = signal.iter().map(|x| x.abs()).collect();
    envelope(&magnitude, frame_size)
}

/// Temporal entropy `Ht` of the squared amplitude envelope.
pub fn temporal_entropy(samples: &[f32], frame_size: usize) -> f32 {
    let energy: Vec<f32> = abs_envelope(samples, frame_size)
        .into_iter()
        .map(|a| a * a)
        .collect();
    normalized_entropy(&energy)
}

/// Median of the envelope of a waveform.
pub fn amplitude_median(waveform: &[f32], frame_size: usize) -> f32 {
    let mut env = abs_envelope(waveform, frame_size);
    if env.is_empty() {
        return 0.0;
    }
    env.sort_by(f32::total_cmp);
    let mid = env.len() / 2;
    if env.len() % 2 == 0 {
        (env[mid - 1] + env[mid]) / 2.0
    } else {
        env[mid]
    }
}

/// Peak of the decibel waveform above the noise level.
pub fn signal_to_noise(waveform: &[f32], noise: f32) -> f32 {
    let peak = waveform.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() { peak - noise } else { 0.0 }
}

/// Envelope activity statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalActivity {
    /// Fraction of active frames
    pub fraction: f32,
    /// Number of active frames
    pub count: usize,
    /// Mean level of the active frames above the threshold (dB)
    pub mean_db: f32,
}

/// Per-frame level above the activity threshold (dB) and the activity mask.
fn activity_mask(samples: &[f32], noise: &NoiseConfig, db_threshold: f32) -> (Vec<f32>, Vec<bool>) {
    let env_db = amplitude_to_db(&abs_envelope(samples, noise.frame_size));
    let estimator = NoiseEstimator::waveform(noise.waveform_filter_window, noise.sd_count);
    let threshold = estimator.threshold(&env_db) + db_threshold;
    let mask = env_db.iter().map(|&level| level > threshold).collect();
    let excess = env_db.iter().map(|&level| level - threshold).collect();
    (excess, mask)
}

/// Fraction of envelope frames more than `db_threshold` above the noise level.
pub fn temporal_activity(
    samples: &[f32],
    noise: &NoiseConfig,
    db_threshold: f32,
) -> TemporalActivity {
    let (excess, mask) = activity_mask(samples, noise, db_threshold);
    if mask.is_empty() {
        return TemporalActivity {
            fraction: 0.0,
            count: 0,
            mean_db: 0.0,
        };
    }
    let active: Vec<f32> = excess
        .iter()
        .zip(&mask)
        .filter(|(_, active)| **active)
        .map(|(&e, _)| e)
        .collect();
    let count = active.len();
    let mean_db = if count > 0 {
        active.iter().sum::<f32>() / count as f32
    } else {
        0.0
    };
    TemporalActivity {
        fraction: count as f32 / mask.len() as f32,
        count,
        mean_db,
    }
}

/// Acoustic event statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalEvents {
    /// Fraction of the segment covered by events
    pub fraction: f32,
    /// Mean event duration in seconds
    pub mean_duration: f32,
    /// Number of events
    pub count: usize,
}

/// Events are runs of consecutive active envelope frames.
pub fn temporal_events(
    samples: &[f32],
    sample_rate: u32,
    noise: &NoiseConfig,
    db_threshold: f32,
) -> TemporalEvents {
    let (_, mask) = activity_mask(samples, noise, db_threshold);
    let mut runs = Vec::new();
    let mut current = 0usize;
    for &active in &mask {
        if active {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }

    if mask.is_empty() || runs.is_empty() || sample_rate == 0 {
        return TemporalEvents {
            fraction: 0.0,
            mean_duration: 0.0,
            count: runs.len(),
        };
    }

    let frame_secs = noise.frame_size.max(1).min(samples.len()) as f32 / sample_rate as f32;
    let active: usize = runs.iter().sum();
    TemporalEvents {
        fraction: active as f32 / mask.len() as f32,
        mean_duration: active as f32 / runs.len() as f32 * frame_secs,
        count: runs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bursts(frame: usize) -> Vec<f32> {
        // quiet floor with two loud bursts of 2 and 4 frames
        let mut signal = vec![0.001; frame * 40];
        for sample in &mut signal[frame * 10..frame * 12] {
            *sample = 0.8;
        }
        for sample in &mut signal[frame * 20..frame * 24] {
            *sample = 0.8;
        }
        signal
    }

    #[test]
    fn entropy_of_flat_distribution_is_one() {
        assert!((normalized_entropy(&[1.0; 8]) - 1.0).abs() < 1e-6);
        assert_eq!(normalized_entropy(&[0.0, 5.0, 0.0]), 0.0);
        assert_eq!(normalized_entropy(&[0.0; 4]), 0.0);
        assert_eq!(normalized_entropy(&[3.0]), 0.0);
    }

    #[test]
    fn steady_signal_has_high_temporal_entropy() {
        let steady = vec![0.5; 512 * 20];
        assert!(temporal_entropy(&steady, 512) > 0.99);

        let mut click = vec![0.0; 512 * 20];
        click[1000] = 1.0;
        assert!(temporal_entropy(&click, 512) < 0.01);
    }

    #[test]
    fn median_of_envelope() {
        let waveform = vec![1.0, 3.0, 2.0, 5.0, 4.0, 0.0];
        assert_eq!(amplitude_median(&waveform, 2), 4.0);
        assert_eq!(amplitude_median(&[], 2), 0.0);
    }

    #[test]
    fn snr_is_peak_minus_noise() {
        assert_eq!(signal_to_noise(&[0.0, 12.0, 3.0], -40.0), 52.0);
        assert_eq!(signal_to_noise(&[], -40.0), 0.0);
    }

    #[test]
    fn bursts_are_detected_as_events() {
        let noise = NoiseConfig {
            frame_size: 64,
            ..Default::default()
        };
        let signal = bursts(64);

        let activity = temporal_activity(&signal, &noise, 3.0);
        assert_eq!(activity.count, 6);
        assert!((activity.fraction - 6.0 / 40.0).abs() < 1e-6);
        assert!(activity.mean_db > 0.0);

        let events = temporal_events(&signal, 6400, &noise, 3.0);
        assert_eq!(events.count, 2);
        assert!((events.fraction - 6.0 / 40.0).abs() < 1e-6);
        assert!((events.mean_duration - 3.0 * 0.01).abs() < 1e-6);
    }

    #[test]
    fn silence_has_no_events() {
        let noise = NoiseConfig::default();
        let events = temporal_events(&vec![0.0; 4096], 22050, &noise, 3.0);
        assert_eq!(events.count, 0);
        assert_eq!(events.fraction, 0.0);
        assert_eq!(temporal_activity(&[], &noise, 3.0).fraction, 0.0);
    }
}
