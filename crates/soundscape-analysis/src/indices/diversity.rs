//! Spectral diversity: the number of recurring spectral peak patterns.
//!
//! Amplitudes are averaged over groups of three frames and binarised at
//! [`PEAK_AMPLITUDE`]. Isolated peaks are removed, bins with more than two
//! peaks form the training set, and the training vectors are grouped by a
//! leader clustering on Jaccard similarity. The result counts clusters with
//! more than [`MIN_CLUSTER_SIZE`] members.
//!
//! The two starting representatives are drawn at random, so repeated runs may
//! differ. Pass a seeded RNG for repeatable results.

use rand::Rng;

use crate::spectrogram::PowerSpectrogram;

/// Amplitude above which a grouped cell is a peak.
pub const PEAK_AMPLITUDE: f32 = 0.07;

/// Frames averaged into one grouped cell.
pub const FRAME_GROUP: usize = 3;

/// Similarity a vector needs to join an existing cluster.
pub const JOIN_SIMILARITY: f32 = 0.15;

/// Clusters must be larger than this to be counted.
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Training needs at least this many bins with more than two peaks.
pub const MIN_TRAINING_VECTORS: usize = 9;

const MAX_PASSES: usize = 20;

/// Count recurring peak patterns in a power spectrogram.
pub fn spectral_diversity<R: Rng + ?Sized>(spec: &PowerSpectrogram, rng: &mut R) -> usize {
    let training: Vec<Vec<bool>> = spec
        .amplitude()
        .iter()
        .map(|row| {
            let mut peaks: Vec<bool> = row
                .chunks(FRAME_GROUP)
                .map(|group| group.iter().sum::<f32>() / group.len() as f32 > PEAK_AMPLITUDE)
                .collect();
            remove_isolated_peaks(&mut peaks);
            peaks
        })
        .filter(|peaks| peaks.iter().filter(|&&p| p).count() > 2)
        .collect();

    cluster_peaks(&training, rng)
}

/// Clear every peak whose neighbours are both empty, scanning left to right.
pub fn remove_isolated_peaks(peaks: &mut [bool]) {
    for i in 1..peaks.len().saturating_sub(1) {
        if !peaks[i - 1] && !peaks[i + 1] {
            peaks[i] = false;
        }
    }
}

/// Jaccard similarity of two binary vectors; 0 when both are empty.
pub fn jaccard(a: &[bool], b: &[bool]) -> f32 {
    let mut both = 0usize;
    let mut either = 0usize;
    for (&x, &y) in a.iter().zip(b) {
        both += usize::from(x && y);
        either += usize::from(x || y);
    }
    if either == 0 {
        0.0
    } else {
        both as f32 / either as f32
    }
}

/// Leader clustering of the training vectors; returns the number of clusters
/// with more than [`MIN_CLUSTER_SIZE`] members.
pub fn cluster_peaks<R: Rng + ?Sized>(training: &[Vec<bool>], rng: &mut R) -> usize {
    if training.len() < MIN_TRAINING_VECTORS {
        return 0;
    }

    let mut representatives = rand::seq::index::sample(rng, training.len(), 2).into_vec();
    let mut previous: Option<Vec<usize>> = None;
    let mut sizes = Vec::new();

    for _ in 0..MAX_PASSES {
        sizes = vec![1; representatives.len()];

        for (i, vector) in training.iter().enumerate() {
            if representatives.contains(&i) {
                continue;
            }
            let best = representatives
                .iter()
                .enumerate()
                .map(|(cluster, &rep)| (cluster, jaccard(&training[rep], vector)))
                .fold(None, |best: Option<(usize, f32)>, candidate| match best {
                    Some(b) if b.1 >= candidate.1 => Some(b),
                    _ => Some(candidate),
                });

            match best {
                Some((cluster, similarity)) if similarity > JOIN_SIMILARITY => sizes[cluster] += 1,
                _ => {
                    representatives.push(i);
                    sizes.push(1);
                }
            }
        }

        let (kept_reps, kept_sizes): (Vec<usize>, Vec<usize>) = representatives
            .iter()
            .zip(&sizes)
            .filter(|(_, size)| **size > 1)
            .map(|(&rep, &size)| (rep, size))
            .unzip();
        representatives = kept_reps;
        sizes = kept_sizes;

        if previous.as_ref() == Some(&sizes) || representatives.is_empty() {
            break;
        }
        previous = Some(sizes.clone());
    }

    sizes.iter().filter(|&&size| size > MIN_CLUSTER_SIZE).count()
}
