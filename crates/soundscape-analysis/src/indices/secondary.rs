//! Indices derived from other indices

/// 1-based ascending ranks; ties share the mean of their ranks.
pub fn ranks(values: &[f32]) -> Vec<f32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let shared = (start + 1 + end) as f32 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = shared;
        }
        start = end;
    }
    ranks
}

/// Acoustic richness: product of the temporal entropy and amplitude median
/// ranks, normalized by the squared number of segments.
///
/// Evaluated over a single segment the result is always 1.
pub fn acoustic_richness(temporal_entropy: &[f32], amplitude_median: &[f32]) -> Vec<f32> {
    let n = temporal_entropy.len().min(amplitude_median.len());
    if n == 0 {
        return Vec::new();
    }
    let norm = (n * n) as f32;
    ranks(&temporal_entropy[..n])
        .into_iter()
        .zip(ranks(&amplitude_median[..n]))
        .map(|(a, b)| a * b / norm)
        .collect()
}

/// Acoustic entropy `H = Ht × Hf`.
pub fn acoustic_entropy(temporal_entropy: f32, spectral_entropy: f32) -> f32 {
    temporal_entropy * spectral_entropy
}
