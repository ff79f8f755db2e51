//! Causal moving average

/// Smooth `data` with a causal moving average.
///
/// Position `i` holds the mean of the last `min(i + 1, window)` values ending
/// at `i`: a partial window at the start, the full window afterwards. A window
/// of zero behaves like a window of one.
pub fn moving_average(data: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);

    data.iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let span = &data[start..=i];
            let sum: f64 = span.iter().map(|&x| x as f64).sum();
            (sum / span.len() as f64) as f32
        })
        .collect()
}
