//! Index demo: compute, save, and reload a long-duration index map.
//!
//! Run with: cargo run -p soundscape-analysis --example index_demo

use soundscape_analysis::{AnalysisCoordinator, InMemorySource, Result};
use std::f32::consts::PI;

fn main() -> Result<()> {
    let sample_rate = 22050;
    let seconds = 30;

    // --- Synthetic dawn chorus: noise floor plus intermittent calls ---
    let mut state = 0x1234_5678u32;
    let samples: Vec<f32> = (0..sample_rate as usize * seconds)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let t = i as f32 / sample_rate as f32;
            let noise = (state as i32 as f32) / (i32::MAX as f32) * 0.01;
            let call = if (t * 3.0).fract() < 0.2 {
                0.3 * (2.0 * PI * (3000.0 + 1500.0 * (t * 3.0).fract()) * t).sin()
            } else {
                0.0
            };
            noise + call
        })
        .collect();

    let source = InMemorySource::new(samples, sample_rate, 10.0);
    let mut coordinator = AnalysisCoordinator::new(source);

    println!("=== Calculating Hf, Ht, ACI over 3 segments ===\n");
    coordinator.calculate_indices_with_progress(&["Hf", "Ht", "ACI"], |done, total| {
        println!("  segment {done}/{total}");
    })?;

    let store = coordinator.spectrogram();
    for name in store.indices() {
        let matrix = store.result(name)?;
        let (rows, cols) = matrix.shape();
        let first = matrix.row(0).map_or(0.0, |row| row[0]);
        println!("{name:>4}: {rows} x {cols}, first value {first:.4}");
    }

    let path = std::env::temp_dir().join("soundscape_index_demo.csv");
    coordinator.save_indices(&path)?;
    println!("\nSaved to {}", path.display());

    let mut reloaded = AnalysisCoordinator::new(InMemorySource::new(Vec::new(), sample_rate, 10.0));
    reloaded.load_indices(&path)?;
    println!("Reloaded indices: {:?}", reloaded.spectrogram().indices());

    Ok(())
}
