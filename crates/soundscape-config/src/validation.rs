//! Range checks for analysis configuration.
//!
//! # Example
//!
//! ```rust
//! use soundscape_config::{AnalysisConfig, validate_config};
//!
//! validate_config(&AnalysisConfig::default()).expect("defaults are valid");
//!
//! let config = AnalysisConfig {
//!     segment_duration_secs: 0.0,
//!     ..Default::default()
//! };
//! assert!(validate_config(&config).is_err());
//! ```

use soundscape_analysis::{AnalysisConfig, NUM_FREQUENCY_BINS};
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A field holds a value outside its allowed range.
    #[error("{field} {reason}")]
    OutOfRange {
        /// Dotted path of the field, e.g. `noise.frame_size`.
        field: String,
        /// What the value must satisfy.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn out_of_range(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Check every field of `config`, reporting all violations at once.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if !(config.segment_duration_secs.is_finite() && config.segment_duration_secs > 0.0) {
        errors.push(out_of_range("segment_duration_secs", "must be a positive number of seconds"));
    }
    if config.max_indices == 0 {
        errors.push(out_of_range("max_indices", "must be at least 1"));
    }

    let noise = &config.noise;
    if noise.frame_size == 0 {
        errors.push(out_of_range("noise.frame_size", "must be at least 1"));
    }
    if noise.waveform_filter_window == 0 {
        errors.push(out_of_range("noise.waveform_filter_window", "must be at least 1"));
    }
    if noise.spectral_filter_window == 0 {
        errors.push(out_of_range("noise.spectral_filter_window", "must be at least 1"));
    }
    if !(noise.sd_count.is_finite() && noise.sd_count >= 0.0) {
        errors.push(out_of_range("noise.sd_count", "must be finite and non-negative"));
    }

    // every index row is expressed over exactly NUM_FREQUENCY_BINS bins
    if config.stft.fft_size != 2 * NUM_FREQUENCY_BINS {
        errors.push(out_of_range(
            "stft.fft_size",
            format!("must be {}", 2 * NUM_FREQUENCY_BINS),
        ));
    }
    if config.stft.hop_size == 0 {
        errors.push(out_of_range("stft.hop_size", "must be at least 1"));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
