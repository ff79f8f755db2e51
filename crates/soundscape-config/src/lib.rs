//! Configuration file handling for soundscape analysis.
//!
//! [`AnalysisConfig`] lives in `soundscape-analysis`; this crate reads and
//! writes it as TOML, validates it, and locates the per-user config file.
//!
//! # Example
//!
//! ```rust,no_run
//! use soundscape_config::{load_or_default, save_config};
//!
//! let mut config = load_or_default().unwrap();
//! config.segment_duration_secs = 30.0;
//! save_config("analysis.toml", &config).unwrap();
//! ```
//!
//! # TOML Format
//!
//! Every field is optional; missing fields take their defaults.
//!
//! ```toml
//! segment_duration_secs = 60.0
//! denoise = true
//! workers = 0
//! max_indices = 3
//!
//! [noise]
//! frame_size = 512
//! waveform_filter_window = 3
//! spectral_filter_window = 5
//! sd_count = 0.1
//!
//! [stft]
//! fft_size = 512
//! hop_size = 256
//! ```

mod error;
mod file;

/// Platform-specific configuration paths.
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use error::ConfigError;
pub use file::{load_config, load_or_default, parse_config, save_config, to_toml};
pub use paths::{default_config_path, ensure_user_config_dir, user_config_dir};
pub use soundscape_analysis::AnalysisConfig;
pub use validation::{ValidationError, ValidationResult, validate_config};
