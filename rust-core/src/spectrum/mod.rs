//! Sliding DFT analysis tuned to musical keys

pub mod bin;
pub mod tuning;
pub mod sliding_dft;

use thiserror::Error;

pub use bin::DftBin;
pub use tuning::{PianoTuning, TuningConfig, TuningValues};
pub use sliding_dft::{SlidingDft, SmoothingMode};

/// Invalid analyzer or tuning configuration
///
/// Only raised at construction time; processing never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("k=0 (DC) is not supported")]
    ZeroFrequencyIndex,

    #[error("window length N=0 is not supported")]
    ZeroWindowLength,

    #[error("sample rate must be positive (got {0} Hz)")]
    InvalidSampleRate(u32),

    #[error("at least one key is required")]
    NoBands,

    #[error("tolerance must be within (0.0, 1.0] (got {0})")]
    InvalidTolerance(f64),
}
