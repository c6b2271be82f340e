//! Pianolizer - Musical Tone Level Analysis
//!
//! Sliding DFT engine reporting, once per block of samples, how loud each
//! piano key is. Suited to driving LED strips and other visualizers.

pub mod audio;
pub mod filters;
pub mod spectrum;

pub use audio::{LevelEncoder, PcmReader, RingBuffer};
pub use filters::MovingAverage;
pub use spectrum::{ConfigError, DftBin, PianoTuning, SlidingDft, SmoothingMode, TuningConfig};
