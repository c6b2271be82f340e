//! Musical key to (k, N) mapping
//!
//! Derives one sliding DFT bin per piano key from the equal-tempered scale

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Tuning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of keys to analyze (61 covers C2 to C7)
    pub keys: u32,

    /// Index of the key tuned to `pitch_fork` (A4 by default)
    pub reference_key: u32,

    /// Frequency of the reference key in Hz
    pub pitch_fork: f64,

    /// Bandwidth relative to one semitone, within (0.0, 1.0]
    pub tolerance: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            keys: 61,
            reference_key: 33,
            pitch_fork: 440.0,
            tolerance: 1.0,
        }
    }
}

/// Bin geometry for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningValues {
    /// Frequency index
    pub k: u32,

    /// Window length in samples
    pub n: u32,
}

impl TuningValues {
    /// Frequency the bin is actually centered on, in Hz
    pub fn center_frequency(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 * (self.k as f64 / self.n as f64)
    }

    /// Width of the bin in Hz
    pub fn bandwidth(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.n as f64
    }
}

/// Equal-tempered piano tuning
#[derive(Debug, Clone)]
pub struct PianoTuning {
    config: TuningConfig,
}

impl PianoTuning {
    /// Create a tuning from a validated configuration
    pub fn new(config: TuningConfig) -> Result<Self, ConfigError> {
        if config.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(config.sample_rate));
        }
        if config.keys == 0 {
            return Err(ConfigError::NoBands);
        }
        if !(config.tolerance > 0.0 && config.tolerance <= 1.0) {
            return Err(ConfigError::InvalidTolerance(config.tolerance));
        }

        Ok(Self { config })
    }

    /// Default 61-key tuning at the given sample rate
    pub fn with_sample_rate(sample_rate: u32) -> Result<Self, ConfigError> {
        Self::new(TuningConfig {
            sample_rate,
            ..TuningConfig::default()
        })
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Number of keys (bands)
    pub fn bands(&self) -> usize {
        self.config.keys as usize
    }

    /// Fundamental frequency of a (possibly fractional) key
    ///
    /// See <https://en.wikipedia.org/wiki/Piano_key_frequencies>
    pub fn key_to_frequency(&self, key: f64) -> f64 {
        self.config.pitch_fork
            * 2f64.powf((key - self.config.reference_key as f64) / 12.0)
    }

    /// One (k, N) pair per key, in increasing key order
    pub fn mapping(&self) -> Vec<TuningValues> {
        let half_step = 0.5 * self.config.tolerance;

        (0..self.config.keys)
            .map(|key| {
                let key = key as f64;
                let frequency = self.key_to_frequency(key);
                let bandwidth = 2.0 * (self.key_to_frequency(key + half_step) - frequency);
                self.frequency_and_bandwidth_to_k_and_n(frequency, bandwidth)
            })
            .collect()
    }

    /// Approximate k and N for a frequency and bandwidth
    ///
    /// Walks N down from `sample_rate / bandwidth` while `sample_rate * k / N`
    /// keeps getting closer to `frequency`, and stops at the first step that
    /// doesn't improve. Bands end up slightly wider than requested and overlap
    /// a bit.
    pub fn frequency_and_bandwidth_to_k_and_n(&self, frequency: f64, bandwidth: f64) -> TuningValues {
        let sample_rate = self.config.sample_rate as f64;
        let mut n = (sample_rate / bandwidth).floor();
        let k = (frequency / bandwidth).floor();

        let mut delta = (sample_rate * (k / n) - frequency).abs();
        let mut candidate = n - 1.0;
        while candidate >= 0.0 {
            let candidate_delta = (sample_rate * (k / candidate) - frequency).abs();
            if candidate_delta < delta {
                delta = candidate_delta;
                n = candidate;
                candidate -= 1.0;
            } else {
                break;
            }
        }

        TuningValues {
            k: k as u32,
            n: n as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let tuning = PianoTuning::with_sample_rate(44100).unwrap();
        let mapping = tuning.mapping();

        assert_eq!(mapping.len(), 61);

        // C2
        assert_eq!(mapping[0], TuningValues { k: 17, n: 11462 });
        // A4
        assert_eq!(mapping[33], TuningValues { k: 17, n: 1704 });
        // C7
        assert_eq!(mapping[60], TuningValues { k: 17, n: 358 });
    }

    #[test]
    fn test_key_to_frequency() {
        let tuning = PianoTuning::new(TuningConfig::default()).unwrap();

        assert!((tuning.key_to_frequency(33.0) - 440.0).abs() < 1e-9);
        assert!((tuning.key_to_frequency(45.0) - 880.0).abs() < 1e-9);
        assert!((tuning.key_to_frequency(21.0) - 220.0).abs() < 1e-9);
        // C2
        assert!((tuning.key_to_frequency(0.0) - 65.40639132514966).abs() < 1e-9);
    }

    #[test]
    fn test_center_frequencies_stay_close() {
        let tuning = PianoTuning::with_sample_rate(44100).unwrap();

        for (key, values) in tuning.mapping().iter().enumerate() {
            let expected = tuning.key_to_frequency(key as f64);
            let actual = values.center_frequency(44100);
            // Within a quarter of a semitone
            assert!((actual / expected).log2().abs() * 12.0 < 0.25, "key {key}");
            assert!(values.k >= 1 && values.n > values.k);
        }
    }

    #[test]
    fn test_narrower_tolerance_lengthens_windows() {
        let wide = PianoTuning::with_sample_rate(44100).unwrap().mapping();
        let narrow = PianoTuning::new(TuningConfig {
            tolerance: 0.5,
            ..TuningConfig::default()
        })
        .unwrap()
        .mapping();

        assert!(narrow[33].n > wide[33].n);
        assert!(narrow[33].bandwidth(44100) < wide[33].bandwidth(44100));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let invalid = |config: TuningConfig| PianoTuning::new(config).unwrap_err();

        assert_eq!(
            invalid(TuningConfig { sample_rate: 0, ..TuningConfig::default() }),
            ConfigError::InvalidSampleRate(0)
        );
        assert_eq!(
            invalid(TuningConfig { keys: 0, ..TuningConfig::default() }),
            ConfigError::NoBands
        );
        assert_eq!(
            invalid(TuningConfig { tolerance: 0.0, ..TuningConfig::default() }),
            ConfigError::InvalidTolerance(0.0)
        );
        assert_eq!(
            invalid(TuningConfig { tolerance: 1.5, ..TuningConfig::default() }),
            ConfigError::InvalidTolerance(1.5)
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config: TuningConfig = toml::from_str("sample_rate = 48000\npitch_fork = 432.0").unwrap();

        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.pitch_fork, 432.0);
        assert_eq!(config.keys, 61);
        assert_eq!(config.reference_key, 33);
    }
}
