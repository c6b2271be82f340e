//! Single-bin Discrete Fourier Transform, updated one sample at a time
//!
//! Keeps the k-th coefficient of an N-sample window current with the
//! sliding DFT recurrence, alongside the running power of the same window.
//! See <https://www.comm.utoronto.ca/~dimitris/ece431/slidingdft.pdf>

use num_complex::Complex;
use std::f64::consts::{PI, SQRT_2};

use super::ConfigError;

/// Narrow-band analyzer for one frequency
#[derive(Debug, Clone)]
pub struct DftBin {
    /// Frequency index (frequency divided by bandwidth)
    k: u32,

    /// Window length (sample rate divided by bandwidth)
    n: u32,

    /// One step of phase advance, `exp(i * 2π * k / N)`
    coeff: Complex<f64>,

    /// Running DFT coefficient
    dft: Complex<f64>,

    /// Sum of squared samples over the last N samples
    total_power: f64,

    /// 0 dB level for `decibels()`
    reference_amplitude: f64,
}

impl DftBin {
    /// Create a new bin
    ///
    /// # Arguments
    /// * `k` - Frequency index, must not be 0 (DC is not supported)
    /// * `n` - Window length in samples, must not be 0
    ///
    /// # Example
    /// ```
    /// use pianolizer::spectrum::DftBin;
    /// // center 439.96 Hz, bandwidth 25.88 Hz at 44100 Hz
    /// let bin = DftBin::new(17, 1704).unwrap();
    /// assert_eq!(bin.window_length(), 1704);
    /// ```
    pub fn new(k: u32, n: u32) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroFrequencyIndex);
        }
        if n == 0 {
            return Err(ConfigError::ZeroWindowLength);
        }

        let q = 2.0 * PI * (k as f64 / n as f64);

        Ok(Self {
            k,
            n,
            coeff: Complex::from_polar(1.0, q),
            dft: Complex::new(0.0, 0.0),
            total_power: 0.0,
            reference_amplitude: 1.0,
        })
    }

    /// Slide the window by one sample
    ///
    /// # Arguments
    /// * `previous_sample` - Sample leaving the window (taken N samples ago)
    /// * `current_sample` - Sample entering the window
    #[inline]
    pub fn update(&mut self, previous_sample: f64, current_sample: f64) {
        self.total_power += current_sample * current_sample;
        self.total_power -= previous_sample * previous_sample;

        self.dft = self.coeff * (self.dft - previous_sample + current_sample);
    }

    /// Root mean square of the window
    pub fn rms(&self) -> f64 {
        (self.total_power / self.n as f64).sqrt()
    }

    /// Amplitude spectrum in volts RMS
    pub fn amplitude_spectrum(&self) -> f64 {
        SQRT_2 * (self.dft.norm() / self.n as f64)
    }

    /// Amplitude relative to the RMS of the window
    ///
    /// Close to 1.0 for a pure tone at the bin frequency, 0 when the window
    /// holds no power.
    pub fn normalized_amplitude_spectrum(&self) -> f64 {
        if self.total_power > 0.0 {
            self.amplitude_spectrum() / self.rms()
        } else {
            0.0
        }
    }

    /// Amplitude spectrum in dB relative to `reference_amplitude`
    pub fn decibels(&self) -> f64 {
        20.0 * (self.amplitude_spectrum() / self.reference_amplitude).log10()
    }

    /// Set the 0 dB level
    pub fn set_reference_amplitude(&mut self, reference_amplitude: f64) {
        self.reference_amplitude = reference_amplitude;
    }

    pub fn reference_amplitude(&self) -> f64 {
        self.reference_amplitude
    }

    /// Running power; may dip slightly below zero through cancellation
    pub fn total_power(&self) -> f64 {
        self.total_power
    }

    pub fn frequency_index(&self) -> u32 {
        self.k
    }

    pub fn window_length(&self) -> u32 {
        self.n
    }
}
