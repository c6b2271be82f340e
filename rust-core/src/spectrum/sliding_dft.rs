//! Sliding DFT over a bank of musical bins
//!
//! Ties together the ring buffer, one `DftBin` per key and the optional
//! moving average. Every sample costs O(keys); nothing is recomputed from
//! scratch.

use crate::audio::RingBuffer;
use crate::filters::{FastMovingAverage, HeavyMovingAverage, MovingAverage};

use super::bin::DftBin;
use super::tuning::PianoTuning;
use super::ConfigError;

/// How the levels are smoothed between blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingMode {
    /// Raw per-sample levels
    Disabled,

    /// Approximate moving average (`FastMovingAverage`)
    Fast,

    /// Exact moving average with history for up to `max_window_seconds`
    Heavy { max_window_seconds: f64 },
}

/// Per-key level analyzer
///
/// # Example
/// ```
/// use pianolizer::spectrum::SlidingDft;
///
/// let mut sdft = SlidingDft::piano(44100).unwrap();
/// let input = [0.0f32; 128];
/// // average over a 0.05 second window
/// let levels = sdft.process(&input, 0.05);
/// assert_eq!(levels.len(), 61);
/// ```
#[derive(Debug, Clone)]
pub struct SlidingDft {
    sample_rate: u32,
    bins: Vec<DftBin>,

    /// Latest snapshot, overwritten by every `process` call
    levels: Vec<f32>,

    ring_buffer: RingBuffer,
    moving_average: Option<MovingAverage>,
}

impl SlidingDft {
    /// Build one bin per key of the tuning
    pub fn new(tuning: &PianoTuning, smoothing: SmoothingMode) -> Result<Self, ConfigError> {
        let sample_rate = tuning.sample_rate();
        let bands = tuning.bands();

        let mut bins = Vec::with_capacity(bands);
        for (key, band) in tuning.mapping().into_iter().enumerate() {
            log::debug!(
                "key {}: k={} N={} center={:.2}Hz bandwidth={:.2}Hz",
                key,
                band.k,
                band.n,
                band.center_frequency(sample_rate),
                band.bandwidth(sample_rate)
            );
            bins.push(DftBin::new(band.k, band.n)?);
        }

        let max_n = bins.iter().map(|bin| bin.window_length()).max().unwrap_or(0);
        let ring_buffer = RingBuffer::new(max_n as usize);

        let moving_average: Option<MovingAverage> = match smoothing {
            SmoothingMode::Disabled => None,
            SmoothingMode::Fast => Some(FastMovingAverage::new(bands, sample_rate).into()),
            SmoothingMode::Heavy { max_window_seconds } => {
                let max_window = (sample_rate as f64 * max_window_seconds).round().max(0.0) as usize;
                Some(HeavyMovingAverage::new(bands, sample_rate, max_window).into())
            }
        };

        log::info!(
            "sliding DFT: {} keys @ {}Hz, ring buffer {} samples, smoothing {:?}",
            bands,
            sample_rate,
            ring_buffer.capacity(),
            smoothing
        );

        Ok(Self {
            sample_rate,
            bins,
            levels: vec![0.0; bands],
            ring_buffer,
            moving_average,
        })
    }

    /// Default 61-key piano at `sample_rate`, with fast smoothing
    pub fn piano(sample_rate: u32) -> Result<Self, ConfigError> {
        Self::new(&PianoTuning::with_sample_rate(sample_rate)?, SmoothingMode::Fast)
    }

    /// Process a block of samples
    ///
    /// # Arguments
    /// * `samples` - Mono samples, in order
    /// * `average_window_seconds` - Moving average window; ignored without smoothing
    ///
    /// # Returns
    /// One level per key, in increasing key order. The slice is reused by the
    /// next call; copy it to keep history.
    pub fn process(&mut self, samples: &[f32], average_window_seconds: f64) -> &[f32] {
        if samples.is_empty() {
            return &self.levels;
        }

        if let Some(moving_average) = self.moving_average.as_mut() {
            moving_average.set_window_seconds(average_window_seconds);
        }

        for &current_sample in samples {
            self.ring_buffer.write(current_sample);

            for (bin, level) in self.bins.iter_mut().zip(self.levels.iter_mut()) {
                let previous_sample = self.ring_buffer.read(bin.window_length() as usize);
                bin.update(previous_sample as f64, current_sample as f64);
                *level = bin.normalized_amplitude_spectrum() as f32;
            }

            if let Some(moving_average) = self.moving_average.as_mut() {
                moving_average.update(&self.levels);
            }
        }

        // Snapshot after smoothing
        if let Some(moving_average) = self.moving_average.as_ref() {
            if moving_average.window_len() > 0 {
                for (band, level) in self.levels.iter_mut().enumerate() {
                    *level = moving_average.read(band);
                }
            }
        }

        &self.levels
    }

    /// Latest snapshot without processing anything
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn bins(&self) -> &[DftBin] {
        &self.bins
    }

    pub fn bands(&self) -> usize {
        self.bins.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn moving_average(&self) -> Option<&MovingAverage> {
        self.moving_average.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_ring_buffer_covers_longest_window() {
        let sdft = SlidingDft::piano(44100).unwrap();

        assert_eq!(sdft.bands(), 61);
        assert_eq!(sdft.bins()[0].window_length(), 11462);
        assert_eq!(sdft.ring_buffer.capacity(), 16384);
    }

    #[test]
    fn test_smoothing_modes() {
        let tuning = PianoTuning::with_sample_rate(44100).unwrap();

        let disabled = SlidingDft::new(&tuning, SmoothingMode::Disabled).unwrap();
        assert!(disabled.moving_average().is_none());

        let fast = SlidingDft::new(&tuning, SmoothingMode::Fast).unwrap();
        assert!(matches!(fast.moving_average(), Some(MovingAverage::Fast(_))));

        let heavy = SlidingDft::new(&tuning, SmoothingMode::Heavy { max_window_seconds: 0.25 }).unwrap();
        match heavy.moving_average() {
            Some(MovingAverage::Heavy(avg)) => assert_eq!(avg.capacity(), 16383),
            other => panic!("unexpected smoothing {other:?}"),
        }
    }

    #[test]
    fn test_pure_tone_saturates_its_key() {
        let tuning = PianoTuning::with_sample_rate(44100).unwrap();
        let mut sdft = SlidingDft::new(&tuning, SmoothingMode::Disabled).unwrap();

        // Exactly 17 periods per 1704 samples: the center of A4
        let step = 2.0 * PI * 17.0 / 1704.0;
        let samples: Vec<f32> = (0..1704 * 8).map(|i| (step * i as f64).sin() as f32).collect();
        let levels = sdft.process(&samples, 0.0);

        assert!((levels[33] - 1.0).abs() < 1e-3);
        assert!(levels[33] > levels[32]);
        assert!(levels[33] > levels[34]);
    }

    #[test]
    fn test_window_follows_hint() {
        let mut sdft = SlidingDft::piano(44100).unwrap();
        let block = [0.0f32; 128];

        sdft.process(&block, 0.01);
        assert_eq!(sdft.moving_average().unwrap().window_len(), 441);

        // Grows by one sample per processed sample
        sdft.process(&block, 0.02);
        assert_eq!(sdft.moving_average().unwrap().window_len(), 441 + 128);
        assert_eq!(sdft.moving_average().unwrap().target_window_len(), 882);
    }
}
