//! Moving average of the per-key levels
//!
//! Effectively a low-pass over the output to get the general envelope. The
//! window length can be changed on the fly; it ramps one sample per update
//! so there are no jumps in the output.

use crate::audio::RingBuffer;

/// Averaging window shared by both strategies
#[derive(Debug, Clone)]
struct AverageWindow {
    sample_rate: u32,

    /// Current length in samples, unset until the first request
    current: Option<usize>,

    /// Length the current one ramps towards
    target: usize,
}

impl AverageWindow {
    fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            current: None,
            target: 0,
        }
    }

    /// Returns true when the target changed
    fn set_seconds(&mut self, value: f64) -> bool {
        let target = (value * self.sample_rate as f64).round().max(0.0) as usize;
        let changed = target != self.target;
        self.target = target;
        if self.current.is_none() {
            self.current = Some(target);
        }
        changed
    }

    #[inline]
    fn step(&mut self) {
        if let Some(current) = self.current.as_mut() {
            if self.target > *current {
                *current += 1;
            } else if self.target < *current {
                *current -= 1;
            }
        }
    }

    #[inline]
    fn current(&self) -> usize {
        self.current.unwrap_or(0)
    }
}

/// Fast approximation of the moving average; memory does not depend on the window
///
/// See <https://www.daycounter.com/LabBook/Moving-Average.phtml>
#[derive(Debug, Clone)]
pub struct FastMovingAverage {
    window: AverageWindow,
    sum: Vec<f32>,
}

impl FastMovingAverage {
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            window: AverageWindow::new(sample_rate),
            sum: vec![0.0; channels],
        }
    }

    pub fn update(&mut self, levels: &[f32]) {
        self.window.step();
        let window = self.window.current();

        for (sum, &level) in self.sum.iter_mut().zip(levels) {
            let current = *sum;
            *sum = if window != 0 {
                current + level - current / window as f32
            } else {
                level
            };
        }
    }
}

/// Exact moving average backed by one history buffer per channel
#[derive(Debug, Clone)]
pub struct HeavyMovingAverage {
    window: AverageWindow,
    sum: Vec<f32>,
    history: Vec<RingBuffer>,
}

impl HeavyMovingAverage {
    /// Create a new moving average
    ///
    /// # Arguments
    /// * `channels` - Number of levels per update
    /// * `sample_rate` - Converts between seconds and samples
    /// * `max_window` - History preallocated per channel, in samples (0 means one second)
    pub fn new(channels: usize, sample_rate: u32, max_window: usize) -> Self {
        let max_window = if max_window > 0 {
            max_window
        } else {
            sample_rate as usize
        };

        Self {
            window: AverageWindow::new(sample_rate),
            sum: vec![0.0; channels],
            history: (0..channels).map(|_| RingBuffer::new(max_window)).collect(),
        }
    }

    pub fn update(&mut self, levels: &[f32]) {
        let current = self.window.current();
        let target = self.window.target;

        for ((sum, history), &level) in self.sum.iter_mut().zip(self.history.iter_mut()).zip(levels) {
            history.write(level);
            *sum += level;

            if target == current {
                *sum -= history.read(current);
            } else if target < current {
                // Shrinking: drop the sample leaving the old window and the one leaving the new
                *sum -= history.read(current);
                *sum -= history.read(current - 1);
            }
        }

        self.window.step();
    }

    /// Longest window the history can serve without aliasing
    pub fn capacity(&self) -> usize {
        self.history.first().map_or(0, |h| h.capacity() - 1)
    }
}

/// Smoothing strategy, chosen once at construction
#[derive(Debug, Clone)]
pub enum MovingAverage {
    Fast(FastMovingAverage),
    Heavy(HeavyMovingAverage),
}

impl MovingAverage {
    fn window(&self) -> &AverageWindow {
        match self {
            MovingAverage::Fast(avg) => &avg.window,
            MovingAverage::Heavy(avg) => &avg.window,
        }
    }

    fn sum(&self) -> &[f32] {
        match self {
            MovingAverage::Fast(avg) => &avg.sum,
            MovingAverage::Heavy(avg) => &avg.sum,
        }
    }

    /// Request a new window length
    ///
    /// The first request is applied immediately; later ones ramp one sample
    /// per update. Seconds are rounded to the nearest sample.
    pub fn set_window_seconds(&mut self, value: f64) {
        match self {
            MovingAverage::Fast(avg) => {
                avg.window.set_seconds(value);
            }
            MovingAverage::Heavy(avg) => {
                if avg.window.set_seconds(value) && avg.window.target > avg.capacity() {
                    log::warn!(
                        "average window of {} samples exceeds history capacity of {}",
                        avg.window.target,
                        avg.capacity()
                    );
                }
            }
        }
    }

    /// Feed one level per channel
    pub fn update(&mut self, levels: &[f32]) {
        match self {
            MovingAverage::Fast(avg) => avg.update(levels),
            MovingAverage::Heavy(avg) => avg.update(levels),
        }
    }

    /// Current average for one channel
    pub fn read(&self, channel: usize) -> f32 {
        self.sum()[channel] / self.window().current() as f32
    }

    /// Current window length in samples
    pub fn window_len(&self) -> usize {
        self.window().current()
    }

    /// Window length being ramped towards, in samples
    pub fn target_window_len(&self) -> usize {
        self.window().target
    }

    /// Current window length in seconds
    pub fn window_seconds(&self) -> f64 {
        let window = self.window();
        window.current() as f64 / window.sample_rate as f64
    }

    pub fn channels(&self) -> usize {
        self.sum().len()
    }
}

impl From<FastMovingAverage> for MovingAverage {
    fn from(avg: FastMovingAverage) -> Self {
        MovingAverage::Fast(avg)
    }
}

impl From<HeavyMovingAverage> for MovingAverage {
    fn from(avg: HeavyMovingAverage) -> Self {
        MovingAverage::Heavy(avg)
    }
}
