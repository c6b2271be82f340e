//! Smoothing of the per-key levels

pub mod moving_average;

pub use moving_average::{FastMovingAverage, HeavyMovingAverage, MovingAverage};
