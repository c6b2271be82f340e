//! Circular sample history for the sliding DFT
//!
//! Answers "what was the sample N steps ago?" in O(1) using a power-of-two
//! sized buffer, so wraparound is a bitmask instead of a division

/// Fixed-capacity delay line
///
/// Samples are stored as `f32`; the analyzers read them back at the precision
/// they were written with.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Sample storage, length is always a power of two
    buffer: Vec<f32>,

    /// `buffer.len() - 1`
    mask: usize,

    /// Position of the next write (not yet masked)
    index: usize,
}

impl RingBuffer {
    /// Create a ring buffer able to answer `read(requested_size)`
    ///
    /// # Arguments
    /// * `requested_size` - Longest distance that will be read back
    ///
    /// The allocation is rounded up to the smallest power of two holding
    /// `requested_size + 1` samples.
    pub fn new(requested_size: usize) -> Self {
        let size = (requested_size + 1).next_power_of_two();

        Self {
            buffer: vec![0.0; size],
            mask: size - 1,
            index: 0,
        }
    }

    /// Append a sample, overwriting the oldest one once full
    #[inline]
    pub fn write(&mut self, value: f32) {
        self.index &= self.mask;
        self.buffer[self.index] = value;
        self.index += 1;
    }

    /// Sample written `distance` steps before the most recent write
    ///
    /// `read(0)` is the latest sample. Distances at or beyond `capacity()`
    /// wrap around and alias newer data.
    #[inline]
    pub fn read(&self, distance: usize) -> f32 {
        self.buffer[self.index.wrapping_add(!distance) & self.mask]
    }

    /// Number of allocated slots
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_power_of_two() {
        assert_eq!(RingBuffer::new(15).capacity(), 16);
        assert_eq!(RingBuffer::new(16).capacity(), 32);
        assert_eq!(RingBuffer::new(1).capacity(), 2);
        assert_eq!(RingBuffer::new(11462).capacity(), 16384);
    }

    #[test]
    fn test_initialized_to_zeroes() {
        let rb = RingBuffer::new(15);
        for distance in 0..32 {
            assert_eq!(rb.read(distance), 0.0);
        }
    }

    #[test]
    fn test_single_write() {
        let mut rb = RingBuffer::new(15);
        rb.write(1.0);

        assert_eq!(rb.read(0), 1.0);
        assert_eq!(rb.read(1), 0.0);
    }

    #[test]
    fn test_sequence_and_overflow() {
        let mut rb = RingBuffer::new(15);

        for i in 0..10 {
            rb.write(i as f32);
        }
        for i in 0..10 {
            assert_eq!(rb.read(9 - i), i as f32);
        }

        for i in 10..20 {
            rb.write(i as f32);
        }

        // Head and tail
        assert_eq!(rb.read(0), 19.0);
        assert_eq!(rb.read(15), 4.0);

        // Past capacity wraps back onto the newest samples
        assert_eq!(rb.read(16), 19.0);
        assert_eq!(rb.read(17), 18.0);
    }
}
