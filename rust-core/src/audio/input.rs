//! Raw PCM input
//!
//! Reads interleaved 32-bit float frames (native endianness, e.g. the output
//! of `sox -traw -b32 -efloat`) and mixes every frame down to one sample

use std::io::{ErrorKind, Read};
use thiserror::Error;

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read audio input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Number of channels must be at least 1")]
    InvalidChannels,

    #[error("Block size must be at least 1 sample")]
    InvalidBlockSize,
}

/// Block reader over any byte stream
pub struct PcmReader<R: Read> {
    reader: R,
    channels: usize,

    /// Raw bytes of one interleaved block
    raw: Vec<u8>,

    /// Mixed-down block handed out by `read_block`
    block: Vec<f32>,
}

impl<R: Read> PcmReader<R> {
    /// Create a new reader
    ///
    /// # Arguments
    /// * `reader` - Source of interleaved samples
    /// * `block_size` - Mono samples per block
    /// * `channels` - Interleaved channels per frame
    pub fn new(reader: R, block_size: usize, channels: usize) -> Result<Self, InputError> {
        if channels == 0 {
            return Err(InputError::InvalidChannels);
        }
        if block_size == 0 {
            return Err(InputError::InvalidBlockSize);
        }

        Ok(Self {
            reader,
            channels,
            raw: vec![0; block_size * channels * SAMPLE_BYTES],
            block: vec![0.0; block_size],
        })
    }

    /// Read and mix down the next block
    ///
    /// # Returns
    /// `None` at end of stream. A short final read is zero-padded to the full
    /// block size.
    pub fn read_block(&mut self) -> Result<Option<&[f32]>, InputError> {
        let bytes = self.fill_raw()?;
        let samples = bytes / SAMPLE_BYTES;
        if samples == 0 {
            return Ok(None);
        }
        if samples < self.block.len() * self.channels {
            log::debug!("short read: {} of {} samples", samples, self.block.len() * self.channels);
        }

        self.block.fill(0.0);
        for (i, chunk) in self.raw[..samples * SAMPLE_BYTES].chunks_exact(SAMPLE_BYTES).enumerate() {
            let sample = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.block[i / self.channels] += sample;
        }

        Ok(Some(&self.block))
    }

    /// Fill the raw buffer until it is full or the stream ends
    fn fill_raw(&mut self) -> Result<usize, InputError> {
        let mut filled = 0;
        while filled < self.raw.len() {
            match self.reader.read(&mut self.raw[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn to_bytes(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn test_mono_blocks() {
        let data = to_bytes(&[1.0, 2.0, 3.0, 4.0]);
        let mut reader = PcmReader::new(Cursor::new(data), 2, 1).unwrap();

        assert_eq!(reader.read_block().unwrap(), Some(&[1.0, 2.0][..]));
        assert_eq!(reader.read_block().unwrap(), Some(&[3.0, 4.0][..]));
        assert_eq!(reader.read_block().unwrap(), None);
    }

    #[test]
    fn test_stereo_mixdown() {
        let data = to_bytes(&[0.25, 0.5, -1.0, 1.0, 0.125, 0.125]);
        let mut reader = PcmReader::new(Cursor::new(data), 3, 2).unwrap();

        assert_eq!(reader.read_block().unwrap(), Some(&[0.75, 0.0, 0.25][..]));
        assert_eq!(reader.read_block().unwrap(), None);
    }

    #[test]
    fn test_short_read_is_zero_padded() {
        // Trailing partial sample is dropped
        let mut data = to_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        data.push(0xff);
        let mut reader = PcmReader::new(Cursor::new(data), 4, 1).unwrap();

        assert_eq!(reader.read_block().unwrap(), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(reader.read_block().unwrap(), Some(&[5.0, 0.0, 0.0, 0.0][..]));
        assert_eq!(reader.read_block().unwrap(), None);
    }

    #[test]
    fn test_rejects_invalid_layout() {
        assert!(matches!(
            PcmReader::new(Cursor::new(Vec::new()), 256, 0),
            Err(InputError::InvalidChannels)
        ));
        assert!(matches!(
            PcmReader::new(Cursor::new(Vec::new()), 0, 1),
            Err(InputError::InvalidBlockSize)
        ));
    }
}
