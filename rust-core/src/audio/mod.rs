//! Sample history, PCM input and level output

pub mod buffer;
pub mod input;
pub mod output;

pub use buffer::RingBuffer;
pub use input::{InputError, PcmReader};
pub use output::LevelEncoder;
