//! Level encoding for LED drivers
//!
//! Turns a level snapshot into one line of hex bytes, two digits per key,
//! as consumed by WS281x LED strip drivers

use std::fmt::Write as _;
use std::io::{self, Write};

/// Post-processing applied before quantizing levels to bytes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelEncoder {
    /// Levels at or below this are silenced (noise gate)
    pub threshold: f32,

    /// Take the square root, boosting quiet keys
    pub square_root: bool,
}

impl LevelEncoder {
    /// Quantize one level to 0..=255
    #[inline]
    pub fn level_to_byte(&self, level: f32) -> u8 {
        let gated = if level > self.threshold { level } else { 0.0 };
        let shaped = if self.square_root { gated.sqrt() } else { gated };
        (255.0 * shaped.clamp(0.0, 1.0)).round() as u8
    }

    /// Append the hex encoding of `levels` to `out`
    pub fn encode_hex(&self, levels: &[f32], out: &mut String) {
        out.reserve(levels.len() * 2);
        for &level in levels {
            // Writing into a String cannot fail
            let _ = write!(out, "{:02x}", self.level_to_byte(level));
        }
    }

    /// Write one newline-terminated hex line
    pub fn write_line<W: Write>(&self, levels: &[f32], line: &mut String, writer: &mut W) -> io::Result<()> {
        line.clear();
        self.encode_hex(levels, line);
        line.push('\n');
        writer.write_all(line.as_bytes())
    }
}
