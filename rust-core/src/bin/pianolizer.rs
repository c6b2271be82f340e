//! Consumes an audio stream (32-bit float PCM on stdin) and emits the levels
//! of every piano key as one hex string per block.
//!
//! ```text
//! sox -V -d -traw -r44100 -b32 -c1 -efloat - | pianolizer | sudo hex2ws281x.py
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::io::{self, Write};
use std::path::PathBuf;

use pianolizer::{LevelEncoder, PcmReader, PianoTuning, SlidingDft, SmoothingMode, TuningConfig};

#[derive(Parser, Debug)]
#[command(name = "pianolizer", about = "Musical tone level analyzer for LED strips")]
struct Cli {
    /// TOML settings file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Buffer size in samples [default: 256]
    #[arg(short = 'b', long)]
    buffer_size: Option<usize>,

    /// Number of interleaved channels [default: 1]
    #[arg(short = 'c', long)]
    channels: Option<usize>,

    /// Sample rate in Hz [default: 44100]
    #[arg(short = 's', long)]
    sample_rate: Option<u32>,

    /// A4 reference frequency in Hz [default: 440]
    #[arg(short = 'p', long)]
    pitch_fork: Option<f64>,

    /// Number of keys on the piano keyboard [default: 61]
    #[arg(short = 'k', long)]
    keys: Option<u32>,

    /// Reference key index (A4) [default: 33]
    #[arg(short = 'r', long)]
    reference_key: Option<u32>,

    /// Average window in seconds, 0 to disable [default: 0.04]
    #[arg(short = 'a', long)]
    average_window: Option<f64>,

    /// Noise gate threshold, from 0 to 1 [default: 0]
    #[arg(short = 't', long)]
    threshold: Option<f32>,

    /// Frequency tolerance, range (0.0, 1.0] [default: 1]
    #[arg(short = 'x', long)]
    tolerance: Option<f64>,

    /// Return the square root of each value
    #[arg(short = 'y', long)]
    square_root: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Settings {
    buffer_size: usize,
    channels: usize,
    average_window: f64,
    threshold: f32,
    square_root: bool,
    tuning: TuningConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // known to work on a Raspberry Pi 3b
            buffer_size: 256,
            channels: 1,
            average_window: 0.04,
            threshold: 0.0,
            square_root: false,
            tuning: TuningConfig::default(),
        }
    }
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Settings::default(),
        };

        if let Some(v) = cli.buffer_size {
            settings.buffer_size = v;
        }
        if let Some(v) = cli.channels {
            settings.channels = v;
        }
        if let Some(v) = cli.average_window {
            settings.average_window = v;
        }
        if let Some(v) = cli.threshold {
            settings.threshold = v;
        }
        if cli.square_root {
            settings.square_root = true;
        }
        if let Some(v) = cli.sample_rate {
            settings.tuning.sample_rate = v;
        }
        if let Some(v) = cli.pitch_fork {
            settings.tuning.pitch_fork = v;
        }
        if let Some(v) = cli.keys {
            settings.tuning.keys = v;
        }
        if let Some(v) = cli.reference_key {
            settings.tuning.reference_key = v;
        }
        if let Some(v) = cli.tolerance {
            settings.tuning.tolerance = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(8000..=200_000).contains(&self.tuning.sample_rate) {
            bail!("sample rate must be between 8000 and 200000 Hz");
        }
        if !(0.01..=1.0).contains(&self.tuning.tolerance) {
            bail!("tolerance must be between 0.01 and 1.0");
        }
        Ok(())
    }
}

fn run(settings: Settings) -> Result<()> {
    let tuning = PianoTuning::new(settings.tuning.clone()).context("Invalid tuning")?;
    let mut sdft = SlidingDft::new(&tuning, SmoothingMode::Fast).context("Failed to build sliding DFT")?;
    let encoder = LevelEncoder {
        threshold: settings.threshold,
        square_root: settings.square_root,
    };

    let stdin = io::stdin();
    let mut reader = PcmReader::new(stdin.lock(), settings.buffer_size, settings.channels)?;
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut line = String::new();

    log::info!(
        "reading {} channel(s), {} samples per block",
        settings.channels,
        settings.buffer_size
    );

    while let Some(block) = reader.read_block()? {
        let levels = sdft.process(block, settings.average_window);
        let written = encoder
            .write_line(levels, &mut line, &mut stdout)
            .and_then(|_| stdout.flush());

        match written {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::info!("output closed");
                break;
            }
            Err(e) => return Err(e).context("Failed to write levels"),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    log::debug!("{settings:?}");

    run(settings)
}
