//! Command-line interface for pcm-recorder
//!
//! Handles argument parsing and logging configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use recorder_core::RecorderConfig;

/// pcm-recorder - record mono 16-bit audio to a WAV file
#[derive(Parser, Debug)]
#[command(name = "pcm-recorder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// WAV file to write
    #[arg(short, long, default_value = "output.wav")]
    pub output: PathBuf,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Samples per block read from the device
    #[arg(long, default_value_t = 2048)]
    pub block_size: usize,

    /// Sleep after every written block, in milliseconds
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Where samples come from
    #[arg(long, value_enum, default_value_t = SourceKind::Tone)]
    pub source: SourceKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record one session, stopping on Enter or after --seconds
    Record {
        /// Stop automatically after this many seconds
        #[arg(long)]
        seconds: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read start / stop / status / quit commands from stdin
    Interactive,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Synthetic 440 Hz sine wave
    Tone,
    /// Default input device
    Device,
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Recorder configuration described by the flags.
    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            output_path: self.output.clone(),
            throttle: self.throttle_ms.map(Duration::from_millis),
            ..RecorderConfig::default()
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Keep dependencies quiet
    builder.filter_level(LevelFilter::Warn);

    for module in ["pcm_recorder", "recorder_core", "recorder_cpal"] {
        builder.filter_module(module, args.log_level());
    }

    builder.format_timestamp_millis().init();
}
