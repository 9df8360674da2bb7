use std::path::PathBuf;
use std::time::Duration;

use super::audio_block::BlockFormat;
use super::audio_models::{ContainerSpec, StreamRequest};
use super::error::RecorderError;

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Capture sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Bit depth of the output container (default: 16). Only 16 is recorded.
    pub bit_depth: u16,

    /// Number of captured channels (default: 1). Only mono is recorded.
    pub channels: u16,

    /// Samples per block pulled from the device (default: 2048).
    pub block_size: usize,

    /// Where the WAV file is written (default: `output.wav`).
    pub output_path: PathBuf,

    /// Optional fixed delay after every written block to bound CPU usage.
    /// The device's blocking read already paces the loop.
    pub throttle: Option<Duration>,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::ConfigurationFailed("sample rate must be positive".into()));
        }
        if self.block_size == 0 {
            return Err(RecorderError::ConfigurationFailed("block size must be positive".into()));
        }
        if self.bit_depth != 16 {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported bit depth: {}",
                self.bit_depth
            )));
        }
        if self.channels != 1 {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(RecorderError::ConfigurationFailed("output path is empty".into()));
        }
        Ok(())
    }

    pub fn block_format(&self) -> BlockFormat {
        BlockFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// What to ask the device provider for.
    pub fn stream_request(&self) -> StreamRequest {
        StreamRequest {
            sample_rate: self.sample_rate,
            channels: self.channels,
            block_size: self.block_size,
        }
    }

    /// Header fields for the output container.
    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            channels: self.channels,
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            channels: 1,
            block_size: 2048,
            output_path: PathBuf::from("output.wav"),
            throttle: None,
        }
    }
}
