use std::time::Duration;

use serde::{Deserialize, Serialize};

/// An input device backing a device provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// What the controller asks a device provider to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_size: usize,
}

impl StreamRequest {
    /// Wall-clock length of one block at the requested rate.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / f64::from(self.sample_rate))
    }
}

/// Header fields a container is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSpec {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
}

impl ContainerSpec {
    pub fn bytes_per_sample(&self) -> u16 {
        self.bit_depth / 8
    }
}

/// What a container reports once finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerSummary {
    pub frames_written: u64,
    pub data_bytes: u64,
}
