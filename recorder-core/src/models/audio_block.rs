/// Sample rate and channel layout attached to widened blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// One time-slice of captured audio: signed 16-bit samples, one channel.
///
/// Produced by a device source and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    samples: Vec<i16>,
}

impl AudioBlock {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A block widened to the container writer's integer representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideSampleBlock {
    pub samples: Vec<i32>,
    pub format: BlockFormat,
}

impl WideSampleBlock {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of frames (samples per channel) in the block.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }
}
