//! Widening of device blocks into the container writer's representation.

use crate::models::audio_block::{AudioBlock, BlockFormat, WideSampleBlock};

/// Widen a block of 16-bit samples to `i32`, attaching `format`.
///
/// Source and destination describe the same linear PCM range, so the cast is
/// value-preserving: no scaling, no clipping, same count and order.
pub fn convert(block: &AudioBlock, format: BlockFormat) -> WideSampleBlock {
    WideSampleBlock {
        samples: block.samples().iter().map(|&s| i32::from(s)).collect(),
        format,
    }
}
