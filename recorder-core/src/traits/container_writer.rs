use std::path::Path;

use crate::models::audio_block::WideSampleBlock;
use crate::models::audio_models::{ContainerSpec, ContainerSummary};
use crate::models::error::RecorderError;

/// A growing output container accepting sequential sample blocks.
pub trait ContainerWriter: Send {
    /// Append one block. Fails with `OutputWriteFailed`, including after finalize.
    fn write_block(&mut self, block: &WideSampleBlock) -> Result<(), RecorderError>;

    /// Make the header reflect the true data length and release the file.
    ///
    /// Must succeed at most once per writer; later calls fail with
    /// `OutputFinalizeFailed`.
    fn finalize(&mut self) -> Result<ContainerSummary, RecorderError>;

    fn frames_written(&self) -> u64;

    fn data_bytes(&self) -> u64;

    fn is_finalized(&self) -> bool;
}

/// Creates containers at a path. Fails with `OutputCreateFailed`.
pub trait ContainerFactory: Send + Sync {
    fn create(&self, path: &Path, spec: &ContainerSpec) -> Result<Box<dyn ContainerWriter>, RecorderError>;
}
