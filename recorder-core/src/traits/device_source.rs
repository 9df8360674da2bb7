use crate::models::audio_block::AudioBlock;
use crate::models::audio_models::{AudioSource, StreamRequest};
use crate::models::error::RecorderError;

/// An opened input device delivering fixed-size blocks on demand.
///
/// Owned by the capture loop thread for the whole session.
pub trait DeviceSource: Send {
    /// Begin acquisition. Fails with `DeviceStartFailed`.
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Block until exactly `block_size` samples are available.
    ///
    /// Never returns a short block; a device that cannot fill one fails
    /// with `DeviceReadFailed`.
    fn read_block(&mut self) -> Result<AudioBlock, RecorderError>;

    /// Halt acquisition. Safe to call on a device that never started.
    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Release the device.
    fn close(self: Box<Self>);
}

/// Interface for platform-specific input backends.
///
/// Implemented by:
/// - `CpalInputProvider` (recorder-cpal)
/// - `ToneProvider` (recorder-cli, synthetic)
pub trait DeviceProvider: Send + Sync {
    /// Open the device for `request`. Fails with `DeviceUnavailable`.
    fn open(&self, request: &StreamRequest) -> Result<Box<dyn DeviceSource>, RecorderError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
