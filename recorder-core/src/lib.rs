//! # recorder-core
//!
//! Platform-agnostic capture-to-storage pipeline.
//!
//! Pulls fixed-size blocks of 16-bit samples from a device, widens them, and
//! streams them into a WAV file whose header is finalized on every exit path.
//! Input backends (cpal, synthetic tone) implement the `DeviceProvider` trait
//! and plug into the generic `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/       ← DeviceProvider, DeviceSource, ContainerFactory, ContainerWriter, SessionDelegate
//! ├── models/       ← RecorderError, RecorderConfig, SessionState, AudioBlock, RecordingResult, etc.
//! ├── processing/   ← sample converter, WAV header generation
//! ├── session/      ← capture loop, stop signal, SessionController
//! └── storage/      ← WavFileWriter
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_block::{AudioBlock, BlockFormat, WideSampleBlock};
pub use models::audio_models::{AudioSource, ContainerSpec, ContainerSummary, StreamRequest};
pub use models::config::RecorderConfig;
pub use models::error::RecorderError;
pub use models::recording_result::RecordingResult;
pub use models::state::{SessionState, SessionStatus};
pub use processing::sample_converter::convert;
pub use session::capture_loop::{LoopExit, LoopOptions, LoopReport};
pub use session::controller::{SessionController, StartOutcome, StatusHandle};
pub use session::stop_signal::{stop_signal, StopListener, StopTrigger};
pub use storage::wav_writer::{WavFileFactory, WavFileWriter, WavSink};
pub use traits::container_writer::{ContainerFactory, ContainerWriter};
pub use traits::device_source::{DeviceProvider, DeviceSource};
pub use traits::session_delegate::SessionDelegate;
