//! # recorder-cpal
//!
//! Cross-platform microphone backend for recorder-core, built on cpal.
//!
//! Provides:
//! - `CpalInputProvider` / `CpalInputSource`: blocking block reads from an input device
//! - `DeviceEnumerator`: default input lookup on the cpal host
//!
//! ## Platform Requirements
//! - Linux: ALSA development headers (`libasound2-dev`)
//! - macOS / Windows: no extra setup
//!
//! ## Usage
//! ```ignore
//! use recorder_core::{RecorderConfig, SessionController};
//! use recorder_cpal::CpalInputProvider;
//!
//! let mut controller = SessionController::new(CpalInputProvider::default_device(), RecorderConfig::default());
//! controller.start()?;
//! ```

pub mod cpal_input;
pub mod device_enumerator;

pub use cpal_input::{CpalInputProvider, CpalInputSource};
pub use device_enumerator::DeviceEnumerator;
