//! Input backend selected on the command line.

use recorder_core::{AudioSource, DeviceProvider, DeviceSource, RecorderError, StreamRequest};

use crate::cli::SourceKind;
use crate::tone_source::ToneProvider;

pub enum InputProvider {
    Tone(ToneProvider),
    #[cfg(feature = "cpal")]
    Device(recorder_cpal::CpalInputProvider),
}

impl InputProvider {
    pub fn from_kind(kind: SourceKind) -> anyhow::Result<Self> {
        match kind {
            SourceKind::Tone => Ok(Self::Tone(ToneProvider::default())),
            #[cfg(feature = "cpal")]
            SourceKind::Device => Ok(Self::Device(recorder_cpal::CpalInputProvider::default_device())),
            #[cfg(not(feature = "cpal"))]
            SourceKind::Device => anyhow::bail!("recording from a device needs a build with the `cpal` feature"),
        }
    }
}

impl DeviceProvider for InputProvider {
    fn open(&self, request: &StreamRequest) -> Result<Box<dyn DeviceSource>, RecorderError> {
        match self {
            Self::Tone(tone) => tone.open(request),
            #[cfg(feature = "cpal")]
            Self::Device(device) => device.open(request),
        }
    }

    fn device_info(&self) -> AudioSource {
        match self {
            Self::Tone(tone) => tone.device_info(),
            #[cfg(feature = "cpal")]
            Self::Device(device) => device.device_info(),
        }
    }
}
