//! Default input device lookup through the cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use recorder_core::{AudioSource, RecorderError};

pub struct DeviceEnumerator {
    host: cpal::Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn default_input(&self) -> Result<cpal::Device, RecorderError> {
        self.host
            .default_input_device()
            .ok_or_else(|| RecorderError::DeviceUnavailable("no default input device".into()))
    }

    /// Description of the default input, or a placeholder when there is none.
    pub fn default_input_info(&self) -> AudioSource {
        let name = self
            .host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_else(|| "Default Input".into());
        AudioSource {
            id: format!("{}:{}", self.host.id().name(), name),
            name,
            is_default: true,
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
