use thiserror::Error;

/// Errors that can occur while opening, running or finalizing a recording.
///
/// Every variant names the pipeline stage that failed, so callers can decide
/// whether another `start()` is worth attempting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("device start failed: {0}")]
    DeviceStartFailed(String),

    #[error("device read failed: {0}")]
    DeviceReadFailed(String),

    #[error("output create failed: {0}")]
    OutputCreateFailed(String),

    #[error("output write failed: {0}")]
    OutputWriteFailed(String),

    #[error("output finalize failed: {0}")]
    OutputFinalizeFailed(String),

    #[error("session start failed: {0}")]
    SessionStartFailed(Box<RecorderError>),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("capture loop terminated unexpectedly")]
    CaptureLoopPanicked,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl RecorderError {
    /// Wrap a device/output creation failure raised during `start()`.
    pub fn session_start(cause: RecorderError) -> Self {
        match cause {
            already @ Self::SessionStartFailed(_) => already,
            other => Self::SessionStartFailed(Box::new(other)),
        }
    }

    /// The innermost error, looking through `SessionStartFailed`.
    pub fn root_cause(&self) -> &RecorderError {
        match self {
            Self::SessionStartFailed(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Short label of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::DeviceUnavailable(_) => "device-open",
            Self::DeviceStartFailed(_) => "device-start",
            Self::DeviceReadFailed(_) => "device-read",
            Self::OutputCreateFailed(_) => "output-create",
            Self::OutputWriteFailed(_) => "output-write",
            Self::OutputFinalizeFailed(_) => "output-finalize",
            Self::SessionStartFailed(_) => "session-start",
            Self::ConfigurationFailed(_) => "configuration",
            Self::CaptureLoopPanicked => "capture-loop",
            Self::Unknown(_) => "unknown",
        }
    }

    /// True for failures of the device collaborator.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::DeviceUnavailable(_) | Self::DeviceStartFailed(_) | Self::DeviceReadFailed(_)
        )
    }
}
