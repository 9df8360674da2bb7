use std::path::PathBuf;

use super::error::RecorderError;

/// Session state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stopping → idle
///            ↓
///          idle (loop exited on a device or output error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopping,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Recording or waiting for the loop to finish after a stop request.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Stopping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

/// Snapshot returned by the controller's status query.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Failure of the most recent session or start attempt, if any.
    pub last_error: Option<RecorderError>,
    pub session_id: Option<uuid::Uuid>,
    pub output_path: Option<PathBuf>,
    pub blocks_written: u64,
}

impl SessionStatus {
    pub fn is_recording(&self) -> bool {
        self.state.is_active()
    }
}
