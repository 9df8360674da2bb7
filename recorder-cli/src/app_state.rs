use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use recorder_core::{
    RecorderConfig, RecorderError, RecordingResult, SessionController, SessionDelegate, SessionState,
    SessionStatus,
};

use crate::input::InputProvider;

/// Process-wide state holding the session controller.
pub struct AppState {
    pub controller: Mutex<SessionController<InputProvider>>,
}

impl AppState {
    pub fn new(provider: InputProvider, config: RecorderConfig) -> Self {
        Self::with_delegate(provider, config, ConsoleDelegate::new())
    }

    pub fn with_delegate(provider: InputProvider, config: RecorderConfig, delegate: Arc<dyn SessionDelegate>) -> Self {
        let mut controller = SessionController::new(provider, config);
        controller.set_delegate(delegate);
        Self {
            controller: Mutex::new(controller),
        }
    }
}

/// SessionDelegate that reports session events on stderr.
pub struct ConsoleDelegate;

impl ConsoleDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl SessionDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: SessionState) {
        eprintln!("[{}]", state.as_str());
    }

    fn on_error(&self, error: &RecorderError) {
        eprintln!("error: {}", error);
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        log::debug!("Finished session {}", result.session_id);
    }
}

// -- Serializable views --

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInfo {
    pub session_id: String,
    pub already_recording: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub state: String,
    pub session_id: Option<String>,
    pub output_path: Option<String>,
    pub blocks_written: u64,
    pub last_error: Option<String>,
    pub error_stage: Option<String>,
}

impl From<SessionStatus> for StatusInfo {
    fn from(status: SessionStatus) -> Self {
        Self {
            state: status.state.as_str().to_string(),
            session_id: status.session_id.map(|id| id.to_string()),
            output_path: status.output_path.map(|p| p.to_string_lossy().to_string()),
            blocks_written: status.blocks_written,
            error_stage: status.last_error.as_ref().map(|e| e.root_cause().stage().to_string()),
            last_error: status.last_error.map(|e| e.to_string()),
        }
    }
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    pub session_id: String,
    pub file_path: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub started_at: String,
    pub blocks_written: u64,
    pub data_bytes: u64,
    pub duration_secs: f64,
}
