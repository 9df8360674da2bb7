use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::SessionState;

/// Event delegate for session notifications.
///
/// Called from the control thread and from the capture loop thread, never
/// while the controller's state lock is held. Implementations should marshal
/// to a UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: SessionState);

    /// Called when a start attempt or a running session fails.
    fn on_error(&self, error: &RecorderError);

    /// Called when a session ends gracefully and the file is finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
