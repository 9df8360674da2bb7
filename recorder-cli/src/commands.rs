use std::fs;

use recorder_core::StartOutcome;

use crate::app_state::{AppState, RecordingInfo, StartInfo, StatusInfo};

pub fn start_recording(state: &AppState) -> Result<StartInfo, String> {
    let mut controller = state.controller.lock();
    match controller.start().map_err(|e| e.to_string())? {
        StartOutcome::Started(id) => Ok(StartInfo {
            session_id: id.to_string(),
            already_recording: false,
        }),
        StartOutcome::AlreadyRecording(id) => Ok(StartInfo {
            session_id: id.to_string(),
            already_recording: true,
        }),
    }
}

/// `Ok(None)` when nothing was recording.
pub fn stop_recording(state: &AppState) -> Result<Option<RecordingInfo>, String> {
    let mut controller = state.controller.lock();
    let Some(result) = controller.stop().map_err(|e| e.to_string())? else {
        return Ok(None);
    };

    let file_name = result
        .file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let size_bytes = fs::metadata(&result.file_path).map(|m| m.len()).unwrap_or(0);

    Ok(Some(RecordingInfo {
        session_id: result.session_id.to_string(),
        file_path: result.file_path.to_string_lossy().to_string(),
        file_name,
        size_bytes,
        started_at: result.started_at,
        blocks_written: result.blocks_written,
        data_bytes: result.data_bytes,
        duration_secs: result.duration_secs,
    }))
}

pub fn get_status(state: &AppState) -> Result<StatusInfo, String> {
    Ok(state.controller.lock().status().into())
}
