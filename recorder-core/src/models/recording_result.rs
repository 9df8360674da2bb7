use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result returned when a recording session is stopped gracefully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub session_id: uuid::Uuid,
    pub file_path: PathBuf,
    /// RFC 3339 timestamp of the `start()` call.
    pub started_at: String,
    pub blocks_written: u64,
    pub frames_written: u64,
    /// Value of the WAV header's data-size field.
    pub data_bytes: u64,
    pub duration_secs: f64,
}

impl RecordingResult {
    pub fn duration_for(frames_written: u64, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        frames_written as f64 / sample_rate as f64
    }
}
