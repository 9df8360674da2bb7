use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::config::RecorderConfig;
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{SessionState, SessionStatus};
use crate::session::capture_loop::{self, LoopExit, LoopOptions, LoopReport};
use crate::session::stop_signal::{stop_signal, StopTrigger};
use crate::storage::wav_writer::WavFileFactory;
use crate::traits::container_writer::ContainerFactory;
use crate::traits::device_source::DeviceProvider;
use crate::traits::session_delegate::SessionDelegate;

/// Mutable state shared with the capture loop thread.
#[derive(Debug)]
struct SharedState {
    state: SessionState,
    last_error: Option<RecorderError>,
    session_id: Option<Uuid>,
    output_path: Option<PathBuf>,
    blocks_written: u64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_error: None,
            session_id: None,
            output_path: None,
            blocks_written: 0,
        }
    }

    fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            last_error: self.last_error.clone(),
            session_id: self.session_id,
            output_path: self.output_path.clone(),
            blocks_written: self.blocks_written,
        }
    }
}

/// Cheap, cloneable read access to a controller's status.
///
/// Never blocks behind `stop()`, so a UI can poll it while a stop is joining.
#[derive(Clone)]
pub struct StatusHandle {
    shared: Arc<Mutex<SharedState>>,
}

impl StatusHandle {
    pub fn status(&self) -> SessionStatus {
        self.shared.lock().snapshot()
    }
}

/// Outcome of a `start()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(Uuid),
    /// A session was already recording; nothing was opened.
    AlreadyRecording(Uuid),
}

/// One start-to-stop recording, owned by the controller.
struct RecordingSession {
    id: Uuid,
    output_path: PathBuf,
    started_at: DateTime<Utc>,
    stop_trigger: StopTrigger,
    handle: thread::JoinHandle<LoopReport>,
}

/// Moves the shared state back to idle when the loop thread ends, including
/// by unwinding. When `stop()` is already waiting on the loop, it announces
/// the idle transition itself after the join.
struct LoopExitGuard {
    shared: Arc<Mutex<SharedState>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    completed: bool,
}

impl LoopExitGuard {
    fn complete(mut self, report: &LoopReport) {
        self.completed = true;
        let error = report.error();
        // A finalize failure behind a read/write failure is reported too.
        let errors = report.errors();
        let stopping = {
            let mut s = self.shared.lock();
            let stopping = s.state == SessionState::Stopping;
            s.state = SessionState::Idle;
            s.blocks_written = report.blocks_written;
            if error.is_some() {
                s.last_error = error;
            }
            stopping
        };
        if let Some(ref delegate) = self.delegate {
            for e in &errors {
                delegate.on_error(e);
            }
            if !stopping {
                delegate.on_state_changed(SessionState::Idle);
            }
        }
    }
}

impl Drop for LoopExitGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        log::error!("Capture loop terminated without a report");
        let stopping = {
            let mut s = self.shared.lock();
            let stopping = s.state == SessionState::Stopping;
            s.state = SessionState::Idle;
            s.last_error = Some(RecorderError::CaptureLoopPanicked);
            stopping
        };
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&RecorderError::CaptureLoopPanicked);
            if !stopping {
                delegate.on_state_changed(SessionState::Idle);
            }
        }
    }
}

/// Idle ⇄ Recording state machine owning at most one capture loop.
///
/// Generic over the input backend and the container format:
/// ```text
/// [DeviceProvider] → DeviceSource ─┐
///                                  ├→ capture loop thread → finalized file
/// [ContainerFactory] → Writer ─────┘
/// ```
pub struct SessionController<P: DeviceProvider, F: ContainerFactory = WavFileFactory> {
    provider: P,
    factory: F,
    config: RecorderConfig,
    shared: Arc<Mutex<SharedState>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    session: Option<RecordingSession>,
}

impl<P: DeviceProvider> SessionController<P> {
    /// Controller writing WAV files.
    pub fn new(provider: P, config: RecorderConfig) -> Self {
        Self::with_factory(provider, WavFileFactory, config)
    }
}

impl<P: DeviceProvider, F: ContainerFactory> SessionController<P, F> {
    pub fn with_factory(provider: P, factory: F, config: RecorderConfig) -> Self {
        Self {
            provider,
            factory,
            config,
            shared: Arc::new(Mutex::new(SharedState::new())),
            delegate: None,
            session: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Replace the configuration used by the next `start()`.
    pub fn set_config(&mut self, config: RecorderConfig) -> Result<(), RecorderError> {
        if self.shared.lock().state.is_active() {
            return Err(RecorderError::ConfigurationFailed(
                "cannot reconfigure while recording".into(),
            ));
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().snapshot()
    }

    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.shared.lock().state.is_active()
    }

    /// Start recording. Transitions: idle → recording.
    ///
    /// While a session is recording this is a no-op. On failure nothing is
    /// left open and the controller stays idle.
    pub fn start(&mut self) -> Result<StartOutcome, RecorderError> {
        if let Some(ref session) = self.session {
            if self.shared.lock().state.is_active() {
                log::warn!("Start ignored: session {} is already recording", session.id);
                return Ok(StartOutcome::AlreadyRecording(session.id));
            }
        }
        self.reap_finished_session();

        self.config.validate().map_err(|e| self.fail_start(e))?;

        let request = self.config.stream_request();
        let device = self.provider.device_info();
        log::info!("Opening input device '{}' ({})", device.name, device.id);

        let mut source = self.provider.open(&request).map_err(|e| self.fail_start(e))?;
        if let Err(e) = source.start() {
            source.close();
            return Err(self.fail_start(e));
        }

        let spec = self.config.container_spec();
        let output_path = self.config.output_path.clone();
        let writer = match self.factory.create(&output_path, &spec) {
            Ok(writer) => writer,
            Err(e) => {
                if let Err(stop_err) = source.stop() {
                    log::warn!("Failed to stop device after output error: {}", stop_err);
                }
                source.close();
                return Err(self.fail_start(e));
            }
        };

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let (stop_trigger, stop_listener) = stop_signal();
        {
            let mut s = self.shared.lock();
            s.state = SessionState::Recording;
            s.last_error = None;
            s.session_id = Some(id);
            s.output_path = Some(output_path.clone());
            s.blocks_written = 0;
        }
        self.notify_state(SessionState::Recording);

        let options = LoopOptions {
            format: self.config.block_format(),
            block_size: self.config.block_size,
            throttle: self.config.throttle,
        };
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();

        let spawned = thread::Builder::new()
            .name("capture-loop".into())
            .spawn(move || {
                let guard = LoopExitGuard {
                    shared: Arc::clone(&shared),
                    delegate,
                    completed: false,
                };
                let report = capture_loop::run(source, writer, &stop_listener, &options, |blocks| {
                    shared.lock().blocks_written = blocks;
                });
                guard.complete(&report);
                report
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                // The closure was dropped: the writer finalized itself, the device closed.
                self.set_state(SessionState::Idle);
                return Err(self.fail_start(RecorderError::Unknown(format!(
                    "failed to spawn capture thread: {}",
                    e
                ))));
            }
        };

        log::info!("Recording session {} started → {}", id, output_path.display());

        self.session = Some(RecordingSession {
            id,
            output_path,
            started_at,
            stop_trigger,
            handle,
        });
        Ok(StartOutcome::Started(id))
    }

    /// Stop recording and wait for the file to be finalized.
    /// Transitions: recording → stopping → idle.
    ///
    /// Returns `Ok(None)` when there was nothing to stop, including a
    /// session that already ended on its own (see `status().last_error`).
    pub fn stop(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        let Some(session) = self.session.take() else {
            log::debug!("Stop ignored: no active session");
            return Ok(None);
        };

        let RecordingSession {
            id,
            output_path,
            started_at,
            stop_trigger,
            handle,
        } = session;

        let was_recording = {
            let mut s = self.shared.lock();
            let active = s.state == SessionState::Recording;
            if active {
                s.state = SessionState::Stopping;
            }
            active
        };

        if !was_recording {
            drop(stop_trigger);
            if handle.join().is_err() {
                log::error!("Capture loop for session {} panicked", id);
            }
            log::info!("Session {} had already ended", id);
            return Ok(None);
        }

        stop_trigger.fire();
        self.notify_state(SessionState::Stopping);

        let joined = handle.join();
        self.set_state(SessionState::Idle);
        let report = joined.map_err(|_| RecorderError::CaptureLoopPanicked)?;

        if let LoopExit::Failed(e) = report.exit {
            return Err(e);
        }
        let summary = report.finalize?;

        let result = RecordingResult {
            session_id: id,
            file_path: output_path,
            started_at: started_at.to_rfc3339(),
            blocks_written: report.blocks_written,
            frames_written: summary.frames_written,
            data_bytes: summary.data_bytes,
            duration_secs: RecordingResult::duration_for(summary.frames_written, self.config.sample_rate),
        };

        log::info!(
            "Recording session {} stopped: {} blocks, {:.2}s saved to {}",
            id,
            result.blocks_written,
            result.duration_secs,
            result.file_path.display()
        );

        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_finished(&result);
        }

        Ok(Some(result))
    }

    // --- Internal helpers ---

    fn set_state(&self, new_state: SessionState) {
        self.shared.lock().state = new_state;
        self.notify_state(new_state);
    }

    fn notify_state(&self, state: SessionState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn fail_start(&self, cause: RecorderError) -> RecorderError {
        let error = RecorderError::session_start(cause);
        log::error!("Failed to start recording: {}", error);
        self.shared.lock().last_error = Some(error.clone());
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        error
    }

    /// Join a session whose loop already ended by itself.
    fn reap_finished_session(&mut self) {
        if let Some(session) = self.session.take() {
            if session.handle.join().is_err() {
                log::error!("Capture loop for session {} panicked", session.id);
            }
            log::debug!("Reaped finished session {}", session.id);
        }
    }
}

impl<P: DeviceProvider, F: ContainerFactory> Drop for SessionController<P, F> {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop() {
                log::error!("Failed to stop recording on shutdown: {}", e);
            }
        }
    }
}
