//! Scripted collaborators for session tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use recorder_core::{
    AudioBlock, AudioSource, ContainerFactory, ContainerSpec, ContainerSummary, ContainerWriter, DeviceProvider,
    DeviceSource, RecorderError, RecordingResult, SessionDelegate, SessionState, StreamRequest, WavFileWriter,
    WavSink, WideSampleBlock,
};

/// A one-shot latch a fake device parks on.
#[derive(Clone, Default)]
pub struct Gate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

#[derive(Default)]
struct GateState {
    reached: bool,
    open: bool,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.inner;
        lock.lock().open = true;
        cvar.notify_all();
    }

    /// Called by the device: mark arrival, then wait for `open`.
    fn pass(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        state.reached = true;
        cvar.notify_all();
        while !state.open {
            cvar.wait(&mut state);
        }
    }

    /// Wait until the device is parked at the gate.
    pub fn wait_reached(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        while !state.reached {
            cvar.wait(&mut state);
        }
    }
}

/// What a fake device does once its scripted blocks run out.
#[derive(Clone)]
pub enum AfterScript {
    /// Fail the next read with `DeviceReadFailed`.
    Fail,
    /// Keep delivering silent blocks at this pace, like a live device.
    Paced(Duration),
}

/// Behaviour of one opened fake device.
#[derive(Clone)]
pub struct SourcePlan {
    pub blocks: Vec<Vec<i16>>,
    /// Read number (1-based) that parks on the gate before returning.
    pub hold: Option<(usize, Gate)>,
    pub after: AfterScript,
    pub fail_start: bool,
    /// Read number (1-based) that panics inside the capture thread.
    pub panic_on: Option<usize>,
}

impl SourcePlan {
    pub fn live() -> Self {
        Self {
            blocks: Vec::new(),
            hold: None,
            after: AfterScript::Paced(Duration::from_millis(2)),
            fail_start: false,
            panic_on: None,
        }
    }

    pub fn blocks_then_fail(blocks: Vec<Vec<i16>>) -> Self {
        Self {
            blocks,
            hold: None,
            after: AfterScript::Fail,
            fail_start: false,
            panic_on: None,
        }
    }
}

/// Counters shared by every device a provider opens.
#[derive(Default)]
pub struct DeviceStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub running: AtomicUsize,
    pub max_running: AtomicUsize,
}

pub struct FakeProvider {
    plans: Mutex<VecDeque<SourcePlan>>,
    pub stats: Arc<DeviceStats>,
    fail_open: bool,
}

impl FakeProvider {
    /// Hands out `plans` in order, then live devices.
    pub fn new(plans: Vec<SourcePlan>) -> Self {
        Self {
            plans: Mutex::new(plans.into()),
            stats: Arc::new(DeviceStats::default()),
            fail_open: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }
}

impl DeviceProvider for FakeProvider {
    fn open(&self, request: &StreamRequest) -> Result<Box<dyn DeviceSource>, RecorderError> {
        if self.fail_open {
            return Err(RecorderError::DeviceUnavailable("no input device".into()));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let plan = self.plans.lock().pop_front().unwrap_or_else(SourcePlan::live);
        Ok(Box::new(FakeSource {
            block_size: request.block_size,
            script: plan.blocks.clone().into(),
            plan,
            reads: 0,
            started: false,
            stats: Arc::clone(&self.stats),
        }))
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "fake-0".into(),
            name: "Fake Input".into(),
            is_default: true,
        }
    }
}

struct FakeSource {
    block_size: usize,
    script: VecDeque<Vec<i16>>,
    plan: SourcePlan,
    reads: usize,
    started: bool,
    stats: Arc<DeviceStats>,
}

impl DeviceSource for FakeSource {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.plan.fail_start {
            return Err(RecorderError::DeviceStartFailed("device busy".into()));
        }
        self.started = true;
        let running = self.stats.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_running.fetch_max(running, Ordering::SeqCst);
        Ok(())
    }

    fn read_block(&mut self) -> Result<AudioBlock, RecorderError> {
        self.reads += 1;
        if let Some((at, ref gate)) = self.plan.hold {
            if at == self.reads {
                gate.pass();
            }
        }
        if self.plan.panic_on == Some(self.reads) {
            panic!("driver fault on read {}", self.reads);
        }

        if let Some(samples) = self.script.pop_front() {
            return Ok(AudioBlock::new(samples));
        }

        match self.plan.after {
            AfterScript::Fail => Err(RecorderError::DeviceReadFailed("device disconnected".into())),
            AfterScript::Paced(pace) => {
                thread::sleep(pace);
                Ok(AudioBlock::new(vec![0; self.block_size]))
            }
        }
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if self.started {
            self.started = false;
            self.stats.running.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn close(mut self: Box<Self>) {
        let _ = self.stop();
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// WAV factory whose writers fail on the n-th block (1-based), and
/// optionally report a finalize failure after finalizing the file.
pub struct FailingFactory {
    pub fail_on_block: usize,
    pub fail_finalize: bool,
}

impl ContainerFactory for FailingFactory {
    fn create(&self, path: &Path, spec: &ContainerSpec) -> Result<Box<dyn ContainerWriter>, RecorderError> {
        Ok(Box::new(FailingWriter {
            inner: WavFileWriter::create(path, *spec)?,
            fail_on_block: self.fail_on_block,
            fail_finalize: self.fail_finalize,
            writes: 0,
        }))
    }
}

struct FailingWriter {
    inner: WavFileWriter,
    fail_on_block: usize,
    fail_finalize: bool,
    writes: usize,
}

impl ContainerWriter for FailingWriter {
    fn write_block(&mut self, block: &WideSampleBlock) -> Result<(), RecorderError> {
        self.writes += 1;
        if self.writes == self.fail_on_block {
            return Err(RecorderError::OutputWriteFailed("no space left on device".into()));
        }
        self.inner.write_block(block)
    }

    fn finalize(&mut self) -> Result<ContainerSummary, RecorderError> {
        let summary = self.inner.finalize()?;
        if self.fail_finalize {
            return Err(RecorderError::OutputFinalizeFailed("fsync failed".into()));
        }
        Ok(summary)
    }

    fn frames_written(&self) -> u64 {
        self.inner.frames_written()
    }

    fn data_bytes(&self) -> u64 {
        self.inner.data_bytes()
    }

    fn is_finalized(&self) -> bool {
        self.inner.is_finalized()
    }
}

/// A real file that refuses to grow past `cap` bytes, like a full disk.
pub struct CappedFile {
    file: File,
    cap: u64,
}

impl Write for CappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pos = self.file.stream_position()?;
        let room = self.cap.saturating_sub(pos) as usize;
        if room == 0 && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        self.file.write(&buf[..buf.len().min(room)])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for CappedFile {
    fn seek(&mut self, to: SeekFrom) -> io::Result<u64> {
        self.file.seek(to)
    }
}

impl WavSink for CappedFile {
    fn stored_len(&mut self) -> io::Result<u64> {
        self.file.stored_len()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        WavSink::truncate(&mut self.file, len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync()
    }
}

/// WAV factory whose files stop accepting bytes at `cap`.
pub struct CappedFactory {
    pub cap: u64,
}

impl ContainerFactory for CappedFactory {
    fn create(&self, path: &Path, spec: &ContainerSpec) -> Result<Box<dyn ContainerWriter>, RecorderError> {
        let file = File::create(path).map_err(|e| RecorderError::OutputCreateFailed(e.to_string()))?;
        let sink = CappedFile { file, cap: self.cap };
        Ok(Box::new(WavFileWriter::with_sink(sink, path, *spec)?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    State(SessionState),
    Error(RecorderError),
    Finished(RecordingResult),
}

/// Forwards delegate callbacks to a channel; optionally opens a gate once the
/// stop signal has been sent.
pub struct ChannelDelegate {
    sender: Mutex<mpsc::Sender<SessionEvent>>,
    open_on_stopping: Option<Gate>,
}

impl ChannelDelegate {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        Self::build(None)
    }

    pub fn opening(gate: Gate) -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        Self::build(Some(gate))
    }

    fn build(open_on_stopping: Option<Gate>) -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Arc::new(Self {
                sender: Mutex::new(sender),
                open_on_stopping,
            }),
            receiver,
        )
    }

    fn send(&self, event: SessionEvent) {
        let _ = self.sender.lock().send(event);
    }
}

impl SessionDelegate for ChannelDelegate {
    fn on_state_changed(&self, state: SessionState) {
        if state == SessionState::Stopping {
            if let Some(ref gate) = self.open_on_stopping {
                gate.open();
            }
        }
        self.send(SessionEvent::State(state));
    }

    fn on_error(&self, error: &RecorderError) {
        self.send(SessionEvent::Error(error.clone()));
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.send(SessionEvent::Finished(result.clone()));
    }
}

/// Block `n` of a synthetic recording: consecutive sample values.
pub fn ramp_block(n: usize, block_size: usize) -> Vec<i16> {
    (0..block_size).map(|j| (n * block_size + j) as i16).collect()
}

/// Wait for the first event matching `pred`.
pub fn wait_for(
    events: &mpsc::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> Option<SessionEvent> {
    loop {
        match events.recv_timeout(Duration::from_secs(5)) {
            Ok(event) if pred(&event) => return Some(event),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

pub fn wav_files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "wav").unwrap_or(false))
        .count()
}
