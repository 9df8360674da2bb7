//! Microphone input through cpal.
//!
//! `cpal::Stream` is not `Send` on every platform, so each opened source
//! owns a device thread that builds the stream and keeps it alive until the
//! source is closed. The stream callback forwards the first channel as i16
//! chunks; `read_block` regroups them into fixed-size blocks.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use parking_lot::Mutex;

use recorder_core::{AudioBlock, AudioSource, DeviceProvider, DeviceSource, RecorderError, StreamRequest};

use crate::device_enumerator::DeviceEnumerator;

/// Longest wait for the stream callback before a read is considered failed.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

type Reply = mpsc::Sender<Result<(), RecorderError>>;

enum Command {
    Play(Reply),
    Pause(Reply),
}

/// Opens the host's default input device.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalInputProvider;

impl CpalInputProvider {
    pub fn default_device() -> Self {
        Self
    }
}

impl DeviceProvider for CpalInputProvider {
    fn open(&self, request: &StreamRequest) -> Result<Box<dyn DeviceSource>, RecorderError> {
        let source = CpalInputSource::open(*request)?;
        Ok(Box::new(source))
    }

    fn device_info(&self) -> AudioSource {
        DeviceEnumerator::new().default_input_info()
    }
}

/// One opened cpal input stream.
pub struct CpalInputSource {
    block_size: usize,
    samples: mpsc::Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    stream_error: Arc<Mutex<Option<String>>>,
    commands: Option<mpsc::Sender<Command>>,
    device_thread: Option<thread::JoinHandle<()>>,
    playing: bool,
}

impl CpalInputSource {
    fn open(request: StreamRequest) -> Result<Self, RecorderError> {
        let (sample_tx, sample_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let stream_error = Arc::new(Mutex::new(None));
        let error_slot = Arc::clone(&stream_error);

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let stream = match build_stream(&request, sample_tx, error_slot) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                serve_commands(&stream, command_rx);
                log::debug!("Input stream released");
            })
            .map_err(|e| RecorderError::DeviceUnavailable(format!("failed to spawn device thread: {}", e)))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(RecorderError::DeviceUnavailable("device thread exited during setup".into())));
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        Ok(Self {
            block_size: request.block_size,
            samples: sample_rx,
            pending: VecDeque::with_capacity(request.block_size * 2),
            stream_error,
            commands: Some(command_tx),
            device_thread: Some(handle),
            playing: false,
        })
    }

    /// Send a command to the device thread and wait for its answer.
    fn call(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), RecorderError> {
        let closed = || RecorderError::Unknown("device thread is gone".into());
        let commands = self.commands.as_ref().ok_or_else(closed)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        commands.send(command(reply_tx)).map_err(|_| closed())?;
        reply_rx.recv().map_err(|_| closed())?
    }
}

impl DeviceSource for CpalInputSource {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.playing {
            return Ok(());
        }
        self.call(Command::Play)?;
        self.playing = true;
        Ok(())
    }

    fn read_block(&mut self) -> Result<AudioBlock, RecorderError> {
        while self.pending.len() < self.block_size {
            if let Some(err) = self.stream_error.lock().take() {
                return Err(RecorderError::DeviceReadFailed(err));
            }
            match self.samples.recv_timeout(READ_TIMEOUT) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(RecorderError::DeviceReadFailed(format!(
                        "no audio received for {:?}",
                        READ_TIMEOUT
                    )))
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(RecorderError::DeviceReadFailed("input stream closed".into()))
                }
            }
        }
        Ok(AudioBlock::new(self.pending.drain(..self.block_size).collect()))
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if !self.playing {
            return Ok(());
        }
        self.playing = false;
        self.call(Command::Pause)
    }

    fn close(mut self: Box<Self>) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to pause input stream: {}", e);
        }
        // Dropping the command sender ends the device thread, which drops the stream.
        self.commands = None;
        if let Some(handle) = self.device_thread.take() {
            if handle.join().is_err() {
                log::error!("Device thread panicked");
            }
        }
    }
}

fn serve_commands(stream: &cpal::Stream, commands: mpsc::Receiver<Command>) {
    while let Ok(command) = commands.recv() {
        match command {
            Command::Play(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| RecorderError::DeviceStartFailed(format!("failed to start input stream: {}", e)));
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| RecorderError::Unknown(format!("failed to pause input stream: {}", e)));
                let _ = reply.send(result);
            }
        }
    }
}

fn build_stream(
    request: &StreamRequest,
    samples: mpsc::Sender<Vec<i16>>,
    error_slot: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, RecorderError> {
    let device = DeviceEnumerator::new().default_input()?;
    let (config, sample_format) = select_config(&device, request)?;

    log::info!(
        "Input config: {} Hz, {} channels, {:?} (recording channel 0)",
        config.sample_rate.0,
        config.channels,
        sample_format
    );

    match sample_format {
        SampleFormat::I16 => build_typed::<i16>(&device, &config, samples, error_slot),
        SampleFormat::U16 => build_typed::<u16>(&device, &config, samples, error_slot),
        SampleFormat::I32 => build_typed::<i32>(&device, &config, samples, error_slot),
        SampleFormat::F32 => build_typed::<f32>(&device, &config, samples, error_slot),
        other => Err(RecorderError::DeviceUnavailable(format!(
            "unsupported sample format: {:?}",
            other
        ))),
    }
}

/// Pick a configuration running at exactly the requested rate, preferring
/// the requested channel count.
fn select_config(device: &cpal::Device, request: &StreamRequest) -> Result<(StreamConfig, SampleFormat), RecorderError> {
    let rate = cpal::SampleRate(request.sample_rate);
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| RecorderError::DeviceUnavailable(format!("failed to query input configs: {}", e)))?
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .collect();

    let range = ranges
        .iter()
        .find(|range| range.channels() == request.channels)
        .or_else(|| ranges.first())
        .cloned()
        .ok_or_else(|| {
            RecorderError::DeviceUnavailable(format!("device does not support {} Hz", request.sample_rate))
        })?;

    let supported = range.with_sample_rate(rate);
    Ok((supported.config(), supported.sample_format()))
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: mpsc::Sender<Vec<i16>>,
    error_slot: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample + Send + 'static,
    i16: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let _ = samples.send(first_channel(data, channels));
            },
            move |err| {
                log::error!("Input stream error: {}", err);
                *error_slot.lock() = Some(err.to_string());
            },
            None,
        )
        .map_err(|e| RecorderError::DeviceUnavailable(format!("failed to build input stream: {}", e)))
}

/// First channel of an interleaved buffer, as i16.
fn first_channel<T>(data: &[T], channels: usize) -> Vec<i16>
where
    T: Sample,
    i16: FromSample<T>,
{
    data.iter().step_by(channels).map(|&s| i16::from_sample(s)).collect()
}
