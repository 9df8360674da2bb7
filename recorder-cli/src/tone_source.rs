//! Synthetic sine-wave input, paced like a real device.

use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use recorder_core::{AudioBlock, AudioSource, DeviceProvider, DeviceSource, RecorderError, StreamRequest};

const DEFAULT_FREQUENCY_HZ: f64 = 440.0;
const DEFAULT_AMPLITUDE: f64 = 0.25;

/// Opens sine generators.
#[derive(Debug, Clone)]
pub struct ToneProvider {
    frequency_hz: f64,
    amplitude: f64,
}

impl ToneProvider {
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }
}

impl Default for ToneProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY_HZ, DEFAULT_AMPLITUDE)
    }
}

impl DeviceProvider for ToneProvider {
    fn open(&self, request: &StreamRequest) -> Result<Box<dyn DeviceSource>, RecorderError> {
        if request.sample_rate == 0 {
            return Err(RecorderError::DeviceUnavailable("tone needs a positive sample rate".into()));
        }
        Ok(Box::new(ToneSource {
            step: TAU * self.frequency_hz / request.sample_rate as f64,
            amplitude: self.amplitude * f64::from(i16::MAX),
            phase: 0.0,
            block_size: request.block_size,
            block_duration: request.block_duration(),
            next_due: None,
        }))
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "tone".into(),
            name: format!("{} Hz test tone", self.frequency_hz),
            is_default: false,
        }
    }
}

struct ToneSource {
    step: f64,
    amplitude: f64,
    phase: f64,
    block_size: usize,
    block_duration: Duration,
    /// When the next block is "captured"; `None` while stopped.
    next_due: Option<Instant>,
}

impl DeviceSource for ToneSource {
    fn start(&mut self) -> Result<(), RecorderError> {
        self.next_due = Some(Instant::now() + self.block_duration);
        Ok(())
    }

    fn read_block(&mut self) -> Result<AudioBlock, RecorderError> {
        let due = self
            .next_due
            .ok_or_else(|| RecorderError::DeviceReadFailed("tone source is not started".into()))?;
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
        self.next_due = Some(due + self.block_duration);

        let samples = (0..self.block_size)
            .map(|_| {
                let sample = (self.phase.sin() * self.amplitude).round() as i16;
                self.phase = (self.phase + self.step) % TAU;
                sample
            })
            .collect();
        Ok(AudioBlock::new(samples))
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.next_due = None;
        Ok(())
    }

    fn close(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(block_size: usize) -> StreamRequest {
        StreamRequest {
            sample_rate: 8000,
            channels: 1,
            block_size,
        }
    }

    #[test]
    fn blocks_are_full_and_continuous() {
        let mut source = ToneProvider::new(1000.0, 1.0).open(&request(8)).unwrap();
        source.start().unwrap();
        let first = source.read_block().unwrap();
        let second = source.read_block().unwrap();

        // 1 kHz at 8 kHz: eight samples per period.
        assert_eq!(first.len(), 8);
        assert_eq!(first.samples()[0], 0);
        assert_eq!(first.samples()[2], i16::MAX);
        assert_eq!(first.samples()[6], -i16::MAX);
        assert_eq!(second.samples()[2], i16::MAX);
    }

    #[test]
    fn amplitude_bounds_samples() {
        let mut source = ToneProvider::default().open(&request(400)).unwrap();
        source.start().unwrap();
        let block = source.read_block().unwrap();
        let peak = block.samples().iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak <= (f64::from(i16::MAX) * 0.25).round() as u16);
        assert!(peak > 0);
    }

    #[test]
    fn reads_are_paced() {
        let mut source = ToneProvider::default().open(&request(80)).unwrap();
        source.start().unwrap();
        let started = Instant::now();
        for _ in 0..3 {
            source.read_block().unwrap();
        }
        // 80 samples at 8 kHz = 10 ms per block.
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn read_before_start_fails() {
        let mut source = ToneProvider::default().open(&request(8)).unwrap();
        assert!(matches!(source.read_block(), Err(RecorderError::DeviceReadFailed(_))));
    }
}
