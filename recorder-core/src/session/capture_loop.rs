//! The acquisition loop: device → converter → container, until stopped or failed.

use std::thread;
use std::time::Duration;

use crate::models::audio_block::BlockFormat;
use crate::models::audio_models::ContainerSummary;
use crate::models::error::RecorderError;
use crate::processing::sample_converter;
use crate::session::stop_signal::StopListener;
use crate::traits::container_writer::ContainerWriter;
use crate::traits::device_source::DeviceSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    /// Format attached to every widened block.
    pub format: BlockFormat,
    /// Samples every device block must carry.
    pub block_size: usize,
    /// Optional sleep after each written block.
    pub throttle: Option<Duration>,
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    /// The stop signal was observed.
    Stopped,
    /// A device read or container write failed.
    Failed(RecorderError),
}

/// Everything the loop hands back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopReport {
    pub exit: LoopExit,
    pub blocks_written: u64,
    pub frames_written: u64,
    pub finalize: Result<ContainerSummary, RecorderError>,
}

impl LoopReport {
    /// The failure that ended the session: the read/write error if any,
    /// otherwise a finalize error.
    pub fn error(&self) -> Option<RecorderError> {
        match (&self.exit, &self.finalize) {
            (LoopExit::Failed(e), _) => Some(e.clone()),
            (LoopExit::Stopped, Err(e)) => Some(e.clone()),
            (LoopExit::Stopped, Ok(_)) => None,
        }
    }

    /// Every failure of the session in order: the read/write error, then
    /// a finalize error that followed it.
    pub fn errors(&self) -> Vec<RecorderError> {
        let mut errors = Vec::new();
        if let LoopExit::Failed(ref e) = self.exit {
            errors.push(e.clone());
        }
        if let Err(ref e) = self.finalize {
            errors.push(e.clone());
        }
        errors
    }
}

/// Run one session's capture loop on the current thread.
///
/// The stop signal is polled at the top of every iteration, so a read in
/// flight always completes and its block is written before the stop is
/// honored. A block of the wrong length ends the loop as a device read
/// failure. On every exit the device is stopped, the writer is finalized
/// exactly once and the device is closed. `on_block` receives the running
/// block count after each successful write.
pub fn run(
    mut source: Box<dyn DeviceSource>,
    mut writer: Box<dyn ContainerWriter>,
    stop: &StopListener,
    options: &LoopOptions,
    mut on_block: impl FnMut(u64),
) -> LoopReport {
    let mut blocks_written = 0u64;

    let exit = loop {
        if stop.is_stop_requested() {
            log::debug!("Stop signal observed after {} blocks", blocks_written);
            break LoopExit::Stopped;
        }

        let block = match source.read_block() {
            Ok(block) => block,
            Err(e) => {
                log::error!("Error reading from device: {}", e);
                break LoopExit::Failed(e);
            }
        };

        if block.len() != options.block_size {
            let e = RecorderError::DeviceReadFailed(format!(
                "short read: got {} of {} samples",
                block.len(),
                options.block_size
            ));
            log::error!("Error reading from device: {}", e);
            break LoopExit::Failed(e);
        }

        let wide = sample_converter::convert(&block, options.format);
        if let Err(e) = writer.write_block(&wide) {
            log::error!("Error writing to output: {}", e);
            break LoopExit::Failed(e);
        }

        blocks_written += 1;
        on_block(blocks_written);
        log::trace!("Wrote block {} ({} samples)", blocks_written, wide.len());

        if let Some(delay) = options.throttle {
            thread::sleep(delay);
        }
    };

    if let Err(e) = source.stop() {
        log::warn!("Failed to stop device: {}", e);
    }

    let finalize = writer.finalize();
    match &finalize {
        Ok(summary) => log::info!(
            "Output finalized: {} blocks, {} data bytes",
            blocks_written,
            summary.data_bytes
        ),
        Err(e) => log::error!("Error finalizing output: {}", e),
    }

    source.close();

    LoopReport {
        exit,
        blocks_written,
        frames_written: writer.frames_written(),
        finalize,
    }
}
