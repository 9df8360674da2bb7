use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::audio_block::WideSampleBlock;
use crate::models::audio_models::{ContainerSpec, ContainerSummary};
use crate::models::error::RecorderError;
use crate::processing::wav_format;
use crate::traits::container_writer::{ContainerFactory, ContainerWriter};

/// Largest data chunk whose RIFF size still fits in 32 bits.
const MAX_DATA_BYTES: u64 = u32::MAX as u64 - 36;

/// Storage a WAV stream is appended to and patched in place.
pub trait WavSink: Write + Seek + Send {
    /// Bytes that actually reached storage.
    fn stored_len(&mut self) -> io::Result<u64>;

    fn truncate(&mut self, len: u64) -> io::Result<()>;

    fn sync(&mut self) -> io::Result<()>;
}

impl WavSink for File {
    fn stored_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Streaming 16-bit PCM WAV writer.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, data size 0 until finalize]
/// [little-endian PCM data...]
/// ```
///
/// Samples go through a `BufWriter`; `finalize` patches the RIFF and data
/// sizes, truncates anything past the last stored frame and syncs. If the
/// buffered tail cannot be flushed (disk full, file size limit), the
/// unflushed bytes are dropped and the header describes the whole frames
/// already in storage. A writer dropped without `finalize` finalizes itself.
pub struct WavFileWriter<S: WavSink = File> {
    file_path: PathBuf,
    spec: ContainerSpec,
    sink: Option<BufWriter<S>>,
    data_bytes: u64,
    frames_written: u64,
    finalized: bool,
}

impl WavFileWriter {
    /// Create the file (and missing parent directories) and write the header.
    pub fn create(file_path: impl Into<PathBuf>, spec: ContainerSpec) -> Result<Self, RecorderError> {
        let file_path = file_path.into();
        check_spec(&spec)?;

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::OutputCreateFailed(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path).map_err(|e| {
            RecorderError::OutputCreateFailed(format!("failed to create {}: {}", file_path.display(), e))
        })?;
        Self::with_sink(file, file_path, spec)
    }
}

impl<S: WavSink> WavFileWriter<S> {
    /// Start a container on `sink`. `file_path` names it in logs and results.
    pub fn with_sink(sink: S, file_path: impl Into<PathBuf>, spec: ContainerSpec) -> Result<Self, RecorderError> {
        let file_path = file_path.into();
        check_spec(&spec)?;

        let mut sink = BufWriter::new(sink);
        let header = wav_format::generate_wav_header(spec.sample_rate, spec.bit_depth, spec.channels, 0);
        sink.write_all(&header)
            .map_err(|e| RecorderError::OutputCreateFailed(format!("failed to write header: {}", e)))?;

        log::debug!(
            "Created WAV container {} ({} Hz, {}-bit, {} ch)",
            file_path.display(),
            spec.sample_rate,
            spec.bit_depth,
            spec.channels
        );

        Ok(Self {
            file_path,
            spec,
            sink: Some(sink),
            data_bytes: 0,
            frames_written: 0,
            finalized: false,
        })
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn spec(&self) -> ContainerSpec {
        self.spec
    }

    fn frame_bytes(&self) -> u64 {
        u64::from(self.spec.channels) * u64::from(self.spec.bytes_per_sample())
    }

    fn encode(block: &WideSampleBlock) -> Result<Vec<u8>, RecorderError> {
        let mut out = Vec::with_capacity(block.len() * 2);
        for &sample in &block.samples {
            let narrow = i16::try_from(sample).map_err(|_| {
                RecorderError::OutputWriteFailed(format!("sample {} does not fit in 16 bits", sample))
            })?;
            out.extend_from_slice(&narrow.to_le_bytes());
        }
        Ok(out)
    }

    /// Size the data chunk from what reached storage after the buffered
    /// tail failed to flush: whole frames only, never more than was accepted.
    fn recover_stored(&mut self, sink: &mut S, cause: io::Error) -> Result<(), RecorderError> {
        let stored = sink
            .stored_len()
            .map_err(|e| RecorderError::OutputFinalizeFailed(e.to_string()))?;
        let header = wav_format::WAV_HEADER_SIZE as u64;
        if stored < header {
            return Err(RecorderError::OutputFinalizeFailed(format!(
                "header never reached storage: {}",
                cause
            )));
        }

        let frame = self.frame_bytes();
        let kept = ((stored - header) / frame * frame).min(self.data_bytes);
        log::warn!(
            "Flushing {} failed ({}); keeping {} of {} data bytes",
            self.file_path.display(),
            cause,
            kept,
            self.data_bytes
        );
        self.data_bytes = kept;
        self.frames_written = kept / frame;
        Ok(())
    }
}

fn check_spec(spec: &ContainerSpec) -> Result<(), RecorderError> {
    if spec.sample_rate == 0 {
        return Err(RecorderError::OutputCreateFailed("sample rate must be positive".into()));
    }
    if spec.bit_depth != 16 {
        return Err(RecorderError::OutputCreateFailed(format!(
            "unsupported bit depth: {}",
            spec.bit_depth
        )));
    }
    if spec.channels == 0 {
        return Err(RecorderError::OutputCreateFailed("channel count must be positive".into()));
    }
    Ok(())
}

impl<S: WavSink> ContainerWriter for WavFileWriter<S> {
    fn write_block(&mut self, block: &WideSampleBlock) -> Result<(), RecorderError> {
        if self.finalized {
            return Err(RecorderError::OutputWriteFailed("container already finalized".into()));
        }
        if block.format.sample_rate != self.spec.sample_rate || block.format.channels != self.spec.channels {
            return Err(RecorderError::OutputWriteFailed(format!(
                "block format {} Hz/{} ch does not match container {} Hz/{} ch",
                block.format.sample_rate, block.format.channels, self.spec.sample_rate, self.spec.channels
            )));
        }

        let bytes = Self::encode(block)?;
        if self.data_bytes + bytes.len() as u64 > MAX_DATA_BYTES {
            return Err(RecorderError::OutputWriteFailed("WAV size limit reached".into()));
        }

        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| RecorderError::OutputWriteFailed("file is not open".into()))?;
        sink.write_all(&bytes)
            .map_err(|e| RecorderError::OutputWriteFailed(format!("write failed: {}", e)))?;

        self.data_bytes += bytes.len() as u64;
        self.frames_written += block.frames() as u64;
        Ok(())
    }

    fn finalize(&mut self) -> Result<ContainerSummary, RecorderError> {
        if self.finalized {
            return Err(RecorderError::OutputFinalizeFailed("container already finalized".into()));
        }
        // Marked first: a failed finalize is not retried.
        self.finalized = true;

        let mut buffered = self
            .sink
            .take()
            .ok_or_else(|| RecorderError::OutputFinalizeFailed("file is not open".into()))?;
        let flushed = buffered.flush();
        let (mut sink, _unflushed) = buffered.into_parts();
        if let Err(e) = flushed {
            self.recover_stored(&mut sink, e)?;
        }

        let finalize_err = |e: io::Error| RecorderError::OutputFinalizeFailed(e.to_string());
        let data_size = self.data_bytes as u32;

        sink.seek(SeekFrom::Start(wav_format::RIFF_SIZE_OFFSET)).map_err(finalize_err)?;
        sink.write_all(&wav_format::riff_chunk_size(data_size).to_le_bytes())
            .map_err(finalize_err)?;
        sink.seek(SeekFrom::Start(wav_format::DATA_SIZE_OFFSET)).map_err(finalize_err)?;
        sink.write_all(&data_size.to_le_bytes()).map_err(finalize_err)?;
        sink.flush().map_err(finalize_err)?;

        sink.truncate(wav_format::WAV_HEADER_SIZE as u64 + self.data_bytes)
            .map_err(finalize_err)?;
        sink.sync().map_err(finalize_err)?;

        log::info!(
            "Finalized {}: {} frames, {} data bytes",
            self.file_path.display(),
            self.frames_written,
            self.data_bytes
        );

        Ok(ContainerSummary {
            frames_written: self.frames_written,
            data_bytes: self.data_bytes,
        })
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl<S: WavSink> Drop for WavFileWriter<S> {
    fn drop(&mut self) {
        if !self.finalized {
            log::warn!("WAV writer for {} dropped before finalize", self.file_path.display());
            if let Err(e) = self.finalize() {
                log::error!("Failed to finalize {} on drop: {}", self.file_path.display(), e);
            }
        }
    }
}

/// Creates [`WavFileWriter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavFileFactory;

impl ContainerFactory for WavFileFactory {
    fn create(&self, path: &Path, spec: &ContainerSpec) -> Result<Box<dyn ContainerWriter>, RecorderError> {
        Ok(Box::new(WavFileWriter::create(path, *spec)?))
    }
}
