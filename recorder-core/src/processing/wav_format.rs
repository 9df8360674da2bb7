//! Canonical 44-byte PCM WAV header: building it and reading it back.

/// Header length; sample data starts right after it.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk length, rewritten on finalize.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the `data` chunk length, rewritten on finalize.
pub const DATA_SIZE_OFFSET: u64 = 40;

const PCM_FORMAT_CODE: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// RIFF chunk length for a file carrying `data_bytes` of samples.
pub fn riff_chunk_size(data_bytes: u32) -> u32 {
    (WAV_HEADER_SIZE as u32 - 8) + data_bytes
}

/// Build the header for integer PCM at the given format.
///
/// The writer emits it with `data_bytes = 0` and patches both length fields
/// once the final size is known.
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_bytes: u32) -> [u8; WAV_HEADER_SIZE] {
    let frame_bytes = channels * (bit_depth / 8);
    let bytes_per_sec = sample_rate * u32::from(frame_bytes);

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_chunk_size(data_bytes).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&bytes_per_sec.to_le_bytes());
    out.extend_from_slice(&frame_bytes.to_le_bytes());
    out.extend_from_slice(&bit_depth.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes.to_le_bytes());

    let mut header = [0u8; WAV_HEADER_SIZE];
    header.copy_from_slice(&out);
    header
}

/// Fields of a canonical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeaderInfo {
    pub riff_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bit_depth: u16,
    pub data_size: u32,
}

/// Parse a header as produced by [`generate_wav_header`].
pub fn read_header_info(bytes: &[u8]) -> Result<WavHeaderInfo, String> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(format!("header too short: {} bytes", bytes.len()));
    }
    let tag = |at: usize| &bytes[at..at + 4];
    if tag(0) != b"RIFF" || tag(8) != b"WAVE" {
        return Err("missing RIFF/WAVE magic".into());
    }
    if tag(12) != b"fmt " || tag(36) != b"data" {
        return Err("not a canonical PCM header".into());
    }
    let format_code = u16_at(bytes, 20);
    if format_code != PCM_FORMAT_CODE {
        return Err(format!("unsupported format code: {}", format_code));
    }

    Ok(WavHeaderInfo {
        riff_size: u32_at(bytes, 4),
        channels: u16_at(bytes, 22),
        sample_rate: u32_at(bytes, 24),
        byte_rate: u32_at(bytes, 28),
        block_align: u16_at(bytes, 32),
        bit_depth: u16_at(bytes, 34),
        data_size: u32_at(bytes, 40),
    })
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_tags_in_place() {
        let header = generate_wav_header(44100, 16, 1, 0);
        assert_eq!(&header[..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn mono_16bit_fields() {
        let info = read_header_info(&generate_wav_header(44100, 16, 1, 40960)).unwrap();

        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.byte_rate, 88200);
        assert_eq!(info.block_align, 2);
        assert_eq!(info.bit_depth, 16);
        assert_eq!(info.data_size, 40960);
        assert_eq!(info.riff_size, 36 + 40960);
    }

    #[test]
    fn stereo_24bit_fields() {
        let info = read_header_info(&generate_wav_header(48000, 24, 2, 0)).unwrap();
        assert_eq!(info.block_align, 6);
        assert_eq!(info.byte_rate, 288000);
    }

    #[test]
    fn size_fields_sit_at_patch_offsets() {
        let header = generate_wav_header(8000, 16, 1, 0x0102_0304);
        let riff = RIFF_SIZE_OFFSET as usize;
        let data = DATA_SIZE_OFFSET as usize;
        assert_eq!(u32_at(&header, riff), riff_chunk_size(0x0102_0304));
        assert_eq!(&header[data..data + 4], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(read_header_info(b"RIFF").is_err());
        let mut header = generate_wav_header(44100, 16, 1, 0);
        header[0] = b'X';
        assert!(read_header_info(&header).is_err());
        let mut header = generate_wav_header(44100, 16, 1, 0);
        header[20] = 3;
        assert!(read_header_info(&header).is_err());
    }
}
