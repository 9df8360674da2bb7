pub mod sample_converter;
pub mod wav_format;
