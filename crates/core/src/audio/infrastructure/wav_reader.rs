use std::path::Path;

use hound::{SampleFormat, WavReader as HoundReader};

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::AudioIoError;

/// Decodes WAV files with `hound`, validating rate, channel count and length.
///
/// Integer PCM is scaled to [-1.0, 1.0]; 32-bit float is passed through.
/// No resampling or downmixing is performed: non-conforming files are
/// rejected so the caller can skip them.
pub struct WavReader;

impl WavReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioReader for WavReader {
    fn read_audio(
        &self,
        path: &Path,
        expected_sample_rate: u32,
    ) -> Result<AudioSegment, AudioIoError> {
        let mut reader = HoundReader::open(path).map_err(|e| AudioIoError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(AudioIoError::Channels {
                path: path.to_path_buf(),
                found: spec.channels,
            });
        }
        if spec.sample_rate != expected_sample_rate {
            return Err(AudioIoError::SampleRate {
                path: path.to_path_buf(),
                expected: expected_sample_rate,
                found: spec.sample_rate,
            });
        }

        let decode = |e: hound::Error| AudioIoError::Decode {
            path: path.to_path_buf(),
            source: e,
        };

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(decode)?,
            (SampleFormat::Int, 8) => {
                let scale = 1.0 / i8::MAX as f32;
                reader
                    .samples::<i8>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(decode)?
            }
            (SampleFormat::Int, 16) => {
                let scale = 1.0 / i16::MAX as f32;
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(decode)?
            }
            (SampleFormat::Int, bits @ (24 | 32)) => {
                let scale = 1.0 / ((1i64 << (bits - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(decode)?
            }
            (format, bits) => {
                return Err(AudioIoError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    reason: format!("{format:?} with {bits} bits per sample"),
                })
            }
        };

        if samples.is_empty() {
            return Err(AudioIoError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(AudioSegment::new(samples, spec.sample_rate))
    }
}
