use std::fs;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter as HoundWriter};
use tempfile::NamedTempFile;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::shared::error::AudioIoError;

/// Encodes mono 16-bit PCM WAV files with `hound`.
///
/// Samples are clamped to [-1.0, 1.0] before quantization. The file is
/// encoded into a uniquely named temporary file in the destination directory
/// and persisted over the destination once finalized, so a failed write
/// leaves nothing behind.
pub struct WavWriter;

impl WavWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioWriter for WavWriter {
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), AudioIoError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let fs_err = |p: &Path, e: std::io::Error| AudioIoError::Fs {
            path: p.to_path_buf(),
            source: e,
        };
        fs::create_dir_all(parent).map_err(|e| fs_err(parent, e))?;

        let mut temp = temp_file_in(parent).map_err(|e| fs_err(parent, e))?;
        encode(&mut temp, path, audio)?;
        temp.persist(path).map_err(|e| fs_err(path, e.error))?;
        Ok(())
    }
}

fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".augment-").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(dir)
}

fn encode(
    temp: &mut NamedTempFile,
    path: &Path,
    audio: &AudioSegment,
) -> Result<(), AudioIoError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let write_err = |e: hound::Error| AudioIoError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer =
        HoundWriter::new(BufWriter::new(temp.as_file_mut()), spec).map_err(write_err)?;
    for &sample in audio.samples() {
        writer.write_sample(quantize(sample)).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)
}

fn quantize(sample: f32) -> i16 {
    let clamped = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (clamped * i16::MAX as f32).round() as i16
}
