use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::shared::error::AudioIoError;

/// Domain interface for encoding a segment to an audio file.
pub trait AudioWriter: Send + Sync {
    /// Write `audio` to `path`, creating parent directories as needed.
    /// A failed write must not leave a partial file at `path`.
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), AudioIoError>;
}
