use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::shared::error::AudioIoError;

/// Domain interface for decoding an audio file into a validated mono segment.
pub trait AudioReader: Send + Sync {
    /// Decode `path`. Fails unless the file is mono, at `expected_sample_rate`,
    /// and has at least one sample.
    fn read_audio(
        &self,
        path: &Path,
        expected_sample_rate: u32,
    ) -> Result<AudioSegment, AudioIoError>;
}
