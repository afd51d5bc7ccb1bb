use std::path::Path;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::dataset::domain::dataset_entry::EntryKind;
use crate::dataset::infrastructure::directory_scanner;
use crate::shared::error::AugmentError;

/// Immutable set of noise clips mixed into signals by the noise transformer.
///
/// Loaded once at construction and only read afterwards, so one library can
/// be shared by every worker of a run.
#[derive(Debug)]
pub struct NoiseLibrary {
    clips: Vec<AudioSegment>,
}

impl NoiseLibrary {
    /// Fails if there are no clips or any clip has no samples.
    pub fn new(clips: Vec<AudioSegment>) -> Result<Self, AugmentError> {
        if clips.is_empty() {
            return Err(AugmentError::configuration("noise library is empty"));
        }
        if let Some(idx) = clips.iter().position(|c| c.is_empty()) {
            return Err(AugmentError::configuration(format!(
                "noise clip #{idx} has no samples"
            )));
        }
        Ok(Self { clips })
    }

    /// Load every WAV file below `dir` (recursively, in sorted path order).
    ///
    /// Any clip that fails to load or validate aborts construction: a
    /// corrupt noise set would otherwise bias every augmented file.
    pub fn load(
        dir: &Path,
        reader: &dyn AudioReader,
        sample_rate: u32,
    ) -> Result<Self, AugmentError> {
        let entries = directory_scanner::scan(dir, true)?;
        let mut clips = Vec::new();
        for entry in entries.iter().filter(|e| e.kind == EntryKind::Audio) {
            let clip = reader.read_audio(&entry.source_path(dir), sample_rate)?;
            clips.push(clip);
        }
        log::info!("Loaded {} noise clips from {}", clips.len(), dir.display());
        Self::new(clips).map_err(|_| {
            AugmentError::configuration(format!("no noise clips found in {}", dir.display()))
        })
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip(&self, index: usize) -> &AudioSegment {
        &self.clips[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_writer::AudioWriter;
    use crate::audio::infrastructure::wav_reader::WavReader;
    use crate::audio::infrastructure::wav_writer::WavWriter;

    #[test]
    fn test_empty_library_is_configuration_error() {
        assert!(matches!(
            NoiseLibrary::new(Vec::new()),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_clip_is_configuration_error() {
        let clips = vec![
            AudioSegment::new(vec![0.1; 10], 16000),
            AudioSegment::new(Vec::new(), 16000),
        ];
        assert!(matches!(
            NoiseLibrary::new(clips),
            Err(AugmentError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_finds_nested_wavs_only() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WavWriter::new();
        writer
            .write_audio(
                &dir.path().join("hum.wav"),
                &AudioSegment::new(vec![0.1; 100], 16000),
            )
            .unwrap();
        writer
            .write_audio(
                &dir.path().join("street/cars.wav"),
                &AudioSegment::new(vec![0.2; 50], 16000),
            )
            .unwrap();
        std::fs::write(dir.path().join("LICENSE.txt"), b"cc0").unwrap();

        let library = NoiseLibrary::load(dir.path(), &WavReader::new(), 16000).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.clip(0).len(), 100);
        assert_eq!(library.clip(1).len(), 50);
    }

    #[test]
    fn test_load_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = NoiseLibrary::load(dir.path(), &WavReader::new(), 16000);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_load_rejects_invalid_clip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.wav"), b"not audio").unwrap();
        let result = NoiseLibrary::load(dir.path(), &WavReader::new(), 16000);
        assert!(matches!(result, Err(AugmentError::Io(_))));
    }
}
