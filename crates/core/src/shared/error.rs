use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or applying augmentation transformers.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// Invalid static parameters. Raised at construction so a run fails fast.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Geometry sampling kept failing after its bounded retries.
    #[error("geometry error: {0}")]
    Geometry(String),
    #[error(transparent)]
    Io(#[from] AudioIoError),
}

impl AugmentError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }

    /// Loader failures only affect the file being processed.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Io(e) if e.is_read_error())
    }
}

/// Failures decoding, validating or encoding WAV files.
#[derive(Error, Debug)]
pub enum AudioIoError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("unsupported sample format in {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },
    #[error("{path}: sample rate must be {expected} Hz, found {found} Hz")]
    SampleRate {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
    #[error("{path}: audio must be mono, found {found} channels")]
    Channels { path: PathBuf, found: u16 },
    #[error("{path}: audio file is empty")]
    Empty { path: PathBuf },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("filesystem error at {path}: {source}")]
    Fs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AudioIoError {
    /// True for failures on the input side (open, decode, validation).
    pub fn is_read_error(&self) -> bool {
        !matches!(self, Self::Write { .. } | Self::Fs { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message() {
        let err = AugmentError::configuration("tempo ratio must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: tempo ratio must be positive"
        );
    }

    #[test]
    fn test_read_errors_are_per_file() {
        let err: AugmentError = AudioIoError::Empty {
            path: PathBuf::from("a.wav"),
        }
        .into();
        assert!(err.is_per_file());
        assert_eq!(err.to_string(), "a.wav: audio file is empty");
    }

    #[test]
    fn test_write_and_geometry_errors_are_fatal() {
        let write: AugmentError = AudioIoError::Fs {
            path: PathBuf::from("out"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        }
        .into();
        assert!(!write.is_per_file());
        assert!(!AugmentError::geometry("no point").is_per_file());
    }
}
