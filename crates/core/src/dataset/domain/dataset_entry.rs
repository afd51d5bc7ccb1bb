use std::path::{Path, PathBuf};

use crate::shared::constants::AUDIO_EXTENSIONS;

/// How the dataset augmentor treats a discovered filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Decoded, augmented and re-encoded.
    Audio,
    /// Copied unchanged.
    Other,
    /// Recreated in the target tree; never copied as a file.
    Directory,
}

impl EntryKind {
    /// Classify an entry from its path and whether it is a directory.
    ///
    /// Directories win over extensions, so a folder named `set.wav` is still
    /// a directory. Extension matching is case-insensitive.
    pub fn classify(path: &Path, is_dir: bool) -> Self {
        if is_dir {
            EntryKind::Directory
        } else if has_audio_extension(path) {
            EntryKind::Audio
        } else {
            EntryKind::Other
        }
    }
}

/// An entry under the source root, addressed relative to that root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetEntry {
    pub relative_path: PathBuf,
    pub kind: EntryKind,
}

impl DatasetEntry {
    pub fn new(relative_path: PathBuf, kind: EntryKind) -> Self {
        Self {
            relative_path,
            kind,
        }
    }

    pub fn source_path(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.relative_path)
    }

    pub fn target_path(&self, target_root: &Path) -> PathBuf {
        target_root.join(&self.relative_path)
    }
}

/// Entries split by kind, each list keeping scan order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PartitionedEntries {
    pub audio: Vec<DatasetEntry>,
    pub other: Vec<DatasetEntry>,
    pub directories: Vec<DatasetEntry>,
}

impl PartitionedEntries {
    pub fn from_entries(entries: Vec<DatasetEntry>) -> Self {
        let mut parts = Self::default();
        for entry in entries {
            match entry.kind {
                EntryKind::Audio => parts.audio.push(entry),
                EntryKind::Other => parts.other.push(entry),
                EntryKind::Directory => parts.directories.push(entry),
            }
        }
        parts
    }

    pub fn total(&self) -> usize {
        self.audio.len() + self.other.len() + self.directories.len()
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::wav("a/b.wav", false, EntryKind::Audio)]
    #[case::upper_wav("B.WAV", false, EntryKind::Audio)]
    #[case::text("notes.txt", false, EntryKind::Other)]
    #[case::no_extension("README", false, EntryKind::Other)]
    #[case::flac_is_other("clip.flac", false, EntryKind::Other)]
    #[case::directory("speaker1", true, EntryKind::Directory)]
    #[case::directory_named_wav("set.wav", true, EntryKind::Directory)]
    fn test_classify(#[case] path: &str, #[case] is_dir: bool, #[case] expected: EntryKind) {
        assert_eq!(EntryKind::classify(Path::new(path), is_dir), expected);
    }

    #[test]
    fn test_partition_keeps_order_and_counts() {
        let entries = vec![
            DatasetEntry::new("d".into(), EntryKind::Directory),
            DatasetEntry::new("d/1.wav".into(), EntryKind::Audio),
            DatasetEntry::new("d/info.txt".into(), EntryKind::Other),
            DatasetEntry::new("d/2.wav".into(), EntryKind::Audio),
        ];
        let parts = PartitionedEntries::from_entries(entries);
        assert_eq!(parts.total(), 4);
        assert_eq!(parts.directories.len(), 1);
        assert_eq!(parts.other.len(), 1);
        assert_eq!(
            parts
                .audio
                .iter()
                .map(|e| e.relative_path.clone())
                .collect::<Vec<_>>(),
            vec![PathBuf::from("d/1.wav"), PathBuf::from("d/2.wav")]
        );
    }

    #[test]
    fn test_source_and_target_paths_mirror() {
        let entry = DatasetEntry::new("spk/utt.wav".into(), EntryKind::Audio);
        assert_eq!(
            entry.source_path(Path::new("/data/in")),
            PathBuf::from("/data/in/spk/utt.wav")
        );
        assert_eq!(
            entry.target_path(Path::new("/data/out")),
            PathBuf::from("/data/out/spk/utt.wav")
        );
    }
}
