use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::dataset::domain::dataset_entry::{DatasetEntry, EntryKind};
use crate::shared::error::AudioIoError;

/// Lists the entries under `root`, relative to `root`, sorted by name.
///
/// In recursive mode directories are reported before their contents. In
/// flat mode only the top level files are reported; subdirectories and
/// everything below them are ignored. Symlinks are followed; a link back to
/// one of its own ancestors is skipped with a warning, as are broken links
/// and entries that are neither files nor directories.
pub fn scan(root: &Path, recursive: bool) -> Result<Vec<DatasetEntry>, AudioIoError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                skip_or_fail(root, e)?;
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if recursive {
                entries.push(DatasetEntry::new(
                    relative.to_path_buf(),
                    EntryKind::Directory,
                ));
            }
        } else if file_type.is_file() {
            let kind = EntryKind::classify(relative, false);
            entries.push(DatasetEntry::new(relative.to_path_buf(), kind));
        } else {
            log::warn!("Skipping special file {}", entry.path().display());
        }
    }
    Ok(entries)
}

/// Symlink loops and dangling links below the root are skipped; anything
/// else (missing root, unreadable directory) fails the scan.
fn skip_or_fail(root: &Path, error: walkdir::Error) -> Result<(), AudioIoError> {
    let path = error.path().unwrap_or(root).to_path_buf();
    if let Some(ancestor) = error.loop_ancestor() {
        log::warn!(
            "Skipping symlink loop {} -> {}",
            path.display(),
            ancestor.display()
        );
        return Ok(());
    }
    let dangling = error.depth() > 0
        && error
            .io_error()
            .is_some_and(|e| e.kind() == ErrorKind::NotFound);
    if dangling {
        log::warn!("Skipping unreadable entry {}: {error}", path.display());
        return Ok(());
    }
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
    Err(AudioIoError::Fs { path, source })
}
