use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::dataset::domain::dataset_entry::{DatasetEntry, EntryKind, PartitionedEntries};
use crate::dataset::infrastructure::directory_scanner;
use crate::shared::constants::SAMPLE_RATE;
use crate::shared::error::{AudioIoError, AugmentError};
use crate::shared::seed::file_rng;

use super::augmentation_pipeline::AugmentationPipeline;
use super::dataset_executor::{FileOutcome, StageTiming};
use super::infrastructure::executor_factory::create_executor;
use super::pipeline_logger::PipelineLogger;

/// How a dataset run walks and seeds the source tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatasetOptions {
    pub recursive: bool,
    /// Worker threads; 1 processes files sequentially.
    pub jobs: usize,
    /// Base seed; each file's RNG is derived from it and the relative path.
    pub seed: u64,
}

/// A source file that has no counterpart in the target tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Counts of what a run did, plus every skipped file and why.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AugmentReport {
    pub augmented: usize,
    pub copied: usize,
    pub directories: usize,
    pub skipped: Vec<SkippedFile>,
}

impl AugmentReport {
    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Load -> augment -> write for one audio file, or a plain copy otherwise.
struct FileAugmentor {
    reader: Box<dyn AudioReader>,
    writer: Box<dyn AudioWriter>,
    pipeline: AugmentationPipeline,
    sample_rate: u32,
}

impl FileAugmentor {
    fn process(
        &self,
        entry: &DatasetEntry,
        source: &Path,
        target: &Path,
        seed: u64,
    ) -> Result<FileOutcome, AugmentError> {
        match entry.kind {
            EntryKind::Audio => self.augment(entry, source, target, seed),
            EntryKind::Other => Ok(copy_file(entry, source, target)),
            EntryKind::Directory => Ok(FileOutcome::Skipped {
                reason: "directories are mirrored, not processed".to_string(),
            }),
        }
    }

    fn augment(
        &self,
        entry: &DatasetEntry,
        source: &Path,
        target: &Path,
        seed: u64,
    ) -> Result<FileOutcome, AugmentError> {
        let mut timings: Vec<StageTiming> = Vec::with_capacity(3);

        let start = Instant::now();
        let loaded = self
            .reader
            .read_audio(&entry.source_path(source), self.sample_rate)
            .map_err(AugmentError::from);
        let mut audio = match loaded {
            Ok(audio) => audio,
            Err(e) if e.is_per_file() => {
                return Ok(FileOutcome::Skipped {
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        timings.push(("load", elapsed_ms(start)));

        let start = Instant::now();
        let mut rng = file_rng(seed, &entry.relative_path);
        self.pipeline.apply(&mut audio, &mut rng)?;
        timings.push(("augment", elapsed_ms(start)));

        let start = Instant::now();
        self.writer
            .write_audio(&entry.target_path(target), &audio)?;
        timings.push(("write", elapsed_ms(start)));

        if audio.peak() > 1.0 {
            log::debug!(
                "{} peaks at {:.2}; clipped on encode",
                entry.relative_path.display(),
                audio.peak()
            );
        }
        log::debug!(
            "Augmented {} ({:.2}s out)",
            entry.relative_path.display(),
            audio.duration()
        );
        Ok(FileOutcome::Augmented {
            timings,
            output_seconds: audio.duration(),
        })
    }
}

fn copy_file(entry: &DatasetEntry, source: &Path, target: &Path) -> FileOutcome {
    let start = Instant::now();
    let destination = entry.target_path(target);
    let copied = destination
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::copy(entry.source_path(source), &destination));
    match copied {
        Ok(_) => FileOutcome::Copied {
            timings: vec![("copy", elapsed_ms(start))],
        },
        Err(e) => FileOutcome::Skipped {
            reason: format!("copy failed: {e}"),
        },
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Mirrors a source tree into a target tree, augmenting every audio file
/// and copying everything else unchanged.
///
/// Unreadable or invalid audio and failed copies are skipped and reported.
/// Transformer failures and write failures abort the run.
pub struct AugmentDatasetUseCase {
    files: FileAugmentor,
    logger: Box<dyn PipelineLogger>,
}

impl AugmentDatasetUseCase {
    pub fn new(
        reader: Box<dyn AudioReader>,
        writer: Box<dyn AudioWriter>,
        pipeline: AugmentationPipeline,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            files: FileAugmentor {
                reader,
                writer,
                pipeline,
                sample_rate: SAMPLE_RATE,
            },
            logger,
        }
    }

    pub fn run(
        &mut self,
        source: &Path,
        target: &Path,
        options: &DatasetOptions,
    ) -> Result<AugmentReport, AugmentError> {
        validate_roots(source, target)?;

        let entries = directory_scanner::scan(source, options.recursive)?;
        let parts = PartitionedEntries::from_entries(entries);
        self.logger.info(&format!(
            "Found {} audio files, {} other files, {} directories in {}",
            parts.audio.len(),
            parts.other.len(),
            parts.directories.len(),
            source.display()
        ));
        if !self.files.pipeline.is_empty() {
            self.logger.info(&format!(
                "Pipeline: {} (seed {})",
                self.files.pipeline.names().join(" -> "),
                options.seed
            ));
        }

        let mut report = AugmentReport::default();
        create_dir(target)?;
        for dir in &parts.directories {
            create_dir(&dir.target_path(target))?;
            report.directories += 1;
        }

        let work: Vec<DatasetEntry> = parts.audio.into_iter().chain(parts.other).collect();
        let total = work.len();
        let mut done = 0;

        let files = &self.files;
        let logger = &mut self.logger;
        let process = |entry: &DatasetEntry| files.process(entry, source, target, options.seed);
        let mut on_outcome = |entry: &DatasetEntry, outcome: FileOutcome| {
            done += 1;
            match outcome {
                FileOutcome::Augmented {
                    timings,
                    output_seconds,
                } => {
                    report.augmented += 1;
                    record_timings(&mut **logger, &timings);
                    logger.metric("output_seconds", output_seconds);
                }
                FileOutcome::Copied { timings } => {
                    report.copied += 1;
                    record_timings(&mut **logger, &timings);
                }
                FileOutcome::Skipped { reason } => {
                    logger.warn(&format!(
                        "Skipping {}: {reason}",
                        entry.relative_path.display()
                    ));
                    report.skipped.push(SkippedFile {
                        path: entry.relative_path.clone(),
                        reason,
                    });
                }
            }
            logger.progress(done, total);
        };

        create_executor(options.jobs).execute(&work, &process, &mut on_outcome)?;

        report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        self.logger.summary();
        Ok(report)
    }
}

fn record_timings(logger: &mut dyn PipelineLogger, timings: &[StageTiming]) {
    for (stage, ms) in timings {
        logger.timing(stage, *ms);
    }
}

fn create_dir(path: &Path) -> Result<(), AugmentError> {
    fs::create_dir_all(path).map_err(|source| {
        AudioIoError::Fs {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

fn validate_roots(source: &Path, target: &Path) -> Result<(), AugmentError> {
    if !source.is_dir() {
        return Err(AugmentError::configuration(format!(
            "source {} is not a directory",
            source.display()
        )));
    }
    if let (Ok(s), Ok(t)) = (source.canonicalize(), target.canonicalize()) {
        if s == t {
            return Err(AugmentError::configuration(
                "source and target directories must differ",
            ));
        }
    }
    Ok(())
}
