use crate::dataset::domain::dataset_entry::DatasetEntry;
use crate::shared::error::AugmentError;

/// Wall-clock time spent in one stage for one file.
pub type StageTiming = (&'static str, f64);

/// What happened to a single file.
#[derive(Clone, Debug, PartialEq)]
pub enum FileOutcome {
    Augmented {
        timings: Vec<StageTiming>,
        output_seconds: f64,
    },
    Copied {
        timings: Vec<StageTiming>,
    },
    /// The file was left out of the target tree; the run continues.
    Skipped { reason: String },
}

/// Per-file work. `Err` is fatal for the whole run.
pub type FileProcessor<'a> = dyn Fn(&DatasetEntry) -> Result<FileOutcome, AugmentError> + Sync + 'a;

/// Receives outcomes on the calling thread, in completion order.
pub type OutcomeSink<'a> = dyn FnMut(&DatasetEntry, FileOutcome) + 'a;

/// Abstracts how the per-file work of a dataset run is scheduled.
///
/// Implementations call `process` once per entry (until a fatal error) and
/// hand every successful outcome to `on_outcome`. After a fatal error no new
/// entries are started and the first error is returned.
pub trait DatasetExecutor: Send + Sync {
    fn execute(
        &self,
        entries: &[DatasetEntry],
        process: &FileProcessor<'_>,
        on_outcome: &mut OutcomeSink<'_>,
    ) -> Result<(), AugmentError>;
}
