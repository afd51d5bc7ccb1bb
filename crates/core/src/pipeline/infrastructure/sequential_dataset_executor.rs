use crate::dataset::domain::dataset_entry::DatasetEntry;
use crate::pipeline::dataset_executor::{DatasetExecutor, FileProcessor, OutcomeSink};
use crate::shared::error::AugmentError;

/// Processes one file completely before starting the next.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialDatasetExecutor;

impl DatasetExecutor for SequentialDatasetExecutor {
    fn execute(
        &self,
        entries: &[DatasetEntry],
        process: &FileProcessor<'_>,
        on_outcome: &mut OutcomeSink<'_>,
    ) -> Result<(), AugmentError> {
        for entry in entries {
            let outcome = process(entry)?;
            on_outcome(entry, outcome);
        }
        Ok(())
    }
}
