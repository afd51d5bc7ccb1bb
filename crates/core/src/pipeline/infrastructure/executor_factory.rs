use crate::pipeline::dataset_executor::DatasetExecutor;

use super::sequential_dataset_executor::SequentialDatasetExecutor;
use super::threaded_dataset_executor::ThreadedDatasetExecutor;

/// Sequential for a single job, a worker pool otherwise.
pub fn create_executor(jobs: usize) -> Box<dyn DatasetExecutor> {
    if jobs > 1 {
        log::info!("Processing files on {jobs} worker threads");
        Box::new(ThreadedDatasetExecutor::new(jobs))
    } else {
        log::info!("Processing files sequentially");
        Box::new(SequentialDatasetExecutor)
    }
}
