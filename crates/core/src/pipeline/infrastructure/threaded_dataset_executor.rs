use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};

use crate::dataset::domain::dataset_entry::DatasetEntry;
use crate::pipeline::dataset_executor::{
    DatasetExecutor, FileOutcome, FileProcessor, OutcomeSink,
};
use crate::shared::error::AugmentError;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

type WorkerResult = (usize, Result<FileOutcome, AugmentError>);

/// Runs per-file work on a pool of scoped worker threads.
///
/// Layout: `feeder -> [workers] -> coordinator`
///
/// Work indices flow through a bounded channel; results come back to the
/// calling thread, which alone touches the outcome sink. A fatal error raises
/// the cancellation flag so the feeder and workers stop picking up files.
pub struct ThreadedDatasetExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedDatasetExecutor {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY.max(workers * 2),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl DatasetExecutor for ThreadedDatasetExecutor {
    fn execute(
        &self,
        entries: &[DatasetEntry],
        process: &FileProcessor<'_>,
        on_outcome: &mut OutcomeSink<'_>,
    ) -> Result<(), AugmentError> {
        let cancelled = AtomicBool::new(false);
        let (work_tx, work_rx) = crossbeam_channel::bounded::<usize>(self.channel_capacity);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<WorkerResult>(self.channel_capacity);

        std::thread::scope(|scope| {
            let cancelled = &cancelled;
            scope.spawn(move || feed(entries.len(), work_tx, cancelled));
            for _ in 0..self.workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || work(entries, process, work_rx, result_tx, cancelled));
            }
            drop(work_rx);
            drop(result_tx);

            collect(entries, result_rx, on_outcome, cancelled)
        })
    }
}

fn feed(count: usize, work_tx: Sender<usize>, cancelled: &AtomicBool) {
    for index in 0..count {
        if cancelled.load(Ordering::Relaxed) || work_tx.send(index).is_err() {
            break;
        }
    }
}

fn work(
    entries: &[DatasetEntry],
    process: &FileProcessor<'_>,
    work_rx: Receiver<usize>,
    result_tx: Sender<WorkerResult>,
    cancelled: &AtomicBool,
) {
    for index in work_rx {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }
        let result = process(&entries[index]);
        if result_tx.send((index, result)).is_err() {
            break;
        }
    }
}

/// Drains results until every worker is done and returns the first fatal
/// error, if any.
fn collect(
    entries: &[DatasetEntry],
    result_rx: Receiver<WorkerResult>,
    on_outcome: &mut OutcomeSink<'_>,
    cancelled: &AtomicBool,
) -> Result<(), AugmentError> {
    let mut first_error = None;
    for (index, result) in result_rx {
        match result {
            Ok(outcome) => on_outcome(&entries[index], outcome),
            Err(e) => {
                cancelled.store(true, Ordering::Relaxed);
                if first_error.is_none() {
                    log::debug!(
                        "Cancelling run after fatal error on {}",
                        entries[index].relative_path.display()
                    );
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
