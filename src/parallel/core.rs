use crate::error::CheckError;
use crossbeam::channel::{Receiver, Sender, bounded};
use std::num::NonZeroUsize;

/// Upper bound on simultaneously running work items, always at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    pub const DEFAULT: usize = 10;

    pub fn new(workers: usize) -> Result<Self, CheckError> {
        NonZeroUsize::new(workers)
            .map(Self)
            .ok_or(CheckError::InvalidWorkerCount(workers))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(NonZeroUsize::new(Self::DEFAULT).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = CheckError;

    fn try_from(workers: usize) -> Result<Self, Self::Error> {
        Self::new(workers)
    }
}

/// Fixed-size pool of worker threads fed through a bounded channel
pub struct ParallelExecutor {
    max_workers: usize,
}

/// Per-thread state handed to each worker
struct WorkerContext<'a, T, R, F> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<R>,
    processor: &'a F,
}

impl ParallelExecutor {
    pub fn new(workers: WorkerCount) -> Self {
        Self {
            max_workers: workers.get(),
        }
    }

    /// Run `processor` over every item using a producer-consumer pattern.
    ///
    /// `on_complete` runs on the calling thread for each result as soon as it
    /// arrives, so results are observed in completion order. Returns once all
    /// workers have finished.
    pub fn execute<T, R, F, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        mut on_complete: C,
    ) -> Result<Vec<R>, CheckError>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        C: FnMut(&R),
    {
        if work_items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = work_items.len();
        let actual_workers = std::cmp::min(self.max_workers, total_items);
        // Sized from the threads that start, not the requested limit
        let buffer_size = actual_workers.saturating_mul(2);
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(buffer_size);
        let (result_tx, result_rx): (Sender<R>, Receiver<R>) = bounded(buffer_size);
        let processor = &processor;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    processor,
                };

                s.spawn(move |_| Self::worker_thread(ctx));
            }

            // Producer thread: send work to workers
            s.spawn(move |_| {
                for work_item in work_items {
                    if work_tx.send(work_item).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop the scope's handles so the result channel closes when the last worker exits
            drop(work_rx);
            drop(result_tx);

            Self::collect_results(result_rx, total_items, &mut on_complete)
        })
        .map_err(|_| CheckError::WorkerPool("worker thread panicked".to_string()))
    }

    fn worker_thread<T, R, F>(ctx: WorkerContext<'_, T, R, F>)
    where
        F: Fn(&T, usize) -> R,
    {
        tracing::trace!("worker {} started", ctx.worker_id);
        while let Ok(work_item) = ctx.work_rx.recv() {
            let result = (ctx.processor)(&work_item, ctx.worker_id);

            if ctx.result_tx.send(result).is_err() {
                break; // Collector dropped
            }
        }
        tracing::trace!("worker {} finished", ctx.worker_id);
    }

    fn collect_results<R, C>(result_rx: Receiver<R>, total_items: usize, on_complete: &mut C) -> Vec<R>
    where
        C: FnMut(&R),
    {
        let mut results = Vec::with_capacity(total_items);

        // Drain until every worker has hung up
        while let Ok(result) = result_rx.recv() {
            on_complete(&result);
            results.push(result);
        }

        results
    }
}

/// Runs every item on the calling thread, in submission order
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F, C>(work_items: Vec<T>, processor: F, mut on_complete: C) -> Vec<R>
    where
        F: Fn(&T, usize) -> R,
        C: FnMut(&R),
    {
        let mut results = Vec::with_capacity(work_items.len());

        for work_item in &work_items {
            let result = processor(work_item, 0);
            on_complete(&result);
            results.push(result);
        }

        results
    }
}

/// Execution strategy for choosing between parallel and sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: WorkerCount },
}

impl ExecutionStrategy {
    /// A single worker or a single item gains nothing from extra threads
    pub fn for_workload(work_items_count: usize, workers: WorkerCount) -> Self {
        if workers.get() == 1 || work_items_count <= 1 {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel { workers }
        }
    }

    pub fn execute<T, R, F, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        on_complete: C,
    ) -> Result<Vec<R>, CheckError>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        C: FnMut(&R),
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(
                work_items,
                processor,
                on_complete,
            )),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(work_items, processor, on_complete)
            }
        }
    }
}
