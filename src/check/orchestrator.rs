use super::observer::{NullObserver, ProgressObserver};
use super::{CheckReport, CheckResult, CheckTarget, Invoker, TargetSet};
use crate::error::CheckError;
use crate::parallel::{ExecutionStrategy, WorkerCount};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fans targets out over a bounded worker pool and gathers one result each
pub struct Orchestrator<I> {
    invoker: I,
    observer: Arc<dyn ProgressObserver>,
}

impl<I: Invoker> Orchestrator<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            observer: Arc::new(NullObserver),
        }
    }

    /// Observer that receives each result when running interactively
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Check every target, with at most `workers` invocations in flight.
    ///
    /// Returns only after every target has exactly one result. Faults in a
    /// single invocation are recorded as findings for that target and never
    /// abort the run.
    pub fn run(
        &self,
        targets: &TargetSet,
        workers: WorkerCount,
        interactive: bool,
    ) -> Result<CheckReport, CheckError> {
        let start_time = Instant::now();
        let strategy = ExecutionStrategy::for_workload(targets.len(), workers);
        debug!(
            "checking {} files with {:?}",
            targets.len(),
            strategy
        );

        let invoker = &self.invoker;
        let results = strategy.execute(
            targets.to_vec(),
            |target, worker_id| Self::check_one(invoker, target, worker_id),
            |result| {
                if interactive {
                    self.observer.on_result(result);
                }
            },
        )?;

        let report = Self::assemble(targets, results)?;

        info!(
            "checked {} files in {:.2}s ({} with findings)",
            report.len(),
            start_time.elapsed().as_secs_f64(),
            report.failures().count()
        );

        Ok(report)
    }

    fn check_one(invoker: &I, target: &CheckTarget, worker_id: usize) -> CheckResult {
        debug!("worker {} checking {}", worker_id, target);

        match panic::catch_unwind(AssertUnwindSafe(|| invoker.invoke(target))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("{}", e);
                CheckResult::fault(target.clone(), e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("checker panicked on {}: {}", target, message);
                CheckResult::fault(target.clone(), format!("checker panicked: {message}"))
            }
        }
    }

    /// Key the results by target and make sure none were lost or invented
    fn assemble(targets: &TargetSet, results: Vec<CheckResult>) -> Result<CheckReport, CheckError> {
        let mut report = CheckReport::new();

        for result in results {
            if !targets.contains(result.target()) {
                return Err(CheckError::WorkerPool(format!(
                    "received a result for unrequested file {}",
                    result.target()
                )));
            }
            if let Err(duplicate) = report.insert(result) {
                return Err(CheckError::WorkerPool(format!(
                    "received two results for {}",
                    duplicate.target()
                )));
            }
        }

        if let Some(missing) = targets.iter().find(|target| !report.contains(target)) {
            return Err(CheckError::WorkerPool(format!("no result for {missing}")));
        }

        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
