//! Progress observers
//!
//! The orchestrator reports each finished result to a [`ProgressObserver`]
//! when it runs interactively. Observers are passed in explicitly; nothing
//! here touches global state.

use super::CheckResult;
use std::sync::Mutex;

/// Receives results in completion order, on the orchestrator's thread
pub trait ProgressObserver {
    fn on_result(&self, result: &CheckResult);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_result(&self, _result: &CheckResult) {}
}

/// Keeps every observed result, in the order seen
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<CheckResult>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<CheckResult> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_result(&self, result: &CheckResult) {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.push(result.clone());
    }
}
