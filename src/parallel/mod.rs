//! Bounded parallel execution
//!
//! This module knows nothing about linting. It owns the worker threads, the
//! crossbeam channels between them and the choice between running work on the
//! calling thread or on a fixed-size pool:
//!
//! ```text
//! ┌──────────┐  bounded   ┌──────────────┐  bounded   ┌─────────────┐
//! │ producer │──channel──▶│ N workers    │──channel──▶│ collector   │
//! │ thread   │            │ (processor)  │            │ (caller's   │
//! └──────────┘            └──────────────┘            │  thread)    │
//!                                                     └─────────────┘
//! ```
//!
//! At most `WorkerCount` items are processed at once. The collector sees
//! results in completion order and the call returns only after every worker
//! has exited.
//!
//! # Example
//!
//! ```rust
//! use lintgate::parallel::{ExecutionStrategy, WorkerCount};
//!
//! let workers = WorkerCount::new(4).unwrap();
//! let strategy = ExecutionStrategy::for_workload(3, workers);
//! let mut doubled = strategy.execute(vec![1, 2, 3], |x, _worker_id| x * 2, |_| {}).unwrap();
//! doubled.sort();
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```

pub mod core;

pub use self::core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor, WorkerCount};
