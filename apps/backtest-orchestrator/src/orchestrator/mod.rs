//! Concurrent Backtest Orchestration
//!
//! Turns a claimed task into per-symbol worker processes and folds their
//! exits back into task state.
//!
//! # Layers
//!
//! - [`process`]: one OS process per job, own process group, output pumped
//!   to the log sink, SIGTERM-then-SIGKILL teardown
//! - [`pool`]: bounded FIFO dispatch over a semaphore, cancellable, with a
//!   registry of live process handles
//! - [`runner`]: one task end to end (claim, resolve universe, dispatch,
//!   aggregate)
//! - [`scheduler`]: polling loop that spawns a detached runner per pending
//!   task
//!
//! Concurrency is bounded per task; each runner gets a fresh pool and
//! registers it in the [`pool::PoolRegistry`] so the cancel path can reach
//! in-flight workers.

pub mod config;
pub mod error;
pub mod job;
pub mod pool;
pub mod process;
pub mod runner;
pub mod scheduler;

pub use config::{OrchestratorConfig, WorkerCommand};
pub use error::OrchestratorError;
pub use job::{CommandSpec, Job};
pub use pool::{DispatchHooks, NoHooks, PoolRegistry, PoolRunReport, WorkerPool};
pub use process::{JobExit, ProcessError, ProcessHandle, ProcessRunner, SpawnedJob};
pub use runner::TaskRunner;
pub use scheduler::TaskScheduler;
