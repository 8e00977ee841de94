//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod refresh;
mod worker;

pub use bridge::{Batch, Job, RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use refresh::{log_tick_error, RefreshLoop, RefreshSchedule, Tick};
pub use worker::{run_async_worker, run_batch, BatchOutcome};
