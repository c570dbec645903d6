//! Worker pool for parallel vanity search.
//!
//! This module provides:
//! - CPU workers, each with its own RNG and key-derivation context
//! - A pool that owns the shared stop flag, counters and result channel
//! - Fixed-window throughput reporting

mod cpu;
mod pool;
mod throughput;

pub use cpu::{CpuWorker, WorkerStats};
pub use pool::{SearchBudget, SearchOutcome, StopReason, VanityResult, WorkerPool};
pub use throughput::Throughput;
