//! Batch orchestration
//!
//! This module ties the region enumerator, the job runner and the result
//! accumulator together and owns the cleanup of a batch.

mod controller;

pub use controller::{BatchController, BatchInputs, BatchSummary, CompletionCallback};
