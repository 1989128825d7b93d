//! External extraction jobs
//!
//! This module contains the job handle interface, the process based
//! implementation running the extractor executable, and the runner driving
//! one extraction at a time on a handle.

pub mod job_traits;
pub mod process_job;
pub mod runner;
pub mod status;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use job_traits::{ExtractionJob, JobLauncher, JobRequest};
pub use process_job::{ProcessJob, ProcessLauncher, DEFAULT_EXTRACTOR};
pub use runner::{sanitize_error_text, JobCompletion, JobPhase, JobRunner, RunMode};
pub use status::{JobStatus, ObserverList, ObserverTag, StatusEvent};
