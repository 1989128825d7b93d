//! Job status and status observers
//!
//! Jobs report every status change to their observers through a channel. The
//! receiving side decides when to look at the messages, so nothing runs on
//! the job's behalf outside the host's own loop.

use std::fmt;
use std::sync::mpsc::Sender;

/// Status of an external extraction job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// No job started yet on this handle
    Idle,
    /// Job submitted, not yet running
    Scheduled,
    /// Job running
    Running,
    /// Job finished without errors
    Completed,
    /// Job finished and reported an error
    CompletedWithErrors,
    /// Job stopped before finishing
    Cancelled,
}

impl JobStatus {
    /// Whether the job still occupies the handle
    pub fn is_busy(&self) -> bool {
        matches!(self, JobStatus::Scheduled | JobStatus::Running)
    }

    /// Whether the job reached an end state
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::CompletedWithErrors | JobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "Idle",
            JobStatus::Scheduled => "Scheduled",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::CompletedWithErrors => "Completed with errors",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message sent to observers when a job's status changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    pub status: JobStatus,
}

/// Handle returned when an observer is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverTag(pub u64);

/// Registry of status observers for job implementations
#[derive(Debug, Default)]
pub struct ObserverList {
    next_tag: u64,
    observers: Vec<(ObserverTag, Sender<StatusEvent>)>,
}

impl ObserverList {
    pub fn new() -> Self {
        ObserverList::default()
    }

    /// Register an observer and return its tag
    pub fn add(&mut self, observer: Sender<StatusEvent>) -> ObserverTag {
        self.next_tag += 1;
        let tag = ObserverTag(self.next_tag);
        self.observers.push((tag, observer));
        tag
    }

    /// Remove an observer, returning whether it was registered
    pub fn remove(&mut self, tag: ObserverTag) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != tag);
        self.observers.len() != before
    }

    /// Send a status change to every observer
    ///
    /// Observers whose receiving end is gone are dropped.
    pub fn notify(&mut self, status: JobStatus) {
        self.observers
            .retain(|(_, sender)| sender.send(StatusEvent { status }).is_ok());
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
