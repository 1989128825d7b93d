//! Extraction job runner
//!
//! Drives one extraction at a time on a job handle, either blocking until it
//! finishes or advancing on status messages. The runner is a small state
//! machine:
//!
//! `Idle -> Submitted -> Running -> (Completed | Failed) -> Idle`

use std::sync::mpsc::{channel, Receiver, TryRecvError};

use crate::errors::RadiomicsResult;
use crate::job::job_traits::{ExtractionJob, JobRequest};
use crate::job::status::{JobStatus, ObserverTag, StatusEvent};
use crate::utils::logger::Logger;
use crate::utils::string_utils::strip_prefix_once;

/// Boilerplate the host puts in front of the extractor's error output
pub const ERROR_TEXT_PREFIX: &str = "RadiomicsCLI standard error:\n\n";

/// How extractions are waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Block in `submit` until the extraction finished
    Synchronous,
    /// Return from `submit` immediately and advance on status messages
    Asynchronous,
}

/// Phase of the extraction attached to the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Nothing in flight
    Idle,
    /// Started, running not yet observed
    Submitted,
    /// Observed running
    Running,
}

/// Outcome of one finished extraction
#[derive(Debug, Clone, PartialEq)]
pub struct JobCompletion {
    pub status: JobStatus,
    /// Extractor standard output
    pub output_text: String,
    /// Extractor error output without host boilerplate
    pub error_text: String,
}

impl JobCompletion {
    /// Whether the extraction finished without errors
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Strip the host boilerplate from extractor error output
pub fn sanitize_error_text(text: &str) -> String {
    strip_prefix_once(text, ERROR_TEXT_PREFIX).trim().to_string()
}

/// Runs extractions one by one on a single job handle
pub struct JobRunner<'a> {
    job: Box<dyn ExtractionJob + 'a>,
    mode: RunMode,
    phase: JobPhase,
    observer: Option<ObserverTag>,
    events: Option<Receiver<StatusEvent>>,
    logger: &'a Logger,
}

impl<'a> JobRunner<'a> {
    /// Create a runner owning a job handle
    ///
    /// # Arguments
    /// * `job` - Handle the extractions run on
    /// * `mode` - Blocking or message driven
    /// * `logger` - Logger for job progress and errors
    pub fn new(job: Box<dyn ExtractionJob + 'a>, mode: RunMode, logger: &'a Logger) -> Self {
        JobRunner {
            job,
            mode,
            phase: JobPhase::Idle,
            observer: None,
            events: None,
            logger,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Tag of the status observer, set once the first asynchronous job started
    pub fn observer_tag(&self) -> Option<ObserverTag> {
        self.observer
    }

    /// Whether an extraction is in flight
    pub fn is_in_flight(&self) -> bool {
        self.phase != JobPhase::Idle
    }

    /// Start an extraction
    ///
    /// In synchronous mode this blocks and returns the completion. In
    /// asynchronous mode the status observer is registered on the first
    /// call and `None` is returned; the completion comes out of [`poll`].
    ///
    /// [`poll`]: JobRunner::poll
    ///
    /// # Arguments
    /// * `request` - Extraction to start
    ///
    /// # Returns
    /// The completion in synchronous mode, or an error if the extraction
    /// could not be started
    pub fn submit(&mut self, request: &JobRequest) -> RadiomicsResult<Option<JobCompletion>> {
        if self.mode == RunMode::Asynchronous && self.observer.is_none() {
            self.logger.debug("Adding status observer");
            let (sender, receiver) = channel();
            self.observer = Some(self.job.add_observer(sender));
            self.events = Some(receiver);
        }

        self.job.start(request)?;
        self.phase = JobPhase::Submitted;

        match self.mode {
            RunMode::Synchronous => {
                let status = match self.job.wait() {
                    Ok(status) => status,
                    Err(e) => {
                        self.phase = JobPhase::Idle;
                        return Err(e);
                    }
                };
                Ok(Some(self.complete(status)))
            }
            RunMode::Asynchronous => Ok(None),
        }
    }

    /// Let the job publish status changes and process pending messages
    ///
    /// # Returns
    /// The completion of the in-flight extraction once it finished
    pub fn poll(&mut self) -> Option<JobCompletion> {
        if self.phase == JobPhase::Idle {
            return None;
        }

        self.job.refresh();

        loop {
            let event = match self.events.as_ref() {
                Some(events) => match events.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
                },
                None => return None,
            };

            if let Some(completion) = self.handle_status(event) {
                return Some(completion);
            }
        }
    }

    /// Advance the state machine with one status message
    ///
    /// A job counts as running from the observed `Running` status until the
    /// first status that is not busy. A job ending before it was seen
    /// running is completed as well.
    pub fn handle_status(&mut self, event: StatusEvent) -> Option<JobCompletion> {
        match (self.phase, event.status) {
            (JobPhase::Idle, _) => None,
            (JobPhase::Submitted, JobStatus::Running) => {
                self.logger.debug("Extraction running");
                self.phase = JobPhase::Running;
                None
            }
            (_, status) if status.is_finished() => Some(self.complete(status)),
            _ => None,
        }
    }

    fn complete(&mut self, status: JobStatus) -> JobCompletion {
        self.phase = JobPhase::Idle;

        // The extractor also logs progress to its error output on success
        let error_text = sanitize_error_text(self.job.error_text());
        if !error_text.is_empty() {
            if status == JobStatus::Completed {
                self.logger.debug(&error_text);
            } else {
                self.logger.error(&error_text);
            }
        }
        self.logger.info(&format!("Extraction finished: {}", status));

        JobCompletion {
            status,
            output_text: self.job.output_text().to_string(),
            error_text,
        }
    }

    /// Remove the status observer and give up the job handle
    ///
    /// # Returns
    /// Whether an observer was removed
    pub fn release(mut self) -> bool {
        let removed = match self.observer.take() {
            Some(tag) => {
                self.logger.debug("Removing status observer");
                self.job.remove_observer(tag)
            }
            None => false,
        };
        self.events = None;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::job::testing::{JobLog, ScriptedJob, ScriptedOutcome};

    fn request(id: &str) -> JobRequest {
        JobRequest {
            region_id: id.to_string(),
            image: PathBuf::from("ct.nii.gz"),
            mask: PathBuf::from("mask.nii.gz"),
            label: 1,
            parameter_file: PathBuf::from("params.json"),
        }
    }

    fn job(outcome: ScriptedOutcome) -> (Box<dyn ExtractionJob>, JobLog) {
        let log = JobLog::default();
        let job = ScriptedJob::new(std::rc::Rc::new(move |_: &JobRequest| outcome.clone()), log.clone());
        (Box::new(job), log)
    }

    #[test]
    fn test_sanitize_strips_boilerplate() {
        assert_eq!(sanitize_error_text("RadiomicsCLI standard error:\n\nValueError: bad mask\n"),
                   "ValueError: bad mask");
        assert_eq!(sanitize_error_text("plain"), "plain");
    }

    #[test]
    fn test_synchronous_submit_returns_completion() {
        let logger = Logger::capturing();
        let (job, log) = job(ScriptedOutcome::completed("Image,Mask\nct,mask\n"));
        let mut runner = JobRunner::new(job, RunMode::Synchronous, &logger);

        let completion = runner.submit(&request("r1")).unwrap().unwrap();
        assert!(completion.is_success());
        assert_eq!(runner.phase(), JobPhase::Idle);
        assert!(runner.observer_tag().is_none());
        assert_eq!(log.observers_added(), 0);
    }

    #[test]
    fn test_asynchronous_job_walks_through_phases() {
        let logger = Logger::capturing();
        let (job, log) = job(ScriptedOutcome::completed("Image,Mask\nct,mask\n"));
        let mut runner = JobRunner::new(job, RunMode::Asynchronous, &logger);

        assert!(runner.submit(&request("r1")).unwrap().is_none());
        assert_eq!(runner.phase(), JobPhase::Submitted);
        assert_eq!(log.observers_added(), 1);

        // Scheduled and Running are published by the first refresh
        assert!(runner.poll().is_none());
        assert_eq!(runner.phase(), JobPhase::Running);

        let completion = runner.poll().unwrap();
        assert!(completion.is_success());
        assert_eq!(runner.phase(), JobPhase::Idle);
    }

    #[test]
    fn test_observer_added_once_for_many_jobs() {
        let logger = Logger::capturing();
        let (job, log) = job(ScriptedOutcome::completed(""));
        let mut runner = JobRunner::new(job, RunMode::Asynchronous, &logger);

        for id in ["r1", "r2", "r3"] {
            runner.submit(&request(id)).unwrap();
            while runner.poll().is_none() {}
        }

        assert_eq!(log.observers_added(), 1);
        assert!(runner.release());
        assert_eq!(log.observers_removed(), 1);
    }

    #[test]
    fn test_failed_job_reports_sanitized_error() {
        let logger = Logger::capturing();
        let (job, _) = job(ScriptedOutcome::failed("RadiomicsCLI standard error:\n\nmask is empty"));
        let mut runner = JobRunner::new(job, RunMode::Synchronous, &logger);

        let completion = runner.submit(&request("r1")).unwrap().unwrap();
        assert!(!completion.is_success());
        assert_eq!(completion.error_text, "mask is empty");
        assert!(logger.captured().contains(&"[ERROR] mask is empty".to_string()));
    }

    #[test]
    fn test_extractor_progress_output_is_not_an_error() {
        let logger = Logger::capturing();
        let (job, _) = job(ScriptedOutcome::Finished {
            status: JobStatus::Completed,
            output_text: "Image,Mask\nct,mask\n".to_string(),
            error_text: "INFO:radiomics.featureextractor: Calculating features".to_string(),
        });
        let mut runner = JobRunner::new(job, RunMode::Synchronous, &logger);

        let completion = runner.submit(&request("r1")).unwrap().unwrap();
        assert!(completion.is_success());
        assert_eq!(logger.count_level(log::Level::Error), 0);
        assert!(logger.captured().contains(
            &"[DEBUG] INFO:radiomics.featureextractor: Calculating features".to_string()
        ));
    }

    #[test]
    fn test_start_failure_leaves_runner_idle() {
        let logger = Logger::capturing();
        let (job, _) = job(ScriptedOutcome::StartError("executable not found".to_string()));
        let mut runner = JobRunner::new(job, RunMode::Asynchronous, &logger);

        assert!(runner.submit(&request("r1")).is_err());
        assert!(!runner.is_in_flight());
    }

    #[test]
    fn test_stale_events_are_ignored_when_idle() {
        let logger = Logger::capturing();
        let (job, _) = job(ScriptedOutcome::completed(""));
        let mut runner = JobRunner::new(job, RunMode::Asynchronous, &logger);

        assert!(runner.handle_status(StatusEvent { status: JobStatus::Completed }).is_none());
        assert_eq!(runner.phase(), JobPhase::Idle);
    }
}
