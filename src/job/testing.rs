//! In-memory extraction jobs for tests
//!
//! A scripted job answers every request with an outcome chosen by a closure
//! and moves one status step per refresh, so batches can be exercised
//! without an extractor installed. Only built for tests and with the
//! `testing` feature.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::job::job_traits::{ExtractionJob, JobLauncher, JobRequest};
use crate::job::status::{JobStatus, ObserverList, ObserverTag, StatusEvent};

/// What a scripted extraction does
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    /// Run and finish with the given status and output
    Finished {
        status: JobStatus,
        output_text: String,
        error_text: String,
    },
    /// Refuse to start
    StartError(String),
}

impl ScriptedOutcome {
    /// Finish without errors, printing `output_text`
    pub fn completed(output_text: &str) -> Self {
        ScriptedOutcome::Finished {
            status: JobStatus::Completed,
            output_text: output_text.to_string(),
            error_text: String::new(),
        }
    }

    /// Finish with errors, reporting `error_text`
    pub fn failed(error_text: &str) -> Self {
        ScriptedOutcome::Finished {
            status: JobStatus::CompletedWithErrors,
            output_text: String::new(),
            error_text: error_text.to_string(),
        }
    }
}

/// Closure choosing the outcome of each request
pub type Script = Rc<dyn Fn(&JobRequest) -> ScriptedOutcome>;

#[derive(Debug, Default)]
struct JobLogInner {
    jobs_created: usize,
    jobs_dropped: usize,
    started: Vec<String>,
    observers_added: usize,
    observers_removed: usize,
}

/// Shared record of what scripted jobs were asked to do
#[derive(Debug, Clone, Default)]
pub struct JobLog(Rc<RefCell<JobLogInner>>);

impl JobLog {
    pub fn jobs_created(&self) -> usize {
        self.0.borrow().jobs_created
    }

    /// Number of job handles released
    pub fn jobs_dropped(&self) -> usize {
        self.0.borrow().jobs_dropped
    }

    /// Region identifiers in the order their extraction started
    pub fn started(&self) -> Vec<String> {
        self.0.borrow().started.clone()
    }

    pub fn observers_added(&self) -> usize {
        self.0.borrow().observers_added
    }

    pub fn observers_removed(&self) -> usize {
        self.0.borrow().observers_removed
    }
}

/// Job handle following a script
pub struct ScriptedJob {
    script: Script,
    log: JobLog,
    pending: Option<(JobStatus, String, String)>,
    status: JobStatus,
    output_text: String,
    error_text: String,
    observers: ObserverList,
}

impl ScriptedJob {
    pub fn new(script: Script, log: JobLog) -> Self {
        log.0.borrow_mut().jobs_created += 1;
        ScriptedJob {
            script,
            log,
            pending: None,
            status: JobStatus::Idle,
            output_text: String::new(),
            error_text: String::new(),
            observers: ObserverList::new(),
        }
    }

    fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.observers.notify(status);
    }

    fn finish(&mut self) {
        if let Some((status, output_text, error_text)) = self.pending.take() {
            self.output_text = output_text;
            self.error_text = error_text;
            self.set_status(status);
        }
    }
}

impl ExtractionJob for ScriptedJob {
    fn start(&mut self, request: &JobRequest) -> RadiomicsResult<()> {
        if self.is_busy() {
            return Err(RadiomicsError::JobError("An extraction is already running on this job".to_string()));
        }

        match (self.script)(request) {
            ScriptedOutcome::StartError(message) => Err(RadiomicsError::JobError(message)),
            ScriptedOutcome::Finished { status, output_text, error_text } => {
                self.log.0.borrow_mut().started.push(request.region_id.clone());
                self.output_text.clear();
                self.error_text.clear();
                self.pending = Some((status, output_text, error_text));
                self.set_status(JobStatus::Scheduled);
                Ok(())
            }
        }
    }

    fn wait(&mut self) -> RadiomicsResult<JobStatus> {
        if self.status == JobStatus::Scheduled {
            self.set_status(JobStatus::Running);
        }
        self.finish();
        Ok(self.status)
    }

    fn refresh(&mut self) {
        match self.status {
            JobStatus::Scheduled => self.set_status(JobStatus::Running),
            JobStatus::Running => self.finish(),
            _ => {}
        }
    }

    fn status(&self) -> JobStatus {
        self.status
    }

    fn output_text(&self) -> &str {
        &self.output_text
    }

    fn error_text(&self) -> &str {
        &self.error_text
    }

    fn add_observer(&mut self, observer: Sender<StatusEvent>) -> ObserverTag {
        self.log.0.borrow_mut().observers_added += 1;
        self.observers.add(observer)
    }

    fn remove_observer(&mut self, tag: ObserverTag) -> bool {
        let removed = self.observers.remove(tag);
        if removed {
            self.log.0.borrow_mut().observers_removed += 1;
        }
        removed
    }
}

impl Drop for ScriptedJob {
    fn drop(&mut self) {
        self.log.0.borrow_mut().jobs_dropped += 1;
    }
}

/// Launcher creating [`ScriptedJob`] handles that share one [`JobLog`]
#[derive(Clone)]
pub struct ScriptedLauncher {
    script: Script,
    log: JobLog,
}

impl ScriptedLauncher {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&JobRequest) -> ScriptedOutcome + 'static,
    {
        ScriptedLauncher {
            script: Rc::new(script),
            log: JobLog::default(),
        }
    }

    pub fn log(&self) -> JobLog {
        self.log.clone()
    }
}

impl<'a> JobLauncher<'a> for ScriptedLauncher {
    fn create_job(&self, _work_dir: &Path) -> RadiomicsResult<Box<dyn ExtractionJob + 'a>> {
        Ok(Box::new(ScriptedJob::new(Rc::clone(&self.script), self.log.clone())))
    }
}
