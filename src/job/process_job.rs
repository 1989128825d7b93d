//! Extraction jobs running the extractor executable
//!
//! Each extraction is one child process. Its standard output and error are
//! redirected to files in the batch work directory so a long-running child
//! never blocks on a full pipe while the host polls it.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::Sender;

use crate::adapter::{host_args, translate_args, AdaptedCommand, AdapterOptions};
use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::job::job_traits::{ExtractionJob, JobLauncher, JobRequest};
use crate::job::status::{JobStatus, ObserverList, ObserverTag, StatusEvent};
use crate::utils::logger::Logger;

/// Default extractor executable
pub const DEFAULT_EXTRACTOR: &str = "pyradiomics";

const STDOUT_FILE: &str = "extractor_stdout.csv";
const STDERR_FILE: &str = "extractor_stderr.txt";

/// Creates [`ProcessJob`] handles
#[derive(Clone)]
pub struct ProcessLauncher<'a> {
    /// Executable to run
    program: String,
    /// Arguments placed before the extraction arguments
    base_args: Vec<String>,
    /// Host specific argument rewrites
    options: AdapterOptions,
    logger: &'a Logger,
}

impl<'a> ProcessLauncher<'a> {
    /// Create a launcher for an executable
    ///
    /// # Arguments
    /// * `program` - Executable name or path
    /// * `logger` - Logger handed to every job
    pub fn new(program: &str, logger: &'a Logger) -> Self {
        ProcessLauncher {
            program: program.to_string(),
            base_args: Vec::new(),
            options: AdapterOptions::default(),
            logger,
        }
    }

    /// Arguments placed before the extraction arguments
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }
}

impl<'a> JobLauncher<'a> for ProcessLauncher<'a> {
    fn create_job(&self, work_dir: &Path) -> RadiomicsResult<Box<dyn ExtractionJob + 'a>> {
        Ok(Box::new(ProcessJob::new(
            &self.program,
            self.base_args.clone(),
            self.options,
            work_dir,
            self.logger,
        )))
    }
}

/// Read a redirected output file, keeping undecodable bytes as replacement characters
fn read_output(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Job handle running one extractor process at a time
pub struct ProcessJob<'a> {
    program: String,
    base_args: Vec<String>,
    options: AdapterOptions,
    work_dir: PathBuf,
    child: Option<Child>,
    status: JobStatus,
    output_text: String,
    error_text: String,
    observers: ObserverList,
    logger: &'a Logger,
}

impl<'a> ProcessJob<'a> {
    pub fn new(program: &str, base_args: Vec<String>, options: AdapterOptions,
               work_dir: &Path, logger: &'a Logger) -> Self {
        ProcessJob {
            program: program.to_string(),
            base_args,
            options,
            work_dir: work_dir.to_path_buf(),
            child: None,
            status: JobStatus::Idle,
            output_text: String::new(),
            error_text: String::new(),
            observers: ObserverList::new(),
            logger,
        }
    }

    fn set_status(&mut self, status: JobStatus) {
        if self.status != status {
            self.logger.debug(&format!("Extractor status {} -> {}", self.status, status));
            self.status = status;
            self.observers.notify(status);
        }
    }

    /// Collect the output of the finished child and publish the end state
    fn finish(&mut self, exit: ExitStatus) {
        self.child = None;
        let mut problems = Vec::new();

        match read_output(&self.work_dir.join(STDOUT_FILE)) {
            Ok(text) => self.output_text = text,
            Err(e) => problems.push(format!("Failed to read extractor output: {}", e)),
        }
        match read_output(&self.work_dir.join(STDERR_FILE)) {
            Ok(text) => self.error_text = text,
            Err(e) => problems.push(format!("Failed to read extractor error output: {}", e)),
        }

        if !exit.success() && self.error_text.trim().is_empty() {
            problems.push(format!("Extractor exited with {}", exit));
        }
        if !problems.is_empty() {
            if !self.error_text.trim().is_empty() {
                problems.insert(0, self.error_text.trim_end().to_string());
            }
            self.error_text = problems.join("\n");
        }

        let status = if exit.success() && problems.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::CompletedWithErrors
        };
        self.set_status(status);
    }

    fn fail(&mut self, message: String) {
        self.child = None;
        self.error_text = message;
        self.set_status(JobStatus::CompletedWithErrors);
    }
}

impl<'a> ExtractionJob for ProcessJob<'a> {
    fn start(&mut self, request: &JobRequest) -> RadiomicsResult<()> {
        if self.is_busy() {
            return Err(RadiomicsError::JobError("An extraction is already running on this job".to_string()));
        }

        let args = host_args(
            &request.image.to_string_lossy(),
            &request.mask.to_string_lossy(),
            &request.parameter_file.to_string_lossy(),
            request.label,
        );
        let args = match translate_args(&args, self.options)? {
            AdaptedCommand::Run(args) => args,
            AdaptedCommand::PrintDescriptor => {
                return Err(RadiomicsError::JobError("Unexpected descriptor request".to_string()))
            }
        };

        let stdout = File::create(self.work_dir.join(STDOUT_FILE))?;
        let stderr = File::create(self.work_dir.join(STDERR_FILE))?;

        self.logger.info(&format!("Running {} for {}", self.program, request.region_id));
        let child = Command::new(&self.program)
            .args(&self.base_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| RadiomicsError::JobError(format!("Failed to start {}: {}", self.program, e)))?;

        self.output_text.clear();
        self.error_text.clear();
        self.child = Some(child);
        // Reset so the next transition is always published
        self.status = JobStatus::Idle;
        self.set_status(JobStatus::Scheduled);
        Ok(())
    }

    fn wait(&mut self) -> RadiomicsResult<JobStatus> {
        if self.status == JobStatus::Scheduled {
            self.set_status(JobStatus::Running);
        }

        if let Some(child) = self.child.as_mut() {
            match child.wait() {
                Ok(exit) => self.finish(exit),
                Err(e) => self.fail(format!("Failed to wait for {}: {}", self.program, e)),
            }
        }

        Ok(self.status)
    }

    fn refresh(&mut self) {
        if self.child.is_none() {
            return;
        }

        if self.status == JobStatus::Scheduled {
            self.set_status(JobStatus::Running);
        }

        let polled = match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => return,
        };
        match polled {
            Ok(Some(exit)) => self.finish(exit),
            Ok(None) => {}
            Err(e) => self.fail(format!("Failed to poll {}: {}", self.program, e)),
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
        self.observers.add(observer)
    }

    fn remove_observer(&mut self, tag: ObserverTag) -> bool {
        self.observers.remove(tag)
    }
}

impl<'a> Drop for ProcessJob<'a> {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
