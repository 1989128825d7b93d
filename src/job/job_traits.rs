//! Extraction job interfaces
//!
//! An extraction job is a handle to the external extractor. A batch creates
//! one handle and runs one extraction after the other on it.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Sender;

use crate::errors::RadiomicsResult;
use crate::job::status::{JobStatus, ObserverTag, StatusEvent};
use crate::region::Region;

/// Everything the extractor needs for one region
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    /// Identifier of the region, used in logs
    pub region_id: String,
    /// Image the features are extracted from
    pub image: PathBuf,
    /// Volume defining the region
    pub mask: PathBuf,
    /// Label value of the region in `mask`
    pub label: u32,
    /// Parameter file customizing the extraction
    pub parameter_file: PathBuf,
}

impl JobRequest {
    /// Build the request for a region with the batch's parameter file
    pub fn for_region(region: &Region, parameter_file: &Path) -> Self {
        JobRequest {
            region_id: region.id.clone(),
            image: region.image.path.clone(),
            mask: region.mask.clone(),
            label: region.label,
            parameter_file: parameter_file.to_path_buf(),
        }
    }
}

/// Handle to an external extraction job
///
/// Only one extraction is attached to a handle at a time. Observers are
/// notified of every status change; implementations only change status in
/// `start`, `refresh` and `wait`.
pub trait ExtractionJob {
    /// Start an extraction on this handle
    ///
    /// # Arguments
    /// * `request` - Region and parameters of the extraction
    ///
    /// # Returns
    /// An error if the extraction could not be started
    fn start(&mut self, request: &JobRequest) -> RadiomicsResult<()>;

    /// Block until the current extraction has finished
    ///
    /// # Returns
    /// The final status of the extraction
    fn wait(&mut self) -> RadiomicsResult<JobStatus>;

    /// Look at the extraction without blocking and publish status changes
    fn refresh(&mut self);

    /// Current status
    fn status(&self) -> JobStatus;

    /// Whether an extraction is attached and not finished
    fn is_busy(&self) -> bool {
        self.status().is_busy()
    }

    /// Standard output of the last finished extraction
    fn output_text(&self) -> &str;

    /// Error output of the last finished extraction
    fn error_text(&self) -> &str;

    /// Register a status observer
    fn add_observer(&mut self, observer: Sender<StatusEvent>) -> ObserverTag;

    /// Remove a status observer, returning whether it was registered
    fn remove_observer(&mut self, tag: ObserverTag) -> bool;
}

/// Creates the job handle of a batch
///
/// Handles may borrow from the launcher's environment for `'a`, such as the
/// logger of the batch.
pub trait JobLauncher<'a> {
    /// Create a job handle
    ///
    /// # Arguments
    /// * `work_dir` - Scratch directory owned by the batch
    fn create_job(&self, work_dir: &Path) -> RadiomicsResult<Box<dyn ExtractionJob + 'a>>;
}

impl<'a, L: JobLauncher<'a> + ?Sized> JobLauncher<'a> for Rc<L> {
    fn create_job(&self, work_dir: &Path) -> RadiomicsResult<Box<dyn ExtractionJob + 'a>> {
        (**self).create_job(work_dir)
    }
}
