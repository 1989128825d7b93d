//! Batch controller
//!
//! Runs one extraction per region of interest, one after the other, on a
//! single job handle and merges every result into the output table. When the
//! regions run out the batch is torn down exactly once, whether every region
//! succeeded, every region failed or there were no regions at all.

use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::job::{JobCompletion, JobLauncher, JobRequest, JobRunner, ObserverTag, RunMode};
use crate::region::{Region, RegionEnumerator};
use crate::settings::{ExtractionParams, ParameterFile};
use crate::table::{ExtractionResult, ResultAccumulator, SharedTable, TableLayout};
use crate::utils::logger::Logger;
use crate::volume::{ImageVolume, LabelVolume, NiftiSegmentConverter, SegmentConverter, Segmentation};

/// Volumes of one batch
#[derive(Debug)]
pub struct BatchInputs {
    /// Image the features are extracted from
    pub image: ImageVolume,
    /// Multi-label volume, one region per label
    pub label: Option<LabelVolume>,
    /// Segmentation, one region per segment
    pub segmentation: Option<Segmentation>,
}

impl BatchInputs {
    pub fn new(image: ImageVolume) -> Self {
        BatchInputs {
            image,
            label: None,
            segmentation: None,
        }
    }

    pub fn with_label(mut self, label: LabelVolume) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    /// Whether any region source is set
    pub fn has_region_source(&self) -> bool {
        self.label.is_some() || self.segmentation.is_some()
    }
}

/// Counters reported when a batch ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Regions handed out by the enumerator
    pub regions: usize,
    /// Regions whose results were merged
    pub completed: usize,
    /// Regions that failed to start, failed to extract or returned unreadable results
    pub failed: usize,
}

/// Called once when a batch has been cleaned up
pub type CompletionCallback<'a> = Box<dyn FnOnce(&BatchSummary) + 'a>;

/// Everything owned by a batch in flight, dropped as a whole at cleanup
struct BatchState<'a> {
    regions: RegionEnumerator<'a>,
    runner: JobRunner<'a>,
    accumulator: ResultAccumulator<'a>,
    parameter_file: ParameterFile,
    current: Option<Region>,
    summary: BatchSummary,
    on_complete: Option<CompletionCallback<'a>>,
    scratch: TempDir,
}

impl<'a> BatchState<'a> {
    /// Merge the completion of a region into the table
    fn record(&mut self, region_id: &str, completion: JobCompletion, logger: &Logger) {
        if !completion.is_success() {
            logger.warn(&format!("Extraction failed for {}", region_id));
            self.summary.failed += 1;
            return;
        }

        match ExtractionResult::from_csv(&completion.output_text) {
            Ok(result) => {
                self.accumulator.merge(region_id, &result);
                self.summary.completed += 1;
            }
            Err(e) => {
                logger.error(&format!("Failed to read results of {}: {}", region_id, e));
                self.summary.failed += 1;
            }
        }
    }
}

/// Sequences the extractions of a batch
pub struct BatchController<'a> {
    logger: &'a Logger,
    launcher: Box<dyn JobLauncher<'a> + 'a>,
    converter: Rc<dyn SegmentConverter + 'a>,
    mode: RunMode,
    layout: TableLayout,
    parameter_dir: PathBuf,
    state: Option<BatchState<'a>>,
    last_summary: Option<BatchSummary>,
}

impl<'a> BatchController<'a> {
    /// Create a controller
    ///
    /// Defaults to asynchronous jobs, one table column per region, NIfTI
    /// segment conversion and parameter files in the system temp directory.
    ///
    /// # Arguments
    /// * `launcher` - Creates the job handle of each batch
    /// * `logger` - Logger shared by every component of a batch
    pub fn new(launcher: Box<dyn JobLauncher<'a> + 'a>, logger: &'a Logger) -> Self {
        BatchController {
            logger,
            launcher,
            converter: Rc::new(NiftiSegmentConverter),
            mode: RunMode::Asynchronous,
            layout: TableLayout::PerRegionColumns,
            parameter_dir: env::temp_dir(),
            state: None,
            last_summary: None,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_layout(mut self, layout: TableLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_converter(mut self, converter: Rc<dyn SegmentConverter + 'a>) -> Self {
        self.converter = converter;
        self
    }

    /// Directory receiving parameter files generated from manual settings
    pub fn with_parameter_dir(mut self, dir: &Path) -> Self {
        self.parameter_dir = dir.to_path_buf();
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Whether a batch is in flight
    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Identifier of the region currently being extracted
    pub fn current_region(&self) -> Option<&str> {
        self.state
            .as_ref()
            .and_then(|state| state.current.as_ref())
            .map(|region| region.id.as_str())
    }

    /// Tag of the status observer of the batch in flight
    pub fn observer_tag(&self) -> Option<ObserverTag> {
        self.state.as_ref().and_then(|state| state.runner.observer_tag())
    }

    /// Summary of the batch in flight, or of the last finished one
    pub fn summary(&self) -> Option<BatchSummary> {
        match self.state.as_ref() {
            Some(state) => Some(state.summary),
            None => self.last_summary,
        }
    }

    /// Start a batch customized by parameters
    ///
    /// The parameters are written to a generated parameter file that is
    /// deleted when the batch ends.
    ///
    /// # Arguments
    /// * `inputs` - Image and region sources
    /// * `params` - Extractor customization
    /// * `table` - Table receiving the results
    /// * `on_complete` - Called once after cleanup
    ///
    /// # Returns
    /// `false` if a batch is already running and the request was ignored,
    /// or an error if the batch could not be set up
    pub fn run(&mut self,
               inputs: BatchInputs,
               params: &ExtractionParams,
               table: Option<SharedTable>,
               on_complete: Option<CompletionCallback<'a>>) -> RadiomicsResult<bool> {
        if self.reject_if_running() {
            return Ok(false);
        }

        params.validate()?;
        let parameter_file = ParameterFile::generate(params, &self.parameter_dir)?;
        self.logger.debug(&format!("Wrote parameter file {}", parameter_file.path().display()));

        self.start_batch(inputs, parameter_file, table, on_complete)
    }

    /// Start a batch customized by a caller supplied parameter file
    ///
    /// The file is never deleted by the batch.
    pub fn run_with_parameter_file(&mut self,
                                   inputs: BatchInputs,
                                   parameter_file: &Path,
                                   table: Option<SharedTable>,
                                   on_complete: Option<CompletionCallback<'a>>) -> RadiomicsResult<bool> {
        if self.reject_if_running() {
            return Ok(false);
        }

        let parameter_file = ParameterFile::supplied(parameter_file)?;
        self.start_batch(inputs, parameter_file, table, on_complete)
    }

    /// Advance the batch with the job's pending status messages
    ///
    /// Hosts call this from their event loop while [`is_running`] holds.
    ///
    /// [`is_running`]: BatchController::is_running
    ///
    /// # Returns
    /// Whether the batch is still running
    pub fn process_events(&mut self) -> bool {
        let completion = match self.state.as_mut() {
            Some(state) => state.runner.poll(),
            None => return false,
        };

        if let Some(completion) = completion {
            let logger = self.logger;
            if let Some(state) = self.state.as_mut() {
                let region_id = state.current.take().map(|region| region.id).unwrap_or_default();
                state.record(&region_id, completion, logger);
            }
            self.start_next();
        }

        self.is_running()
    }

    fn reject_if_running(&self) -> bool {
        if self.is_running() {
            self.logger.warn("Extraction already running, ignoring new batch");
            return true;
        }
        false
    }

    fn start_batch(&mut self,
                   inputs: BatchInputs,
                   parameter_file: ParameterFile,
                   table: Option<SharedTable>,
                   on_complete: Option<CompletionCallback<'a>>) -> RadiomicsResult<bool> {
        let prepared = tempfile::Builder::new()
            .prefix("radiokit")
            .tempdir()
            .map_err(RadiomicsError::from)
            .and_then(|scratch| {
                let job = self.launcher.create_job(scratch.path())?;
                Ok((scratch, job))
            });
        let (scratch, job) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                parameter_file.release(self.logger);
                return Err(e);
            }
        };

        let mut accumulator = ResultAccumulator::new(table, self.layout, self.logger);
        accumulator.init();

        let regions = RegionEnumerator::new(
            Rc::new(inputs.image),
            inputs.label,
            inputs.segmentation,
            Rc::clone(&self.converter),
            scratch.path(),
            self.logger,
        );

        self.state = Some(BatchState {
            regions,
            runner: JobRunner::new(job, self.mode, self.logger),
            accumulator,
            parameter_file,
            current: None,
            summary: BatchSummary::default(),
            on_complete,
            scratch,
        });

        self.start_next();
        Ok(true)
    }

    /// Start the next region, finishing the batch when there is none
    ///
    /// Synchronous completions and regions failing to start are handled in
    /// place, so this only returns with an asynchronous job in flight or with
    /// the batch finished.
    fn start_next(&mut self) {
        let logger = self.logger;

        loop {
            let state = match self.state.as_mut() {
                Some(state) => state,
                None => return,
            };

            let region = match state.regions.next() {
                Some(region) => region,
                None => {
                    logger.info("Extraction complete");
                    self.finish();
                    return;
                }
            };

            state.summary.regions += 1;
            logger.info(&format!("Starting extraction for {}", region.id));
            let request = JobRequest::for_region(&region, state.parameter_file.path());

            match state.runner.submit(&request) {
                Ok(Some(completion)) => state.record(&region.id, completion, logger),
                Ok(None) => {
                    state.current = Some(region);
                    return;
                }
                Err(e) => {
                    logger.error(&format!("Failed to start extraction for {}: {}", region.id, e));
                    state.summary.failed += 1;
                }
            }
        }
    }

    /// Tear the batch down and report it
    fn finish(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };
        self.logger.info("Cleaning up...");

        let BatchState {
            regions,
            runner,
            mut accumulator,
            parameter_file,
            current,
            summary,
            on_complete,
            scratch,
        } = state;

        runner.release();
        drop(regions);
        drop(current);
        parameter_file.release(self.logger);
        accumulator.reset();
        drop(accumulator);
        if let Err(e) = scratch.close() {
            self.logger.warn(&format!("Failed to remove scratch directory: {}", e));
        }

        self.logger.debug("Cleanup finished");
        self.last_summary = Some(summary);

        if let Some(callback) = on_complete {
            callback(&summary);
        }
    }
}
