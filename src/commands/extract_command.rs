//! Feature extraction command
//!
//! This module implements the apply action: it checks the inputs, builds the
//! extractor customization from manual settings or a parameter file, runs the
//! batch to completion and writes the output table as CSV.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::ArgMatches;
use log::info;

use crate::adapter::AdapterOptions;
use crate::batch::{BatchController, BatchInputs, BatchSummary, CompletionCallback};
use crate::commands::command_traits::Command;
use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::host::{run_until_idle, DEFAULT_POLL_INTERVAL};
use crate::job::{JobLauncher, ProcessLauncher, RunMode, DEFAULT_EXTRACTOR};
use crate::settings::ManualSettings;
use crate::table::{OutputTable, SharedTable, TableLayout};
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;
use crate::volume::{ImageVolume, LabelVolume, Segmentation};

/// Flag telling whether an extraction is in progress
///
/// Clones share the same flag, so several commands can be kept from running
/// at the same time.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Rc<Cell<bool>>);

impl BusyFlag {
    pub fn new() -> Self {
        BusyFlag::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.get()
    }

    /// Raise the flag, `None` if it is already raised
    pub fn acquire(&self) -> Option<BusyGuard> {
        if self.0.get() {
            return None;
        }
        self.0.set(true);
        Some(BusyGuard(Rc::clone(&self.0)))
    }
}

/// Lowers the busy flag when dropped
pub struct BusyGuard(Rc<Cell<bool>>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Command extracting features for every region of an image
pub struct ExtractCommand<'a> {
    /// Image the features are extracted from
    image: PathBuf,
    /// Multi-label volume (optional)
    label: Option<PathBuf>,
    /// Directory of segment volumes (optional)
    segmentation: Option<PathBuf>,
    /// Parameter file replacing the manual settings (optional)
    parameter_file: Option<PathBuf>,
    /// Manual customization
    settings: ManualSettings,
    /// CSV file receiving the table, stdout when missing
    output: Option<PathBuf>,
    layout: TableLayout,
    mode: RunMode,
    /// Creates the job handle of the batch
    launcher: Rc<dyn JobLauncher<'a> + 'a>,
    show_progress: bool,
    busy: BusyFlag,
    logger: &'a Logger,
}

impl<'a> ExtractCommand<'a> {
    /// Create a new extract command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new ExtractCommand instance or an error for malformed options
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> RadiomicsResult<Self> {
        info!("Creating new extract command from arguments");

        let image = args.get_one::<String>("input")
            .ok_or_else(|| RadiomicsError::GenericError("Missing input image".to_string()))?;
        let path_arg = |name: &str| args.get_one::<String>(name).map(PathBuf::from);

        let settings = Self::parse_settings(args)?;

        let layout = match args.get_one::<String>("layout") {
            Some(name) => TableLayout::from_name(name)
                .ok_or_else(|| RadiomicsError::ConfigError(format!("Unknown table layout: {}", name)))?,
            None => TableLayout::PerRegionColumns,
        };

        let mode = if args.get_flag("sync") { RunMode::Synchronous } else { RunMode::Asynchronous };

        let extractor = args.get_one::<String>("extractor")
            .map(String::as_str)
            .unwrap_or(DEFAULT_EXTRACTOR);
        let options = AdapterOptions {
            rename_outdir: false,
            posix_paths: args.get_flag("posix-paths"),
        };
        info!("Extractor: {} ({:?})", extractor, options);

        Ok(ExtractCommand {
            image: PathBuf::from(image),
            label: path_arg("label"),
            segmentation: path_arg("segmentation"),
            parameter_file: path_arg("param"),
            settings,
            output: path_arg("output"),
            layout,
            mode,
            launcher: Rc::new(ProcessLauncher::new(extractor, logger).with_options(options)),
            show_progress: !args.get_flag("quiet"),
            busy: BusyFlag::new(),
            logger,
        })
    }

    /// Collect the manual customization from the arguments
    fn parse_settings(args: &ArgMatches) -> RadiomicsResult<ManualSettings> {
        let mut settings = ManualSettings::default();

        if args.get_flag("all-features") {
            settings.enable_all_classes();
        } else if let Some(features) = args.get_one::<String>("features") {
            settings.disable_all_classes();
            settings.feature_classes = features
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(bin_width) = args.get_one::<String>("bin-width") {
            settings.bin_width = bin_width.trim().parse::<f64>()
                .map_err(|_| RadiomicsError::ConfigError(format!("Invalid bin width: {}", bin_width)))?;
        }

        if let Some(symmetrical) = args.get_one::<String>("symmetrical-glcm") {
            settings.symmetrical_glcm = symmetrical.trim().parse::<bool>()
                .map_err(|_| RadiomicsError::ConfigError(format!("Invalid symmetrical GLCM flag: {}", symmetrical)))?;
        }

        settings.resampled_spacing = args.get_one::<String>("resampled-spacing").cloned();
        settings.log_sigma = args.get_one::<String>("log-sigma").cloned();
        settings.wavelet = args.get_flag("wavelet");

        Ok(settings)
    }

    /// Run extractions through another launcher
    pub fn with_launcher(mut self, launcher: Rc<dyn JobLauncher<'a> + 'a>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Share a busy flag with other commands
    pub fn with_busy_flag(mut self, busy: BusyFlag) -> Self {
        self.busy = busy;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// Check the volumes and reference them for a batch
    fn load_inputs(&self) -> RadiomicsResult<BatchInputs> {
        let image = ImageVolume::open(&self.image)?;

        if self.label.is_none() && self.segmentation.is_none() {
            return Err(RadiomicsError::ConfigError(
                "Select a label volume or a segmentation to define the regions".to_string()
            ));
        }

        let mut inputs = BatchInputs::new(image);
        if let Some(label) = &self.label {
            if !label.is_file() {
                return Err(RadiomicsError::VolumeError(format!("Label volume not found: {}", label.display())));
            }
            inputs = inputs.with_label(LabelVolume::open(label));
        }
        if let Some(dir) = &self.segmentation {
            inputs = inputs.with_segmentation(Segmentation::from_dir(dir)?);
        }

        Ok(inputs)
    }

    /// Run the batch and return the filled table
    pub fn apply(&self) -> RadiomicsResult<(BatchSummary, SharedTable)> {
        let inputs = self.load_inputs()?;
        let table = OutputTable::shared();

        let finished: Rc<Cell<Option<BatchSummary>>> = Rc::new(Cell::new(None));
        let report = Rc::clone(&finished);
        let on_complete: CompletionCallback<'a> = Box::new(move |summary: &BatchSummary| report.set(Some(*summary)));

        let mut controller = BatchController::new(Box::new(Rc::clone(&self.launcher)), self.logger)
            .with_mode(self.mode)
            .with_layout(self.layout);

        let started = match &self.parameter_file {
            Some(path) => {
                self.logger.info(&format!("Using parameter file {}", path.display()));
                controller.run_with_parameter_file(inputs, path, Some(table.clone()), Some(on_complete))?
            }
            None => {
                let params = self.settings.build()?;
                controller.run(inputs, &params, Some(table.clone()), Some(on_complete))?
            }
        };
        if !started {
            return Err(RadiomicsError::JobError("Extraction already running".to_string()));
        }

        let progress = if self.show_progress {
            ProgressTracker::new("Extracting features")
        } else {
            ProgressTracker::hidden()
        };
        run_until_idle(&mut controller, DEFAULT_POLL_INTERVAL, Some(&progress));

        let summary = finished.get()
            .ok_or_else(|| RadiomicsError::JobError("Batch ended without reporting".to_string()))?;
        Ok((summary, table))
    }

    fn write_output(&self, table: &OutputTable) -> RadiomicsResult<()> {
        match &self.output {
            Some(path) => {
                table.save_csv(path)?;
                self.logger.info(&format!("Wrote {} rows to {}", table.row_count(), path.display()));
            }
            None => print!("{}", table.to_csv_string()?),
        }
        Ok(())
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

impl<'a> Command for ExtractCommand<'a> {
    fn execute(&self) -> RadiomicsResult<()> {
        let _guard = match self.busy.acquire() {
            Some(guard) => guard,
            None => {
                self.logger.warn("Extraction already in progress");
                return Err(RadiomicsError::JobError("Extraction already in progress".to_string()));
            }
        };

        let outcome = self.apply().and_then(|(summary, table)| {
            self.write_output(&table.borrow())?;
            Ok(summary)
        });

        match outcome {
            Ok(summary) => {
                self.logger.info(&format!(
                    "Extracted {} of {} regions ({} failed)",
                    summary.completed, summary.regions, summary.failed
                ));
                Ok(())
            }
            Err(e) => {
                self.logger.error(&format!("Feature extraction failed: {}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::job::testing::{ScriptedLauncher, ScriptedOutcome};
    use crate::cli::build_cli;

    fn command<'a>(argv: &[&str], logger: &'a Logger) -> ExtractCommand<'a> {
        let matches = build_cli().get_matches_from(argv);
        ExtractCommand::new(&matches, logger).unwrap().with_progress(false)
    }

    #[test]
    fn test_options_are_parsed() {
        let logger = Logger::capturing();
        let matches = build_cli().get_matches_from([
            "radiokit", "ct.nii", "--features", "shape, glcm", "--bin-width", "10",
            "--symmetrical-glcm", "false", "--layout", "long", "--sync",
        ]);
        let command = ExtractCommand::new(&matches, &logger).unwrap();

        assert_eq!(command.settings.feature_classes, vec!["shape", "glcm"]);
        assert_eq!(command.settings.bin_width, 10.0);
        assert!(!command.settings.symmetrical_glcm);
        assert_eq!(command.layout, TableLayout::LongFormat);
        assert_eq!(command.mode, RunMode::Synchronous);
    }

    #[test]
    fn test_invalid_bin_width_is_rejected() {
        let logger = Logger::capturing();
        let matches = build_cli().get_matches_from(["radiokit", "ct.nii", "--bin-width", "wide"]);
        assert!(matches!(ExtractCommand::new(&matches, &logger), Err(RadiomicsError::ConfigError(_))));
    }

    #[test]
    fn test_missing_region_source_fails_and_releases_guard() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("ct.nii");
        fs::write(&image, b"image").unwrap();

        let command = command(&["radiokit", image.to_str().unwrap()], &logger);
        let busy = command.busy_flag();

        assert!(matches!(command.execute(), Err(RadiomicsError::ConfigError(_))));
        assert!(!busy.is_busy());
    }

    #[test]
    fn test_busy_flag_rejects_concurrent_apply() {
        let logger = Logger::capturing();
        let busy = BusyFlag::new();
        let command = command(&["radiokit", "ct.nii", "--label", "mask.nii"], &logger)
            .with_busy_flag(busy.clone());

        let _held = busy.acquire().unwrap();
        assert!(matches!(command.execute(), Err(RadiomicsError::JobError(_))));
        assert!(busy.is_busy());
    }

    #[test]
    fn test_malformed_spacing_aborts_before_jobs() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("ct.nii");
        let seg_dir = dir.path().join("lesions");
        fs::write(&image, b"image").unwrap();
        fs::create_dir(&seg_dir).unwrap();

        let launcher = ScriptedLauncher::new(|_| ScriptedOutcome::completed(""));
        let log = launcher.log();
        let command = command(&[
            "radiokit", image.to_str().unwrap(), "--segmentation", seg_dir.to_str().unwrap(),
            "--resampled-spacing", "1,,3",
        ], &logger).with_launcher(Rc::new(launcher));

        assert!(matches!(command.execute(), Err(RadiomicsError::ConfigError(_))));
        assert_eq!(log.jobs_created(), 0);
        assert!(!command.busy_flag().is_busy());
    }

    #[test]
    fn test_empty_segmentation_reports_zero_regions() {
        let logger = Logger::capturing();
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("ct.nii");
        let seg_dir = dir.path().join("lesions");
        let output = dir.path().join("features.csv");
        fs::write(&image, b"image").unwrap();
        fs::create_dir(&seg_dir).unwrap();

        let launcher = ScriptedLauncher::new(|_| ScriptedOutcome::completed(""));
        let command = command(&[
            "radiokit", image.to_str().unwrap(), "--segmentation", seg_dir.to_str().unwrap(),
            "--output", output.to_str().unwrap(),
        ], &logger).with_launcher(Rc::new(launcher));

        command.execute().unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "Image type,Feature Class,Feature Name\n");
        assert!(logger.captured().contains(&"[INFO] Extracted 0 of 0 regions (0 failed)".to_string()));
    }
}
