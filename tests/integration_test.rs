//! Integration tests for complete extraction batches

use std::fs;
use std::path::Path;
use std::rc::Rc;

use ndarray::{Array3, ArrayD, IxDyn};
use nifti::writer::WriterOptions;

use radiokit::batch::{BatchController, BatchInputs, BatchSummary};
use radiokit::job::testing::{ScriptedLauncher, ScriptedOutcome};
use radiokit::job::{JobRequest, RunMode};
use radiokit::settings::ManualSettings;
use radiokit::table::{OutputTable, TableLayout};
use radiokit::utils::logger::Logger;
use radiokit::volume::{ImageVolume, LabelVolume, Segmentation};

fn write_volume(path: &Path, values: &[u8]) {
    let data = Array3::from_shape_vec((2, 2, 2), values.to_vec()).unwrap();
    WriterOptions::new(path).write_nifti(&data).unwrap();
}

fn write_image(dir: &Path) -> ImageVolume {
    let path = dir.join("ct.nii.gz");
    write_volume(&path, &[10, 20, 30, 40, 50, 60, 70, 80]);
    ImageVolume::open(&path).unwrap()
}

/// Outcome mimicking the extractor for one first-order feature
fn mean_of_label(request: &JobRequest) -> ScriptedOutcome {
    if !request.mask.is_file() {
        return ScriptedOutcome::failed("mask missing");
    }
    ScriptedOutcome::completed(&format!(
        "Image,Mask,original_firstorder_Mean\n{},{},{}.5\n",
        request.image.display(), request.mask.display(), request.label
    ))
}

#[cfg(unix)]
const EXTRACTOR_SCRIPT: &str = r#"
label=""
for arg in "$@"; do
  case "$arg" in
    --setting=label:*) label="${arg#--setting=label:}" ;;
  esac
done
if [ "$label" = "3" ]; then
  echo "RadiomicsCLI standard error:" >&2
  echo "" >&2
  echo "mask is empty for label 3" >&2
  exit 1
fi
echo "Image,Mask,original_firstorder_Mean,original_shape_VoxelVolume"
echo "$1,$2,${label}.5,10"
"#;

#[cfg(unix)]
#[test]
fn test_label_volume_batch_with_extractor_process() {
    use radiokit::job::ProcessLauncher;

    let logger = Logger::capturing();
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("extractor.sh");
    fs::write(&script, EXTRACTOR_SCRIPT).unwrap();

    let mask_path = dir.path().join("mask.nii.gz");
    write_volume(&mask_path, &[0, 1, 1, 2, 0, 3, 3, 0]);
    let inputs = BatchInputs::new(write_image(dir.path())).with_label(LabelVolume::open(&mask_path));

    let launcher = ProcessLauncher::new("sh", &logger).with_base_args(vec![script.display().to_string()]);
    let mut controller = BatchController::new(Box::new(launcher), &logger)
        .with_parameter_dir(dir.path());

    let table = OutputTable::shared();
    let finished = Rc::new(std::cell::Cell::new(None));
    let report = Rc::clone(&finished);
    let started = controller.run(
        inputs,
        &ManualSettings::default().build().unwrap(),
        Some(table.clone()),
        Some(Box::new(move |summary: &BatchSummary| report.set(Some(*summary)))),
    ).unwrap();
    assert!(started);

    radiokit::host::run_until_idle(&mut controller, std::time::Duration::from_millis(5), None);

    assert_eq!(finished.get(), Some(BatchSummary { regions: 3, completed: 2, failed: 1 }));
    let table = table.borrow();
    assert_eq!(table.column_names(), &["Image type", "Feature Class", "Feature Name", "mask_label_1", "mask_label_2"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.cell_text(0, 2), Some("Mean"));
    assert_eq!(table.cell_text(0, 4), Some("2.5"));
    assert_eq!(table.cell_text(1, 2), Some("VoxelVolume"));
    assert!(logger.captured().contains(&"[ERROR] mask is empty for label 3".to_string()));

    // Only the inputs and the extractor script are left behind
    let mut left: Vec<String> = fs::read_dir(dir.path()).unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    left.sort();
    assert_eq!(left, vec!["ct.nii.gz", "extractor.sh", "mask.nii.gz"]);
}

#[cfg(unix)]
#[test]
fn test_latin1_image_path_in_extractor_output_is_merged() {
    use radiokit::job::ProcessLauncher;

    let logger = Logger::capturing();
    let dir = tempfile::tempdir().unwrap();
    let mask_path = dir.path().join("mask.nii.gz");
    write_volume(&mask_path, &[0, 1, 1, 0, 0, 0, 0, 0]);
    let inputs = BatchInputs::new(write_image(dir.path())).with_label(LabelVolume::open(&mask_path));

    let script = r"printf 'Image,original_firstorder_Mean\n/data/\351t\351,1.5\n'";
    let launcher = ProcessLauncher::new("sh", &logger)
        .with_base_args(vec!["-c".to_string(), script.to_string(), "sh".to_string()]);
    let mut controller = BatchController::new(Box::new(launcher), &logger)
        .with_mode(RunMode::Synchronous)
        .with_parameter_dir(dir.path());

    let table = OutputTable::shared();
    controller.run(inputs, &ManualSettings::default().build().unwrap(), Some(table.clone()), None).unwrap();

    assert_eq!(controller.summary(), Some(BatchSummary { regions: 1, completed: 1, failed: 0 }));
    assert_eq!(table.borrow().row_count(), 1);
    assert_eq!(table.borrow().cell_text(0, 3), Some("1.5"));
    assert_eq!(logger.count_level(log::Level::Error), 0);
}

#[test]
fn test_segmentation_batch_converts_segments() {
    let logger = Logger::capturing();
    let dir = tempfile::tempdir().unwrap();
    let seg_dir = dir.path().join("lesions");
    fs::create_dir(&seg_dir).unwrap();
    write_volume(&seg_dir.join("edema.nii.gz"), &[0, 0, 0, 0, 0, 0, 0, 0]);
    write_volume(&seg_dir.join("tumor.nii.gz"), &[0, 4, 4, 0, 0, 0, 0, 0]);

    let launcher = ScriptedLauncher::new(mean_of_label);
    let log = launcher.log();
    let mut controller = BatchController::new(Box::new(launcher), &logger)
        .with_mode(RunMode::Synchronous)
        .with_parameter_dir(dir.path());

    let inputs = BatchInputs::new(write_image(dir.path()))
        .with_segmentation(Segmentation::from_dir(&seg_dir).unwrap());
    let table = OutputTable::shared();
    controller.run(inputs, &ManualSettings::default().build().unwrap(), Some(table.clone()), None).unwrap();

    assert_eq!(log.started(), vec!["lesions_segment_tumor"]);
    assert_eq!(table.borrow().column_name(3), Some("lesions_segment_tumor"));
    assert_eq!(table.borrow().cell_text(0, 3), Some("1.5"));
    assert_eq!(controller.summary(), Some(BatchSummary { regions: 1, completed: 1, failed: 0 }));
}

#[test]
fn test_sync_and_async_batches_fill_the_same_table() {
    let logger = Logger::capturing();
    let dir = tempfile::tempdir().unwrap();
    let mask = dir.path().join("mask.nii.gz");
    fs::write(&mask, b"label volume").unwrap();

    let mut tables = Vec::new();
    for mode in [RunMode::Synchronous, RunMode::Asynchronous] {
        let data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![2.0, 0.0, 1.0, 2.0]).unwrap();
        let inputs = BatchInputs::new(ImageVolume::new("ct", Path::new("ct.nii.gz")))
            .with_label(LabelVolume::from_array("mask", &mask, data));

        let mut controller = BatchController::new(Box::new(ScriptedLauncher::new(mean_of_label)), &logger)
            .with_mode(mode)
            .with_layout(TableLayout::LongFormat)
            .with_parameter_dir(dir.path());
        let table = OutputTable::shared();
        controller.run(inputs, &ManualSettings::default().build().unwrap(), Some(table.clone()), None).unwrap();
        while controller.process_events() {}

        let table = table.borrow().clone();
        tables.push(table);
    }

    assert_eq!(tables[0], tables[1]);
    assert_eq!(tables[0].row_count(), 2);
    assert_eq!(tables[0].cell_text(1, 0), Some("mask_label_2"));
    assert_eq!(tables[0].cell_text(1, 4), Some("2.5"));
}

#[cfg(unix)]
#[test]
fn test_adapter_binary_translates_arguments() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_radiomics-cli"))
        .args(["ct.nii", "mask.nii", "--param", "params.json", "--label", "2"])
        .env("RADIOMICS_EXECUTABLE", "echo")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "ct.nii mask.nii --param params.json --setting=label:2 --format=csv --verbosity=4 --setting=correctMask:True\n"
    );
}

#[test]
fn test_adapter_binary_prints_descriptor() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_radiomics-cli"))
        .arg("--xml")
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("<executable>"));
    assert!(text.contains("RadiomicsCLI"));
}
