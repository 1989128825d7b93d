//! Extraction parameter files
//!
//! The extractor is customized through a parameter file holding three
//! sections: `setting`, `featureClass` and `imageType`. Files supplied by the
//! user may be JSON or YAML; manual settings are written to a generated JSON
//! file so both entry points share the same downstream path.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::utils::logger::Logger;

/// Options of one image type (e.g. `{"sigma": [1.0, 2.0]}` for LoG)
pub type ImageTypeOptions = BTreeMap<String, Value>;

/// The `setting` section of a parameter file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Width of the intensity bins used for discretization
    #[serde(rename = "binWidth", default, skip_serializing_if = "Option::is_none")]
    pub bin_width: Option<f64>,
    /// Whether the GLCM is made symmetrical
    #[serde(rename = "symmetricalGLCM", default, skip_serializing_if = "Option::is_none")]
    pub symmetrical_glcm: Option<bool>,
    /// Voxel spacing (mm) the image and mask are resampled to
    #[serde(rename = "resampledPixelSpacing", default, skip_serializing_if = "Option::is_none")]
    pub resampled_pixel_spacing: Option<Vec<f64>>,
    /// Label value of the region of interest in the mask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u32>,
    /// Resample the mask onto the image grid when geometries differ slightly
    #[serde(rename = "correctMask", default, skip_serializing_if = "Option::is_none")]
    pub correct_mask: Option<bool>,
    /// Any other setting, passed through untouched
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Complete extractor customization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionParams {
    #[serde(default)]
    pub setting: ExtractionSettings,
    /// Enabled feature classes; `None` enables every feature of the class
    #[serde(rename = "featureClass", default)]
    pub feature_class: BTreeMap<String, Option<Vec<String>>>,
    /// Enabled image types with their filter options
    #[serde(rename = "imageType", default)]
    pub image_type: BTreeMap<String, ImageTypeOptions>,
}

impl ExtractionParams {
    /// Load parameters from a JSON or YAML file, chosen by extension
    ///
    /// # Arguments
    /// * `path` - Path of the parameter file
    ///
    /// # Returns
    /// The validated parameters or an error
    pub fn from_file(path: &Path) -> RadiomicsResult<Self> {
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("")
            .to_lowercase();

        let file = File::open(path).map_err(|e| {
            RadiomicsError::ParameterFileError(format!("Cannot open {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let params: ExtractionParams = match extension.as_str() {
            "json" => serde_json::from_reader(reader)?,
            "yaml" | "yml" => serde_yaml::from_reader(reader)?,
            _ => {
                return Err(RadiomicsError::ParameterFileError(format!(
                    "Unsupported parameter file format: {}", path.display()
                )))
            }
        };

        params.validate()?;
        Ok(params)
    }

    /// Check the values the extractor requires to be well-formed
    pub fn validate(&self) -> RadiomicsResult<()> {
        if let Some(bin_width) = self.setting.bin_width {
            if !(bin_width > 0.0) {
                return Err(RadiomicsError::ConfigError(format!("Bin width must be positive, got {}", bin_width)));
            }
        }

        if let Some(spacing) = &self.setting.resampled_pixel_spacing {
            if spacing.len() != 3 || spacing.iter().any(|s| !(*s > 0.0)) {
                return Err(RadiomicsError::ConfigError(format!(
                    "Resampled voxel spacing needs three positive values, got {:?}", spacing
                )));
            }
        }

        Ok(())
    }

    /// Serialize the parameters as JSON
    pub fn to_json(&self) -> RadiomicsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parameter file used by one batch, remembering who owns it
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterFile {
    /// Written by the batch from manual settings, deleted at cleanup
    Generated(PathBuf),
    /// Provided by the caller, never deleted
    Supplied(PathBuf),
}

impl ParameterFile {
    /// Write manual parameters to a fresh temporary JSON file
    ///
    /// # Arguments
    /// * `params` - Parameters to write
    /// * `dir` - Directory receiving the file
    pub fn generate(params: &ExtractionParams, dir: &Path) -> RadiomicsResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("RadiomicsLogicParams")
            .suffix(".json")
            .tempfile_in(dir)?;
        serde_json::to_writer_pretty(file.as_file(), params)?;
        let (_, path) = file.keep().map_err(|e| RadiomicsError::IoError(e.error))?;
        Ok(ParameterFile::Generated(path))
    }

    /// Use a caller supplied parameter file after checking it parses
    pub fn supplied(path: &Path) -> RadiomicsResult<Self> {
        if !path.is_file() {
            return Err(RadiomicsError::ParameterFileError(format!(
                "Parameter file not found: {}", path.display()
            )));
        }
        ExtractionParams::from_file(path)?;
        Ok(ParameterFile::Supplied(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            ParameterFile::Generated(path) | ParameterFile::Supplied(path) => path,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ParameterFile::Generated(_))
    }

    /// Delete the file if the batch created it
    pub fn release(self, logger: &Logger) {
        if let ParameterFile::Generated(path) = self {
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    logger.warn(&format!("Failed to delete parameter file {}: {}", path.display(), e));
                } else {
                    logger.debug(&format!("Deleted parameter file {}", path.display()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_params() -> ExtractionParams {
        let mut params = ExtractionParams::default();
        params.setting.bin_width = Some(25.0);
        params.setting.symmetrical_glcm = Some(false);
        params.setting.correct_mask = Some(true);
        params.feature_class.insert("firstorder".to_string(), None);
        params.image_type.insert("Original".to_string(), ImageTypeOptions::new());
        params
    }

    #[test]
    fn test_json_uses_extractor_key_names() {
        let json = sample_params().to_json().unwrap();
        assert!(json.contains("\"binWidth\": 25.0"));
        assert!(json.contains("\"symmetricalGLCM\": false"));
        assert!(json.contains("\"featureClass\""));
        assert!(json.contains("\"firstorder\": null"));
        assert!(!json.contains("resampledPixelSpacing"));
    }

    #[test]
    fn test_yaml_parameter_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "setting:\n  binWidth: 10\n  interpolator: sitkBSpline\nfeatureClass:\n  glcm:\n    - Contrast\nimageType:\n  LoG:\n    sigma: [1.0, 3.0]").unwrap();

        let params = ExtractionParams::from_file(&path).unwrap();
        assert_eq!(params.setting.bin_width, Some(10.0));
        assert_eq!(params.setting.other.get("interpolator"), Some(&Value::from("sitkBSpline")));
        assert_eq!(params.feature_class.get("glcm"), Some(&Some(vec!["Contrast".to_string()])));
        assert!(params.image_type.contains_key("LoG"));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.txt");
        File::create(&path).unwrap();
        assert!(matches!(
            ExtractionParams::from_file(&path),
            Err(RadiomicsError::ParameterFileError(_))
        ));
    }

    #[test]
    fn test_generated_file_is_deleted_on_release() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::capturing();
        let file = ParameterFile::generate(&sample_params(), dir.path()).unwrap();
        let path = file.path().to_path_buf();
        assert!(path.is_file());
        assert_eq!(ExtractionParams::from_file(&path).unwrap(), sample_params());

        file.release(&logger);
        assert!(!path.exists());
    }

    #[test]
    fn test_supplied_file_is_kept_on_release() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::capturing();
        let path = dir.path().join("mine.json");
        fs::write(&path, "{\"setting\": {\"binWidth\": 5}}").unwrap();

        let file = ParameterFile::supplied(&path).unwrap();
        assert!(!file.is_generated());
        file.release(&logger);
        assert!(path.is_file());
    }

    #[test]
    fn test_invalid_spacing_fails_validation() {
        let mut params = sample_params();
        params.setting.resampled_pixel_spacing = Some(vec![1.0, 1.0]);
        assert!(params.validate().is_err());
    }
}
