//! Manual customization
//!
//! Settings picked one by one instead of through a parameter file. Values are
//! kept as the user typed them and only parsed by [`ManualSettings::build`],
//! so a malformed list aborts before any extraction starts.

use serde_json::Value;

use crate::errors::{RadiomicsError, RadiomicsResult};
use crate::settings::catalogue::FeatureCatalogue;
use crate::settings::params::{ExtractionParams, ImageTypeOptions};
use crate::utils::string_utils::parse_float_list;

/// Default bin width
pub const DEFAULT_BIN_WIDTH: f64 = 25.0;

/// Manual customization as entered by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ManualSettings {
    /// Enabled feature classes
    pub feature_classes: Vec<String>,
    /// Bin width, must be positive
    pub bin_width: f64,
    /// Enforce a symmetrical GLCM
    pub symmetrical_glcm: bool,
    /// Resampled voxel size, three comma separated values in mm
    pub resampled_spacing: Option<String>,
    /// LoG kernel sizes, comma separated sigmas in mm
    pub log_sigma: Option<String>,
    /// Calculate features on wavelet decompositions too
    pub wavelet: bool,
}

impl Default for ManualSettings {
    fn default() -> Self {
        ManualSettings {
            feature_classes: FeatureCatalogue::global().default_classes.clone(),
            bin_width: DEFAULT_BIN_WIDTH,
            symmetrical_glcm: true,
            resampled_spacing: None,
            log_sigma: None,
            wavelet: false,
        }
    }
}

impl ManualSettings {
    /// Enable every feature class of the catalogue
    pub fn enable_all_classes(&mut self) {
        self.feature_classes = FeatureCatalogue::global()
            .class_names()
            .into_iter()
            .map(str::to_string)
            .collect();
    }

    /// Disable every feature class
    pub fn disable_all_classes(&mut self) {
        self.feature_classes.clear();
    }

    /// Turn the manual settings into extractor parameters
    ///
    /// Mask correction is always enabled. Empty option strings are treated
    /// as not set.
    ///
    /// # Returns
    /// Parameters ready to be written to a parameter file, or a configuration
    /// error describing the first invalid value
    pub fn build(&self) -> RadiomicsResult<ExtractionParams> {
        let catalogue = FeatureCatalogue::global();
        let mut params = ExtractionParams::default();

        for class in &self.feature_classes {
            if !catalogue.has_class(class) {
                return Err(RadiomicsError::ConfigError(format!("Unknown feature class: {}", class)));
            }
            params.feature_class.insert(class.clone(), None);
        }

        params.setting.bin_width = Some(self.bin_width);
        params.setting.symmetrical_glcm = Some(self.symmetrical_glcm);
        params.setting.correct_mask = Some(true);

        params.image_type.insert("Original".to_string(), ImageTypeOptions::new());

        if let Some(sigma) = non_empty(&self.log_sigma) {
            let sigmas = parse_float_list(sigma, "LoG sigma value")?;
            let mut options = ImageTypeOptions::new();
            options.insert("sigma".to_string(), Value::from(sigmas));
            params.image_type.insert("LoG".to_string(), options);
        }

        if let Some(spacing) = non_empty(&self.resampled_spacing) {
            params.setting.resampled_pixel_spacing =
                Some(parse_float_list(spacing, "resampled voxel spacing")?);
        }

        if self.wavelet {
            params.image_type.insert("Wavelet".to_string(), ImageTypeOptions::new());
        }

        params.validate()?;
        Ok(params)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
