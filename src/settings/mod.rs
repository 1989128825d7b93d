//! Extraction customization
//!
//! This module holds the feature class catalogue, the manual settings form
//! and the parameter file model shared by both customization paths.

pub mod catalogue;
pub mod manual;
pub mod params;

pub use catalogue::FeatureCatalogue;
pub use manual::ManualSettings;
pub use params::{ExtractionParams, ExtractionSettings, ImageTypeOptions, ParameterFile};
