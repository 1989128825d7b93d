//! Feature class catalogue
//!
//! Feature classes, their feature names and the image types understood by the
//! extractor. The definitions live in `feature_classes.toml` and are parsed
//! once on first use.

use std::collections::BTreeMap;
use lazy_static::lazy_static;

use crate::errors::{RadiomicsError, RadiomicsResult};

lazy_static! {
    // Parse the TOML file at startup
    static ref FEATURE_CATALOGUE: FeatureCatalogue = {
        let content = include_str!("../../feature_classes.toml");
        FeatureCatalogue::from_str(content).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse feature class definitions: {}", e);
            FeatureCatalogue::default()
        })
    };
}

/// Container for the feature class and image type definitions
#[derive(Debug, Default)]
pub struct FeatureCatalogue {
    // Maps feature class names to their feature names
    pub feature_classes: BTreeMap<String, Vec<String>>,
    // Feature classes enabled when the user does not choose
    pub default_classes: Vec<String>,
    // Maps image type names to a short description
    pub image_types: BTreeMap<String, String>,
}

impl FeatureCatalogue {
    /// Parse the catalogue from a TOML string
    pub fn from_str(content: &str) -> RadiomicsResult<Self> {
        let toml_value: toml::Value = match content.parse() {
            Ok(value) => value,
            Err(e) => return Err(RadiomicsError::GenericError(format!("Failed to parse TOML: {}", e))),
        };

        let mut catalogue = FeatureCatalogue::default();

        if let Some(table) = toml_value.get("feature_classes").and_then(|v| v.as_table()) {
            for (class, names) in table {
                let names = names
                    .as_array()
                    .map(|a| a.iter().filter_map(|n| n.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                catalogue.feature_classes.insert(class.clone(), names);
            }
        }

        if let Some(table) = toml_value.get("image_types").and_then(|v| v.as_table()) {
            for (name, description) in table {
                if let Some(description) = description.as_str() {
                    catalogue.image_types.insert(name.clone(), description.to_string());
                }
            }
        }

        if let Some(defaults) = toml_value.get("default_feature_classes").and_then(|v| v.as_array()) {
            catalogue.default_classes = defaults
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
        }

        Ok(catalogue)
    }

    /// Get the shared catalogue
    pub fn global() -> &'static FeatureCatalogue {
        &FEATURE_CATALOGUE
    }

    /// All feature class names in alphabetical order
    pub fn class_names(&self) -> Vec<&str> {
        self.feature_classes.keys().map(String::as_str).collect()
    }

    /// Whether the extractor knows this feature class
    pub fn has_class(&self, class: &str) -> bool {
        self.feature_classes.contains_key(class)
    }

    /// Feature names of a class, empty for unknown classes
    pub fn features_of(&self, class: &str) -> &[String] {
        self.feature_classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the extractor knows this image type
    pub fn has_image_type(&self, image_type: &str) -> bool {
        self.image_types.contains_key(image_type)
    }
}
