//! Extraction results
//!
//! The extractor prints a header row of compound feature keys and one row of
//! values. Keys look like `original_firstorder_Mean`.

use crate::errors::{RadiomicsError, RadiomicsResult};

/// Ordered flat mapping of compound key to text value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    entries: Vec<(String, String)>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        ExtractionResult::default()
    }

    /// Parse the extractor's CSV output
    ///
    /// # Arguments
    /// * `text` - Header row followed by a value row
    ///
    /// # Returns
    /// The result in header order, or an error for malformed CSV or a
    /// missing value row
    pub fn from_csv(text: &str) -> RadiomicsResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let values = match reader.records().next() {
            Some(record) => record?,
            None => return Err(RadiomicsError::ResultError("Extractor output has no value row".to_string())),
        };

        let entries = headers
            .iter()
            .enumerate()
            .map(|(i, key)| (key.trim().to_string(), values.get(i).unwrap_or("").to_string()))
            .collect();

        Ok(ExtractionResult { entries })
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keys the extractor always prints that are not features
pub const NON_FEATURE_KEYS: [&str; 2] = ["Image", "Mask"];

/// A compound feature key split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureKey {
    pub image_type: String,
    pub feature_class: String,
    /// Keeps any further underscores
    pub feature_name: String,
}

impl FeatureKey {
    /// Split a compound key, `None` when it has fewer than three parts
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, '_');
        let image_type = parts.next()?;
        let feature_class = parts.next()?;
        let feature_name = parts.next()?;

        Some(FeatureKey {
            image_type: image_type.to_string(),
            feature_class: feature_class.to_string(),
            feature_name: feature_name.to_string(),
        })
    }
}
