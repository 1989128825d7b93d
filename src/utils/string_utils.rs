//! String utility functions
//!
//! Utilities for parsing the comma separated numeric lists typed into the
//! customization options and for cleaning up text produced by the extractor.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{RadiomicsError, RadiomicsResult};

lazy_static! {
    static ref FLOAT_ITEM: Regex =
        Regex::new(r"^[-+]?(\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?$").expect("valid float regex");
}

/// Parse a comma separated list of floating point numbers
///
/// Whitespace around items is ignored. Empty items (e.g. `"1,,3"`) and
/// anything that is not a plain decimal number are rejected.
///
/// # Arguments
/// * `text` - The list as typed by the user
/// * `what` - Name of the option, used in the error message
///
/// # Returns
/// The parsed values or a configuration error
pub fn parse_float_list(text: &str, what: &str) -> RadiomicsResult<Vec<f64>> {
    text.split(',')
        .map(|item| {
            let item = item.trim();
            if !FLOAT_ITEM.is_match(item) {
                return Err(RadiomicsError::ConfigError(format!(
                    "Failed to parse {} from string \"{}\"", what, text
                )));
            }
            item.parse::<f64>().map_err(|_| {
                RadiomicsError::ConfigError(format!("Failed to parse {} from string \"{}\"", what, text))
            })
        })
        .collect()
}

/// Remove a leading boilerplate prefix from a text, if present
pub fn strip_prefix_once<'a>(text: &'a str, prefix: &str) -> &'a str {
    text.strip_prefix(prefix).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_list_accepts_spacing() {
        let values = parse_float_list("1, 1.5,2e0", "resampled voxel spacing").unwrap();
        assert_eq!(values, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_parse_float_list_rejects_empty_item() {
        let result = parse_float_list("1,,3", "resampled voxel spacing");
        assert!(matches!(result, Err(RadiomicsError::ConfigError(_))));
    }

    #[test]
    fn test_parse_float_list_rejects_words() {
        assert!(parse_float_list("1,two,3", "LoG sigma").is_err());
        assert!(parse_float_list("", "LoG sigma").is_err());
    }

    #[test]
    fn test_strip_prefix_once() {
        assert_eq!(strip_prefix_once("ab: x", "ab: "), "x");
        assert_eq!(strip_prefix_once("x", "ab: "), "x");
    }
}
