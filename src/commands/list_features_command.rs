//! Feature catalogue listing
//!
//! Shows which feature classes can be enabled, which are enabled by default
//! and which image types the extractor can compute features on.

use crate::commands::command_traits::Command;
use crate::errors::RadiomicsResult;
use crate::settings::FeatureCatalogue;
use crate::utils::logger::Logger;

/// Prints the feature class catalogue
pub struct ListFeaturesCommand<'a> {
    logger: &'a Logger,
}

impl<'a> ListFeaturesCommand<'a> {
    pub fn new(logger: &'a Logger) -> Self {
        ListFeaturesCommand { logger }
    }

    /// Render the catalogue as printed by `execute`
    pub fn render(catalogue: &FeatureCatalogue) -> String {
        let mut out = String::from("Feature classes:\n");
        for class in catalogue.class_names() {
            let marker = if catalogue.default_classes.iter().any(|c| c == class) { " (default)" } else { "" };
            let features = catalogue.features_of(class);
            out.push_str(&format!("  {}{} - {} features\n", class, marker, features.len()));
            out.push_str(&format!("    {}\n", features.join(", ")));
        }

        out.push_str("Image types:\n");
        for (name, description) in &catalogue.image_types {
            out.push_str(&format!("  {} - {}\n", name, description));
        }
        out
    }
}

impl<'a> Command for ListFeaturesCommand<'a> {
    fn execute(&self) -> RadiomicsResult<()> {
        let catalogue = FeatureCatalogue::global();
        self.logger.debug(&format!("Listing {} feature classes", catalogue.class_names().len()));
        print!("{}", Self::render(catalogue));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_default_classes() {
        let text = ListFeaturesCommand::render(FeatureCatalogue::global());
        assert!(text.contains("  firstorder (default) - "));
        assert!(text.contains("  glcm - "));
        assert!(text.contains("Image types:\n"));
        assert!(text.contains("  Original - "));
    }
}
