//! Output table and result merging

mod accumulator;
mod output_table;
mod result;

pub use accumulator::{ResultAccumulator, TableLayout};
pub use output_table::{OutputTable, SharedTable};
pub use result::{ExtractionResult, FeatureKey, NON_FEATURE_KEYS};
