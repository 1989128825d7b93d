//! Result table accumulator
//!
//! Merges the result of every region of a batch into one output table. A
//! feature key gets its row the first time any region reports it and keeps
//! that row for the rest of the batch.

use std::collections::HashMap;
use std::fmt;

use crate::table::output_table::SharedTable;
use crate::table::result::{ExtractionResult, FeatureKey, NON_FEATURE_KEYS};
use crate::utils::logger::Logger;

const KEY_COLUMNS: [&str; 3] = ["Image type", "Feature Class", "Feature Name"];
const LABEL_COLUMN: &str = "Label";
const VALUE_COLUMN: &str = "Value";

/// Shape of the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// One row per feature, one column per region
    PerRegionColumns,
    /// One row per region and feature with a single value column
    LongFormat,
}

impl TableLayout {
    /// Parse a layout name as given on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "columns" | "wide" | "per-region" => Some(TableLayout::PerRegionColumns),
            "long" | "rows" => Some(TableLayout::LongFormat),
            _ => None,
        }
    }

    /// Header columns written by `init`
    pub fn header(&self) -> Vec<&'static str> {
        match self {
            TableLayout::PerRegionColumns => KEY_COLUMNS.to_vec(),
            TableLayout::LongFormat => {
                let mut header = vec![LABEL_COLUMN];
                header.extend_from_slice(&KEY_COLUMNS);
                header.push(VALUE_COLUMN);
                header
            }
        }
    }
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableLayout::PerRegionColumns => write!(f, "columns"),
            TableLayout::LongFormat => write!(f, "long"),
        }
    }
}

/// Row lookup key, the region is only part of it in long format
type RowKey = (String, String);

/// Writes region results into a shared table
pub struct ResultAccumulator<'a> {
    table: Option<SharedTable>,
    layout: TableLayout,
    feature_rows: HashMap<RowKey, usize>,
    logger: &'a Logger,
}

impl<'a> ResultAccumulator<'a> {
    /// Create an accumulator
    ///
    /// # Arguments
    /// * `table` - Table to fill, `None` turns every merge into a warning
    /// * `layout` - Shape of the table
    /// * `logger` - Logger for warnings
    pub fn new(table: Option<SharedTable>, layout: TableLayout, logger: &'a Logger) -> Self {
        ResultAccumulator {
            table,
            layout,
            feature_rows: HashMap::new(),
            logger,
        }
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Clear the table and write the header
    pub fn init(&mut self) {
        self.feature_rows.clear();

        let table = match self.table.as_ref() {
            Some(table) => table,
            None => {
                self.logger.warn("Output table not set!");
                return;
            }
        };

        self.logger.info("Initializing output table");
        let mut table = table.borrow_mut();
        table.remove_all();
        for name in self.layout.header() {
            table.add_column(name);
        }
    }

    /// Merge the result of one region
    ///
    /// # Arguments
    /// * `region_id` - Region the result belongs to
    /// * `result` - Values reported by the extractor
    ///
    /// # Returns
    /// Number of feature values written
    pub fn merge(&mut self, region_id: &str, result: &ExtractionResult) -> usize {
        let table = match self.table.as_ref() {
            Some(table) => table.clone(),
            None => {
                self.logger.warn("Output table not set!");
                return 0;
            }
        };
        let mut table = table.borrow_mut();

        self.logger.debug(&format!("Processing results of {}", region_id));

        let value_column = match self.layout {
            TableLayout::PerRegionColumns => table.add_column(region_id),
            TableLayout::LongFormat => KEY_COLUMNS.len() + 1,
        };

        let mut written = 0;
        for (key, value) in result.iter() {
            let feature = match FeatureKey::parse(key) {
                Some(feature) => feature,
                None => {
                    if !NON_FEATURE_KEYS.contains(&key) {
                        self.logger.warn(&format!("Skipping key {}", key));
                    }
                    continue;
                }
            };

            let row_key = match self.layout {
                TableLayout::PerRegionColumns => (String::new(), key.to_string()),
                TableLayout::LongFormat => (region_id.to_string(), key.to_string()),
            };

            let row = match self.feature_rows.get(&row_key) {
                Some(&row) => row,
                None => {
                    self.logger.debug(&format!("Adding feature key {}", key));
                    let row = table.add_empty_row();
                    let offset = match self.layout {
                        TableLayout::PerRegionColumns => 0,
                        TableLayout::LongFormat => {
                            table.set_cell_text(row, 0, region_id);
                            1
                        }
                    };
                    table.set_cell_text(row, offset, &feature.image_type);
                    table.set_cell_text(row, offset + 1, &feature.feature_class);
                    table.set_cell_text(row, offset + 2, &feature.feature_name);
                    self.feature_rows.insert(row_key, row);
                    row
                }
            };

            table.set_cell_text(row, value_column, value);
            written += 1;
        }

        written
    }

    /// Row of a feature key, looked up for `region_id` in long format
    pub fn row_index(&self, region_id: &str, key: &str) -> Option<usize> {
        let row_key = match self.layout {
            TableLayout::PerRegionColumns => (String::new(), key.to_string()),
            TableLayout::LongFormat => (region_id.to_string(), key.to_string()),
        };
        self.feature_rows.get(&row_key).copied()
    }

    /// Number of rows created in this batch
    pub fn feature_row_count(&self) -> usize {
        self.feature_rows.len()
    }

    /// Forget the row map of the batch
    pub fn reset(&mut self) {
        self.feature_rows.clear();
    }
}
