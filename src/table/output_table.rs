//! In-memory output table
//!
//! Ordered named columns over rows of text cells. Rows are padded so every
//! row always has one cell per column.

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use crate::errors::RadiomicsResult;

/// Table shared between a batch and its caller
pub type SharedTable = Rc<RefCell<OutputTable>>;

/// Ordered columns and rows of text cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl OutputTable {
    pub fn new() -> Self {
        OutputTable::default()
    }

    /// Create an empty table ready to be shared with a batch
    pub fn shared() -> SharedTable {
        Rc::new(RefCell::new(OutputTable::new()))
    }

    /// Remove every column and row
    pub fn remove_all(&mut self) {
        self.columns.clear();
        self.rows.clear();
    }

    /// Append a column, returning its index
    pub fn add_column(&mut self, name: &str) -> usize {
        self.columns.push(name.to_string());
        for row in self.rows.iter_mut() {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Append a row of empty cells, returning its index
    pub fn add_empty_row(&mut self) -> usize {
        self.rows.push(vec![String::new(); self.columns.len()]);
        self.rows.len() - 1
    }

    /// Set a cell, ignoring positions outside the table
    ///
    /// # Returns
    /// Whether the cell exists
    pub fn set_cell_text(&mut self, row: usize, column: usize, text: &str) -> bool {
        match self.rows.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            Some(cell) => {
                *cell = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn cell_text(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|cells| cells.get(column)).map(|s| s.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.columns.get(column).map(|s| s.as_str())
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Index of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Write the table as CSV, header first
    ///
    /// # Arguments
    /// * `writer` - Destination of the CSV text
    pub fn write_csv<W: Write>(&self, writer: W) -> RadiomicsResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as a CSV file
    pub fn save_csv(&self, path: &Path) -> RadiomicsResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Render the table as CSV text
    pub fn to_csv_string(&self) -> RadiomicsResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_to_columns() {
        let mut table = OutputTable::new();
        table.add_column("Feature Name");
        let row = table.add_empty_row();
        table.set_cell_text(row, 0, "Mean");

        let column = table.add_column("ct_label_1");
        assert_eq!(table.cell_text(row, column), Some(""));
        assert!(table.set_cell_text(row, column, "42.0"));
        assert!(!table.set_cell_text(5, 0, "nope"));
    }

    #[test]
    fn test_remove_all_clears_everything() {
        let mut table = OutputTable::new();
        table.add_column("a");
        table.add_empty_row();
        table.remove_all();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_csv_output() {
        let mut table = OutputTable::new();
        table.add_column("Feature Name");
        table.add_column("ct_label_1");
        let row = table.add_empty_row();
        table.set_cell_text(row, 0, "Mean");
        table.set_cell_text(row, 1, "1,5");

        let text = table.to_csv_string().unwrap();
        assert_eq!(text, "Feature Name,ct_label_1\nMean,\"1,5\"\n");
    }
}
