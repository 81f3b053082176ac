use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leading character that marks a cell's raw text as a formula.
pub const FORMULA_MARKER: char = '=';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// A capability of the decoded workbook could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),
    #[error("sheet '{sheet}' could not be read: {reason}")]
    UnreadableSheet { sheet: String, reason: String },
    #[error("cell {row},{col} could not be read: {reason}")]
    UnreadableCell { row: usize, col: usize, reason: String },
    #[error("{capability} unavailable: {reason}")]
    Unavailable { capability: &'static str, reason: String },
}

/// Read-only access to a decoded workbook.
///
/// Rows and columns are zero-based. Capabilities a decoder cannot supply fall
/// back to the defaults below instead of being probed for.
pub trait WorkbookView {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_visibility(&self, _name: &str) -> SheetVisibility {
        SheetVisibility::Visible
    }

    /// Extent of the sheet as `(rows, cols)`, counted from the first cell.
    fn sheet_dimensions(&self, name: &str) -> Result<(usize, usize), ViewError>;

    /// Raw text of a cell; formulas keep their leading marker.
    fn cell_value(&self, name: &str, row: usize, col: usize) -> Result<Option<String>, ViewError>;

    fn is_formula(&self, text: &str) -> bool {
        text.starts_with(FORMULA_MARKER)
    }

    fn merged_range_count(&self, _name: &str) -> Result<usize, ViewError> {
        Ok(0)
    }

    fn is_protected(&self, _name: &str) -> Result<bool, ViewError> {
        Ok(false)
    }

    fn has_table(&self, _name: &str) -> Result<bool, ViewError> {
        Ok(false)
    }

    /// Whether the cell carries data-validation metadata.
    fn has_validation(&self, _name: &str, _row: usize, _col: usize) -> bool {
        false
    }

    fn named_range_count(&self) -> Result<usize, ViewError> {
        Ok(0)
    }

    fn has_macro_archive(&self) -> bool {
        false
    }

    fn file_size_bytes(&self) -> u64;

    fn file_name(&self) -> Option<String> {
        None
    }
}
