use std::collections::{BTreeMap, BTreeSet};

use super::types::{SheetVisibility, ViewError, WorkbookView};

/// A fully decoded workbook held in memory.
///
/// The calamine reader produces one of these, and tests build them directly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    file_name: Option<String>,
    file_size: u64,
    named_ranges: usize,
    macro_archive: bool,
    sheets: Vec<InMemorySheet>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySheet {
    name: String,
    visibility: SheetVisibility,
    cells: BTreeMap<(usize, usize), String>,
    validated: BTreeSet<(usize, usize)>,
    dimensions: Option<(usize, usize)>,
    merged_ranges: usize,
    protected: bool,
    has_table: bool,
    read_error: Option<String>,
}

impl InMemoryWorkbook {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = bytes;
        self
    }

    pub fn with_named_ranges(mut self, count: usize) -> Self {
        self.named_ranges = count;
        self
    }

    pub fn with_macro_archive(mut self, present: bool) -> Self {
        self.macro_archive = present;
        self
    }

    pub fn with_sheet(mut self, sheet: InMemorySheet) -> Self {
        self.push_sheet(sheet);
        self
    }

    /// Adds a sheet, replacing any existing sheet with the same name.
    pub fn push_sheet(&mut self, sheet: InMemorySheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet(&self, name: &str) -> Result<&InMemorySheet, ViewError> {
        let sheet = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ViewError::SheetNotFound(name.to_string()))?;
        match &sheet.read_error {
            Some(reason) => Err(ViewError::UnreadableSheet {
                sheet: name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(sheet),
        }
    }
}

impl InMemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(mut self, visibility: SheetVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn cell(mut self, row: usize, col: usize, text: impl Into<String>) -> Self {
        self.set_cell(row, col, text);
        self
    }

    /// Fills a row left to right starting at column 0.
    pub fn row<S: AsRef<str>>(mut self, row: usize, values: &[S]) -> Self {
        for (col, value) in values.iter().enumerate() {
            self.set_cell(row, col, value.as_ref());
        }
        self
    }

    pub fn set_cell(&mut self, row: usize, col: usize, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), text);
        }
    }

    /// Overrides the extent computed from populated cells.
    pub fn dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.dimensions = Some((rows, cols));
        self
    }

    pub fn validation(mut self, row: usize, col: usize) -> Self {
        self.validated.insert((row, col));
        self
    }

    pub fn merged_ranges(mut self, count: usize) -> Self {
        self.merged_ranges = count;
        self
    }

    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    pub fn table(mut self, present: bool) -> Self {
        self.has_table = present;
        self
    }

    /// Marks the sheet as undecodable; every per-sheet read then fails.
    pub fn unreadable(mut self, reason: impl Into<String>) -> Self {
        self.read_error = Some(reason.into());
        self
    }

    fn extent(&self) -> (usize, usize) {
        if let Some(dims) = self.dimensions {
            return dims;
        }
        self.cells
            .keys()
            .fold((0, 0), |(rows, cols), &(r, c)| (rows.max(r + 1), cols.max(c + 1)))
    }
}

impl WorkbookView for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn sheet_visibility(&self, name: &str) -> SheetVisibility {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.visibility)
            .unwrap_or_default()
    }

    fn sheet_dimensions(&self, name: &str) -> Result<(usize, usize), ViewError> {
        Ok(self.sheet(name)?.extent())
    }

    fn cell_value(&self, name: &str, row: usize, col: usize) -> Result<Option<String>, ViewError> {
        Ok(self.sheet(name)?.cells.get(&(row, col)).cloned())
    }

    fn merged_range_count(&self, name: &str) -> Result<usize, ViewError> {
        Ok(self.sheet(name)?.merged_ranges)
    }

    fn is_protected(&self, name: &str) -> Result<bool, ViewError> {
        Ok(self.sheet(name)?.protected)
    }

    fn has_table(&self, name: &str) -> Result<bool, ViewError> {
        Ok(self.sheet(name)?.has_table)
    }

    fn has_validation(&self, name: &str, row: usize, col: usize) -> bool {
        self.sheet(name)
            .map(|s| s.validated.contains(&(row, col)))
            .unwrap_or(false)
    }

    fn named_range_count(&self) -> Result<usize, ViewError> {
        Ok(self.named_ranges)
    }

    fn has_macro_archive(&self) -> bool {
        self.macro_archive
    }

    fn file_size_bytes(&self) -> u64 {
        self.file_size
    }

    fn file_name(&self) -> Option<String> {
        self.file_name.clone()
    }
}
