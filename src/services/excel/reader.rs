use std::io::{Cursor, Read, Seek};
use std::path::Path;

use bytes::Bytes;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, SheetVisible, Sheets};

use super::memory::{InMemorySheet, InMemoryWorkbook};
use super::types::{SheetVisibility, FORMULA_MARKER};
use crate::error::AppError;

/// Decodes a workbook on disk into an in-memory view.
pub fn open_workbook(path: &Path) -> Result<InMemoryWorkbook, AppError> {
    let start = std::time::Instant::now();
    let size = std::fs::metadata(path)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::info!("Opening workbook {}", file_name);
    let workbook = open_workbook_auto(path).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::WorkbookOpen(e.to_string())
    })?;

    let decoded = decode(workbook, file_name, size)?;
    tracing::info!("Workbook decoded in {:?}", start.elapsed());
    Ok(decoded)
}

/// Decodes workbook bytes received over the wire.
pub fn read_workbook_bytes(file_name: &str, file_data: Bytes) -> Result<InMemoryWorkbook, AppError> {
    let size = file_data.len() as u64;
    let cursor = Cursor::new(file_data);
    let workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::WorkbookOpen(e.to_string())
    })?;
    decode(workbook, file_name.to_string(), size)
}

fn decode<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    file_name: String,
    file_size: u64,
) -> Result<InMemoryWorkbook, AppError> {
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);
    if sheet_names.is_empty() {
        return Err(AppError::EmptyWorkbook);
    }

    let visibility: Vec<(String, SheetVisibility)> = workbook
        .sheets_metadata()
        .iter()
        .map(|sheet| (sheet.name.clone(), map_visibility(sheet.visible)))
        .collect();
    let named_ranges = workbook.defined_names().len();
    let macro_archive = matches!(workbook.vba_project(), Some(Ok(_)));

    // Merged regions and tables are only exposed by the xlsx decoder.
    let xlsx_extras = match &mut workbook {
        Sheets::Xlsx(xlsx) => {
            let merged = match xlsx.load_merged_regions() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to load merged regions: {}", e);
                    false
                }
            };
            let tables = match xlsx.load_tables() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to load tables: {}", e);
                    false
                }
            };
            (merged, tables)
        }
        _ => (false, false),
    };

    let mut decoded = InMemoryWorkbook::new(file_name)
        .with_file_size(file_size)
        .with_named_ranges(named_ranges)
        .with_macro_archive(macro_archive);

    for name in &sheet_names {
        let sheet_visibility = visibility
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .unwrap_or_default();
        let mut sheet = match read_sheet(&mut workbook, name) {
            Ok(sheet) => sheet,
            Err(reason) => {
                tracing::warn!("Failed to read worksheet {}: {}", name, reason);
                InMemorySheet::new(name.clone()).unreadable(reason)
            }
        };
        sheet = sheet.visibility(sheet_visibility);

        if let Sheets::Xlsx(xlsx) = &workbook {
            if xlsx_extras.0 {
                sheet = sheet.merged_ranges(xlsx.merged_regions_by_sheet(name).len());
            }
            if xlsx_extras.1 {
                sheet = sheet.table(!xlsx.table_names_in_sheet(name).is_empty());
            }
        }
        decoded.push_sheet(sheet);
    }

    Ok(decoded)
}

fn read_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>, name: &str) -> Result<InMemorySheet, String> {
    let values = workbook.worksheet_range(name).map_err(|e| e.to_string())?;
    let mut sheet = InMemorySheet::new(name);
    let mut extent = (0usize, 0usize);

    if let Some((row0, col0)) = values.start() {
        for (row, col, value) in values.cells() {
            let (row, col) = (row0 as usize + row, col0 as usize + col);
            if let Some(text) = cell_text(value) {
                sheet.set_cell(row, col, text);
            }
        }
    }
    if let Some((row, col)) = values.end() {
        extent = (row as usize + 1, col as usize + 1);
    }

    // Formula text overrides the cached value of the same cell.
    match workbook.worksheet_formula(name) {
        Ok(formulas) => {
            if let Some((row0, col0)) = formulas.start() {
                for (row, col, formula) in formulas.cells() {
                    if formula.is_empty() {
                        continue;
                    }
                    let (row, col) = (row0 as usize + row, col0 as usize + col);
                    sheet.set_cell(row, col, format!("{}{}", FORMULA_MARKER, formula));
                }
            }
            if let Some((row, col)) = formulas.end() {
                extent = (extent.0.max(row as usize + 1), extent.1.max(col as usize + 1));
            }
        }
        Err(e) => tracing::debug!("No formulas read from {}: {}", name, e),
    }

    Ok(sheet.dimensions(extent.0, extent.1))
}

fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn map_visibility(visible: SheetVisible) -> SheetVisibility {
    match visible {
        SheetVisible::Visible => SheetVisibility::Visible,
        SheetVisible::Hidden => SheetVisibility::Hidden,
        SheetVisible::VeryHidden => SheetVisibility::VeryHidden,
    }
}
