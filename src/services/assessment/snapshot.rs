use crate::models::WorkbookSnapshot;
use crate::services::excel::{utils::is_macro_enabled_name, WorkbookView};

impl WorkbookSnapshot {
    /// Reads workbook-level facts once; capability failures become capture errors.
    pub fn capture<W: WorkbookView + ?Sized>(view: &W) -> Self {
        let sheet_names = view.sheet_names();
        let visibility = sheet_names
            .iter()
            .map(|name| view.sheet_visibility(name))
            .collect();

        let mut capture_errors = Vec::new();
        let named_ranges = match view.named_range_count() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Named ranges analysis failed: {}", e);
                capture_errors.push(format!("Named ranges analysis failed: {}", e));
                0
            }
        };

        WorkbookSnapshot {
            file_name: view.file_name(),
            sheet_names,
            visibility,
            named_ranges,
            file_size_bytes: view.file_size_bytes(),
            has_macro_archive: view.has_macro_archive(),
            capture_errors,
        }
    }

    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("Unknown")
    }

    /// Macro presence signalled by the container: a VBA archive or a
    /// macro-enabled extension.
    pub fn signals_macros(&self) -> bool {
        self.has_macro_archive
            || self
                .file_name
                .as_deref()
                .is_some_and(is_macro_enabled_name)
    }
}
