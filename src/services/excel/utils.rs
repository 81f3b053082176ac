use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".xlsx", ".xlsm", ".xls"];

/// Keeps at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn is_supported_extension(file_name: &str) -> bool {
    let ext = extension_of(file_name);
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

/// Macro-enabled workbooks are recognised by extension alone.
pub fn is_macro_enabled_name(file_name: &str) -> bool {
    extension_of(file_name) == ".xlsm"
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
