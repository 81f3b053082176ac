use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use reqwest::Client;

use crate::config::LARGE_FILE_WARNING_BYTES;
use crate::error::AppError;
use crate::services::excel::utils::{bytes_to_mb, extension_of, is_supported_extension, SUPPORTED_EXTENSIONS};
use crate::services::excel::{open_workbook, InMemoryWorkbook};

/// Checks that `path` names a readable workbook file with a supported extension.
pub fn validate_path(path: &Path) -> Result<(), AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }
    if !path.is_file() {
        return Err(AppError::NotAFile(path.display().to_string()));
    }

    ensure_supported_name(&path.to_string_lossy())?;

    let size = std::fs::metadata(path)?.len();
    if size > LARGE_FILE_WARNING_BYTES {
        tracing::warn!(
            "Large file detected ({:.1}MB). Analysis may take longer.",
            bytes_to_mb(size)
        );
    }

    // Opening and reading one byte catches locked or unreadable files early.
    let mut probe = [0u8; 1];
    if File::open(path)?.read(&mut probe)? == 0 {
        return Err(AppError::WorkbookOpen(format!("{} is empty", path.display())));
    }
    Ok(())
}

pub fn ensure_supported_name(file_name: &str) -> Result<(), AppError> {
    if is_supported_extension(file_name) {
        return Ok(());
    }
    Err(AppError::UnsupportedFormat {
        extension: extension_of(file_name),
        supported: SUPPORTED_EXTENSIONS.join(", "),
    })
}

pub fn ensure_within_limit(size: u64, limit: u64) -> Result<(), AppError> {
    if size > limit {
        return Err(AppError::FileTooLarge { size, limit });
    }
    Ok(())
}

/// Validates then decodes a workbook on disk.
pub fn load_workbook(path: &Path) -> Result<InMemoryWorkbook, AppError> {
    validate_path(path)?;
    open_workbook(path)
}

pub async fn load_file_from_url(url: &str) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Download(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Download(format!(
            "Failed to fetch file. Status: {}",
            response.status()
        )));
    }

    response
        .bytes()
        .await
        .map_err(|e| AppError::Download(format!("Failed to read response bytes: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_files_are_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.xlsx");
        assert!(matches!(validate_path(&missing), Err(AppError::FileNotFound(_))));
    }

    #[test]
    fn directories_are_not_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(validate_path(dir.path()), Err(AppError::NotAFile(_))));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b").unwrap();
        let err = validate_path(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file format: .csv. Supported: .xlsx, .xlsm, .xls"
        );
    }

    #[test]
    fn readable_workbook_paths_pass() {
        let mut file = tempfile::Builder::new().suffix(".XLSX").tempfile().unwrap();
        file.write_all(b"PK").unwrap();
        assert!(validate_path(file.path()).is_ok());
    }

    #[test]
    fn zero_byte_files_are_rejected() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = validate_path(file.path()).unwrap_err();
        assert!(matches!(err, AppError::WorkbookOpen(_)));
        assert!(err.to_string().ends_with("is empty"));
    }

    #[test]
    fn undecodable_content_fails_to_open() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"definitely not a zip archive").unwrap();
        assert!(matches!(load_workbook(file.path()), Err(AppError::WorkbookOpen(_))));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(ensure_within_limit(10, 10).is_ok());
        assert!(matches!(
            ensure_within_limit(11, 10),
            Err(AppError::FileTooLarge { size: 11, limit: 10 })
        ));
    }
}
