pub mod memory;
pub mod reader;
pub mod types;
pub mod utils;

pub use memory::{InMemorySheet, InMemoryWorkbook};
pub use reader::{open_workbook, read_workbook_bytes};
pub use types::{SheetVisibility, ViewError, WorkbookView};
