//! Heuristic scoring of how well a spreadsheet workbook lends itself to
//! software automation.
//!
//! Decode a workbook with [`services::excel::open_workbook`] (or build an
//! [`services::excel::InMemoryWorkbook`]), then call [`assess`].

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

pub use config::{AnalysisConfig, Config};
pub use error::AppError;
pub use models::Assessment;
pub use services::assessment::{assess, assess_at};
