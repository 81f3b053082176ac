pub mod assessment;
pub mod excel;
pub mod file_processor;
pub mod report;
