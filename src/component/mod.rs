//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod csv_parser;
pub mod folder_scanner;
pub mod timeline_workbench;

pub use csv_parser::{CsvParser, ParseOutcome};
pub use folder_scanner::{FolderScanner, ScanOutcome};
pub use timeline_workbench::{TimelineSession, TimelineWorkbench};
