//! 資料夾時間軸掃描元件
//!
//! 走訪資料夾、以子資料夾作為軌道，探測每個影片的長度後產生事件，
//! 並在輸出目錄留下 CSV 與 JSON 紀錄。

mod artifact;
mod scanner;

pub use artifact::{ArtifactPaths, SCAN_CSV_HEADER, ScanManifest, artifact_paths, write_scan_csv};
pub use scanner::{FolderScanner, MAX_PROBE_WORKERS, ScanOutcome, default_worker_count};
