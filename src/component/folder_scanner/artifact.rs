//! 掃描紀錄（CSV 與 JSON）的格式與寫入

use crate::timeline::{CSV_TIME_FORMAT, TimelineEvent, format_local};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCAN_CSV_HEADER: [&str; 5] = [
    "main_folder",
    "subfolder",
    "modification_time",
    "end_time",
    "file_path",
];

const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 掃描摘要，與 CSV 一起寫出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanManifest {
    pub main_folder_path: String,
    pub main_folder_name: String,
    pub file_total_count: usize,
    pub subfolder_count: usize,
    pub subfolder_names: Vec<String>,
    pub creation_time: String,
    pub processed_files: Vec<String>,
}

impl ScanManifest {
    #[must_use]
    pub fn new(
        root: &Path,
        root_name: &str,
        file_total_count: usize,
        tracks: &BTreeSet<String>,
        events: &[TimelineEvent],
        generated_at: DateTime<Local>,
    ) -> Self {
        let processed_files = events
            .iter()
            .flat_map(|e| e.videos.iter())
            .map(|video| {
                video
                    .file_name()
                    .map_or_else(|| video.to_string_lossy(), |n| n.to_string_lossy())
                    .into_owned()
            })
            .collect();

        Self {
            main_folder_path: root.to_string_lossy().into_owned(),
            main_folder_name: root_name.to_string(),
            file_total_count,
            subfolder_count: tracks.len(),
            subfolder_names: tracks.iter().cloned().collect(),
            creation_time: generated_at.format(CSV_TIME_FORMAT).to_string(),
            processed_files,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取掃描紀錄: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("無法解析掃描紀錄: {}", path.display()))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("無法序列化掃描紀錄")?;
        fs::write(path, content)
            .with_context(|| format!("無法寫入掃描紀錄: {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// `<root_name>_<yyyyMMdd_HHmmss>.csv` / `.json`
#[must_use]
pub fn artifact_paths(
    output_dir: &Path,
    root_name: &str,
    generated_at: DateTime<Local>,
) -> ArtifactPaths {
    let stem = format!("{root_name}_{}", generated_at.format(FILE_STAMP_FORMAT));
    ArtifactPaths {
        csv_path: output_dir.join(format!("{stem}.csv")),
        json_path: output_dir.join(format!("{stem}.json")),
    }
}

/// 每個（事件, 影片）寫一列，時間以本地時間輸出
pub fn write_scan_csv(path: &Path, root_name: &str, events: &[TimelineEvent]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("無法建立 CSV 檔案: {}", path.display()))?;
    writer
        .write_record(SCAN_CSV_HEADER)
        .with_context(|| format!("無法寫入 CSV 檔案: {}", path.display()))?;

    for event in events {
        let start = format_local(event.start_time, CSV_TIME_FORMAT);
        let end = format_local(event.end_time, CSV_TIME_FORMAT);
        for video in &event.videos {
            let video = video.to_string_lossy();
            writer
                .write_record([
                    root_name,
                    event.device.as_str(),
                    start.as_str(),
                    end.as_str(),
                    video.as_ref(),
                ])
                .with_context(|| format!("無法寫入 CSV 檔案: {}", path.display()))?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("無法寫入 CSV 檔案: {}", path.display()))
}
