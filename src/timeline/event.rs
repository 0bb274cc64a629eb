use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// 單一原始事件：一個掃描到的檔案或一列 CSV 資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub name: String,
    /// 軌道（分組）鍵
    pub device: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub videos: Vec<PathBuf>,
}

impl TimelineEvent {
    /// 建立事件；`end_time` 早於 `start_time` 時以 `start_time` 取代
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        device: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        videos: Vec<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            start_time,
            end_time: end_time.max(start_time),
            videos,
        }
    }

    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

/// 合併後的連續片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub videos: Vec<PathBuf>,
}

/// 一條軌道合併後的結果，供繪製時間軸使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEvent {
    pub name: String,
    pub device: String,
    pub segments: Vec<Segment>,
}

impl MergedEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start: DateTime<Utc>, end: DateTime<Utc>, videos: Vec<PathBuf>) {
        self.segments.push(Segment { start, end, videos });
    }

    #[must_use]
    pub fn video_count(&self) -> usize {
        self.segments.iter().map(|s| s.videos.len()).sum()
    }
}
