use crate::timeline::{GapUnit, TimelineParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const MAX_RECENT_PATHS: usize = 10;

/// 掃描產生的 CSV / JSON 預設存放位置（相對於工作目錄）
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "data/timeline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

/// 時間軸參數的持久化版本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub gap_threshold: f64,
    pub gap_threshold_unit: GapUnit,
    pub pixels_per_second: f64,
    pub row_height: u32,
    pub dpi_scale: f64,
    /// 單一 ffprobe 呼叫的逾時秒數
    pub probe_timeout_secs: u64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            gap_threshold: 30.0,
            gap_threshold_unit: GapUnit::Sec,
            pixels_per_second: 1.0,
            row_height: 45,
            dpi_scale: 1.0,
            probe_timeout_secs: 30,
        }
    }
}

impl TimelineSettings {
    #[must_use]
    pub fn to_params(&self) -> TimelineParams {
        TimelineParams {
            pixels_per_second: if self.pixels_per_second > 0.0 {
                self.pixels_per_second
            } else {
                1.0
            },
            row_height: self.row_height.max(1),
            gap_threshold: self.gap_threshold,
            gap_threshold_unit: self.gap_threshold_unit,
            global_start: None,
            global_end: None,
            dpi_scale: if self.dpi_scale > 0.0 {
                self.dpi_scale
            } else {
                1.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub recent_paths: Vec<String>,
    pub output_directory: PathBuf,
    pub timeline: TimelineSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            recent_paths: Vec::new(),
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            timeline: TimelineSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
