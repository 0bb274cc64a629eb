//! 時間軸全域參數
//!
//! `TimelineParams` 是不可變的快照；跨執行緒共享時透過 `SharedTimelineParams`，
//! 只有設定變更的呼叫端會寫入，合併與繪製端只讀取快照。

use super::event::MergedEvent;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// 繪製時在時間軸右側保留的像素
const TIMELINE_WIDTH_MARGIN: f64 = 100.0;

/// 合併容差的單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GapUnit {
    #[default]
    Sec,
    Min,
    Hour,
}

impl GapUnit {
    #[must_use]
    pub const fn seconds_per_unit(self) -> f64 {
        match self {
            Self::Sec => 1.0,
            Self::Min => 60.0,
            Self::Hour => 3600.0,
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Sec, Self::Min, Self::Hour]
    }
}

impl fmt::Display for GapUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sec => write!(f, "sec"),
            Self::Min => write!(f, "min"),
            Self::Hour => write!(f, "hour"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineParams {
    pub pixels_per_second: f64,
    pub row_height: u32,
    pub gap_threshold: f64,
    pub gap_threshold_unit: GapUnit,
    pub global_start: Option<DateTime<Utc>>,
    pub global_end: Option<DateTime<Utc>>,
    pub dpi_scale: f64,
}

impl Default for TimelineParams {
    fn default() -> Self {
        Self {
            pixels_per_second: 1.0,
            row_height: 45,
            gap_threshold: 30.0,
            gap_threshold_unit: GapUnit::Sec,
            global_start: None,
            global_end: None,
            dpi_scale: 1.0,
        }
    }
}

impl TimelineParams {
    #[must_use]
    pub fn gap_threshold_seconds(&self) -> f64 {
        self.gap_threshold * self.gap_threshold_unit.seconds_per_unit()
    }

    /// 依合併結果重新計算全域起訖時間
    pub fn update_global_bounds(&mut self, merged: &[MergedEvent]) {
        let segments = merged.iter().flat_map(|m| m.segments.iter());
        self.global_start = segments.clone().map(|s| s.start).min();
        self.global_end = segments.map(|s| s.end).max();
    }

    #[must_use]
    pub fn time_to_x(&self, time: DateTime<Utc>) -> f64 {
        let Some(start) = self.global_start else {
            return 0.0;
        };
        let millis = (time - start).num_milliseconds();
        millis as f64 / 1000.0 * self.pixels_per_second
    }

    #[must_use]
    pub fn x_to_time(&self, x: f64) -> Option<DateTime<Utc>> {
        let start = self.global_start?;
        let seconds = (x / self.pixels_per_second).trunc();
        if !seconds.is_finite() {
            return None;
        }
        start.checked_add_signed(TimeDelta::try_seconds(seconds as i64)?)
    }

    /// 時間軸總寬度（像素），沒有資料時為 `None`
    #[must_use]
    pub fn timeline_width(&self) -> Option<f64> {
        let (start, end) = (self.global_start?, self.global_end?);
        let total = (end - start).num_seconds() as f64;
        Some(total * self.pixels_per_second + TIMELINE_WIDTH_MARGIN)
    }

    #[must_use]
    pub fn scaled_row_height(&self) -> f64 {
        f64::from(self.row_height) * self.dpi_scale
    }
}

/// 行程內共享的時間軸參數
///
/// 寫入端透過 `update` 序列化修改；讀取端以 `snapshot` 取得複本，
/// 不會看到修改到一半的狀態。
#[derive(Debug, Clone, Default)]
pub struct SharedTimelineParams {
    inner: Arc<RwLock<TimelineParams>>,
}

impl SharedTimelineParams {
    #[must_use]
    pub fn new(params: TimelineParams) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TimelineParams {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut TimelineParams),
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        mutate(&mut guard);
    }
}
