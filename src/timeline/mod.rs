//! 時間軸資料模型、參數與合併演算法
//!
//! 事件時間一律以 UTC 時刻保存，只在讀寫 CSV 與顯示時轉換為本地時間。

mod event;
mod export;
mod merge;
mod params;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};

pub use event::{MergedEvent, Segment, TimelineEvent};
pub use export::{EXPORT_HEADER, export_events_csv};
pub use merge::merge_events;
pub use params::{GapUnit, SharedTimelineParams, TimelineParams};

/// CSV 產物中使用的時間格式
pub const CSV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 事件匯出使用的 ISO-8601 時間格式（本地時間附時差）
pub const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// 將本地時間解析為 UTC 時刻
///
/// 日光節約時間回撥造成的重複時間取較早者；撥快跳過的時間以切換前的時差計算。
#[must_use]
pub fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(local) = Local.from_local_datetime(&naive).earliest() {
        return Some(local.to_utc());
    }
    let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
    let local = Local.from_local_datetime(&shifted).earliest()?;
    Some(local.to_utc() - TimeDelta::hours(1))
}

/// 以本地時間格式化 UTC 時刻
#[must_use]
pub fn format_local(time: DateTime<Utc>, format: &str) -> String {
    time.with_timezone(&Local).format(format).to_string()
}
