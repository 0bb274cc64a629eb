use super::{ISO_TIME_FORMAT, format_local};
use super::event::TimelineEvent;
use anyhow::{Context, Result};
use std::path::Path;

pub const EXPORT_HEADER: [&str; 5] = ["event_name", "device", "start_time", "end_time", "video_path"];

/// 將事件匯出為 CSV，每個（事件, 影片）一列，回傳寫入的資料列數
pub fn export_events_csv(events: &[TimelineEvent], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("無法建立匯出檔案: {}", path.display()))?;
    writer.write_record(EXPORT_HEADER)?;

    let mut rows = 0;
    for event in events {
        let start = format_local(event.start_time, ISO_TIME_FORMAT);
        let end = format_local(event.end_time, ISO_TIME_FORMAT);
        // 沒有影片的事件仍輸出一列，影片欄留空
        let videos: Vec<String> = if event.videos.is_empty() {
            vec![String::new()]
        } else {
            event
                .videos
                .iter()
                .map(|v| v.to_string_lossy().into_owned())
                .collect()
        };
        for video in &videos {
            writer
                .write_record([
                    event.name.as_str(),
                    event.device.as_str(),
                    start.as_str(),
                    end.as_str(),
                    video.as_str(),
                ])
                .with_context(|| format!("無法寫入匯出檔案: {}", path.display()))?;
            rows += 1;
        }
    }

    writer
        .flush()
        .with_context(|| format!("無法寫入匯出檔案: {}", path.display()))?;
    Ok(rows)
}
