use std::path::Path;

/// 時間軸掃描與 CSV 匯入共用的影片副檔名（小寫，不含點）
pub const VIDEO_EXTENSIONS: [&str; 10] = [
    "mp4", "avi", "mov", "wmv", "mkv", "flv", "webm", "mpg", "mpeg", "mxf",
];

#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
}
