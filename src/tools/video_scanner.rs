use crate::config::is_video_file;
use chrono::{DateTime, Timelike, Utc};
use log::warn;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// 根目錄沒有可用名稱時（例如 `/`）使用的軌道名稱
const UNNAMED_ROOT: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileEntry {
    /// 絕對路徑
    pub path: PathBuf,
    /// 直接位於根目錄下為根目錄名稱，否則為所在子資料夾名稱
    pub track: String,
    /// 修改時間（取整到秒）
    pub modified: DateTime<Utc>,
}

/// 取得資料夾名稱；`.`、`..` 之類沒有名稱的路徑會先解析成實際路徑再取
#[must_use]
pub fn folder_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || resolved_folder_name(path),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn resolved_folder_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| UNNAMED_ROOT.to_string())
}

/// 遞迴掃描根目錄下的影片檔案，依路徑排序
///
/// 根目錄不存在或無法讀取時回傳空列表；個別項目的錯誤只記錄並略過。
#[must_use]
pub fn scan_video_files(root: &Path) -> Vec<VideoFileEntry> {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let root_track = folder_name(&root);

    let mut entries: Vec<VideoFileEntry> = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("無法讀取目錄項目: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_video_file(entry.path()))
        .filter_map(|entry| to_video_entry(entry, &root_track))
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn to_video_entry(entry: DirEntry, root_track: &str) -> Option<VideoFileEntry> {
    let modified = match modified_time(&entry) {
        Ok(modified) => modified,
        Err(e) => {
            warn!("無法取得修改時間 {}: {e}", entry.path().display());
            return None;
        }
    };

    let track = if entry.depth() <= 1 {
        root_track.to_string()
    } else {
        entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .map_or_else(|| root_track.to_string(), |n| n.to_string_lossy().into_owned())
    };

    let modified = DateTime::<Utc>::from(modified);
    let modified = modified.with_nanosecond(0).unwrap_or(modified);

    Some(VideoFileEntry {
        path: entry.into_path(),
        track,
        modified,
    })
}

fn modified_time(entry: &DirEntry) -> anyhow::Result<SystemTime> {
    Ok(entry.metadata()?.modified()?)
}
