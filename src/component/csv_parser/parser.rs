use super::column_role::{ColumnMap, ColumnRole};
use super::datetime_parser::parse_datetime;
use crate::timeline::TimelineEvent;
use crate::tools::{DurationProbe, JobHandle, spawn_job};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use csv::StringRecord;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const UNKNOWN_NAME: &str = "Unknown";
const DEFAULT_DEVICE: &str = "Default";

#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub events: Vec<TimelineEvent>,
    /// 無法重建事件而略過的資料列數
    pub skipped_rows: usize,
    pub cancelled: bool,
}

/// 把任意欄位順序的 CSV 轉回時間軸事件
///
/// 欄位依標題關鍵字判斷角色；缺少結束時間時以影片長度推算，
/// 沒有影片欄位時補上探測器的預設長度（60 秒）。
pub struct CsvParser {
    path: PathBuf,
    probe: Arc<DurationProbe>,
    shutdown_signal: Arc<AtomicBool>,
}

impl CsvParser {
    pub fn new(path: &Path, probe: Arc<DurationProbe>, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            path: path.to_path_buf(),
            probe,
            shutdown_signal,
        }
    }

    pub fn spawn(self) -> Result<JobHandle<ParseOutcome>> {
        spawn_job("csv-parser", move |progress| {
            self.parse(|completed, total| progress(completed, total))
        })
    }

    /// 逐列解析；每處理一列呼叫一次 `on_progress(row, total)`
    ///
    /// 檔案無法開啟時回傳錯誤，個別資料列的問題只記錄並略過。
    pub fn parse<F>(&self, mut on_progress: F) -> Result<ParseOutcome>
    where
        F: FnMut(usize, usize),
    {
        info!("開始解析 CSV: {}", self.path.display());

        let total = count_data_rows(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("無法開啟 CSV 檔案: {}", self.path.display()))?;

        let columns = match reader.headers() {
            Ok(headers) => ColumnMap::from_headers(headers.iter()),
            Err(e) => {
                warn!("無法讀取 CSV 標題: {} - {e}", self.path.display());
                return Ok(ParseOutcome::default());
            }
        };
        if columns.index(ColumnRole::Start).is_none() {
            warn!("CSV 缺少開始時間欄位，所有資料列都會被略過");
        }

        let mut outcome = ParseOutcome::default();
        for (index, record) in reader.records().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("CSV 解析已取消，完成 {index}/{total} 列");
                outcome.cancelled = true;
                break;
            }

            let row = index + 1;
            let event = record
                .context("無法讀取資料列")
                .and_then(|record| self.parse_row(&record, &columns));
            match event {
                Ok(event) => outcome.events.push(event),
                Err(e) => {
                    warn!("略過第 {row} 列: {e:#}");
                    outcome.skipped_rows += 1;
                }
            }
            on_progress(row, total.max(row));
        }

        info!(
            "CSV 解析完成: {} 個事件，略過 {} 列",
            outcome.events.len(),
            outcome.skipped_rows
        );
        Ok(outcome)
    }

    fn parse_row(&self, record: &StringRecord, columns: &ColumnMap) -> Result<TimelineEvent> {
        let Some(start_raw) = columns.raw(ColumnRole::Start, record) else {
            bail!("缺少開始時間欄位");
        };
        let start = parse_datetime(start_raw);
        if start.is_fallback() {
            debug!("無法解析開始時間 {start_raw:?}，改用目前時間");
        }
        let start = start.value;

        let video = columns.value(ColumnRole::Video, record).map(PathBuf::from);

        let end = match columns.value(ColumnRole::End, record) {
            Some(raw) => parse_datetime(raw).value,
            None => {
                let seconds = video
                    .as_deref()
                    .map_or(self.probe.fallback_seconds(), |path| self.probe.probe(path));
                offset_seconds(start, seconds)
            }
        };

        let name = columns
            .value(ColumnRole::Name, record)
            .map(str::to_string)
            .or_else(|| {
                video
                    .as_deref()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        let device = columns
            .value(ColumnRole::Device, record)
            .map(str::to_string)
            .or_else(|| {
                video
                    .as_deref()
                    .and_then(Path::parent)
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string());

        Ok(TimelineEvent::new(
            name,
            device,
            start,
            end,
            video.into_iter().collect(),
        ))
    }
}

fn offset_seconds(start: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    TimeDelta::try_seconds(seconds.trunc() as i64)
        .and_then(|d| start.checked_add_signed(d))
        .unwrap_or(start)
}

/// 進度分母：總行數扣掉標題列
fn count_data_rows(path: &Path) -> Result<usize> {
    let file =
        File::open(path).with_context(|| format!("無法開啟 CSV 檔案: {}", path.display()))?;
    let lines = BufReader::new(file).split(b'\n').count();
    Ok(lines.saturating_sub(1))
}
