use super::artifact::{ScanManifest, artifact_paths, write_scan_csv};
use crate::timeline::TimelineEvent;
use crate::tools::{
    DurationProbe, JobHandle, VideoFileEntry, ensure_directory_exists, folder_name,
    scan_video_files, spawn_job,
};
use anyhow::{Context, Result};
use chrono::{Local, TimeDelta};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

/// 同時執行的時長探測上限
pub const MAX_PROBE_WORKERS: usize = 8;

#[derive(Debug)]
pub struct ScanOutcome {
    pub events: Vec<TimelineEvent>,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    /// 掃描到的影片檔案總數（含因取消而未處理的）
    pub total_files: usize,
    pub cancelled: bool,
}

#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map_or(4, NonZeroUsize::get)
        .min(MAX_PROBE_WORKERS)
}

/// 資料夾掃描器
///
/// 走訪根目錄、平行探測影片長度並寫出 CSV / JSON 紀錄。
pub struct FolderScanner {
    root: PathBuf,
    output_dir: PathBuf,
    probe: Arc<DurationProbe>,
    shutdown_signal: Arc<AtomicBool>,
    max_workers: usize,
}

impl FolderScanner {
    pub fn new(
        root: &Path,
        output_dir: &Path,
        probe: Arc<DurationProbe>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            root: std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
            output_dir: output_dir.to_path_buf(),
            probe,
            shutdown_signal,
            max_workers: default_worker_count(),
        }
    }

    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.clamp(1, MAX_PROBE_WORKERS);
        self
    }

    /// 在背景執行緒掃描
    pub fn spawn(self) -> Result<JobHandle<ScanOutcome>> {
        spawn_job("folder-scanner", move |progress| {
            self.scan(|completed, total| progress(completed, total))
        })
    }

    /// 同步掃描；每完成一個檔案呼叫一次 `on_progress(completed, total)`
    ///
    /// 只有輸出目錄或紀錄檔寫入失敗會回傳錯誤。
    pub fn scan<F>(&self, mut on_progress: F) -> Result<ScanOutcome>
    where
        F: FnMut(usize, usize),
    {
        info!("開始掃描資料夾: {}", self.root.display());

        let root_name = folder_name(&self.root);
        let files = scan_video_files(&self.root);
        let total_files = files.len();
        let tracks: BTreeSet<String> = files.iter().map(|f| f.track.clone()).collect();
        info!("找到 {total_files} 個影片檔案，{} 個軌道", tracks.len());

        let (mut events, cancelled) = self.probe_all(files, &mut on_progress)?;
        events.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.videos.cmp(&b.videos))
        });

        let generated_at = Local::now();
        ensure_directory_exists(&self.output_dir)?;
        let paths = artifact_paths(&self.output_dir, &root_name, generated_at);

        write_scan_csv(&paths.csv_path, &root_name, &events)?;
        ScanManifest::new(
            &self.root,
            &root_name,
            total_files,
            &tracks,
            &events,
            generated_at,
        )
        .save_to_file(&paths.json_path)?;

        info!(
            "掃描完成: {} 個事件，CSV: {}，JSON: {}",
            events.len(),
            paths.csv_path.display(),
            paths.json_path.display()
        );

        Ok(ScanOutcome {
            events,
            csv_path: paths.csv_path,
            json_path: paths.json_path,
            total_files,
            cancelled,
        })
    }

    fn probe_all<F>(
        &self,
        files: Vec<VideoFileEntry>,
        on_progress: &mut F,
    ) -> Result<(Vec<TimelineEvent>, bool)>
    where
        F: FnMut(usize, usize),
    {
        let total = files.len();
        if total == 0 {
            return Ok((Vec::new(), false));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|i| format!("duration-probe-{i}"))
            .panic_handler(|_| error!("時長探測工作異常結束"))
            .build()
            .context("無法建立時長探測執行緒池")?;

        let (sender, receiver) = mpsc::channel();
        let mut cancelled = false;

        for file in files {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }

            let sender = sender.clone();
            let probe = Arc::clone(&self.probe);
            let shutdown_signal = Arc::clone(&self.shutdown_signal);
            pool.spawn(move || {
                // 已排入但尚未開始的工作在取消後直接放棄
                if shutdown_signal.load(Ordering::SeqCst) {
                    return;
                }
                let _ = sender.send(build_event(file, &probe));
            });
        }
        drop(sender);

        let mut events = Vec::with_capacity(total);
        for event in receiver {
            events.push(event);
            on_progress(events.len(), total);
        }

        let cancelled =
            cancelled || (self.shutdown_signal.load(Ordering::SeqCst) && events.len() < total);
        if cancelled {
            warn!("掃描已取消，完成 {}/{} 個檔案", events.len(), total);
        }

        Ok((events, cancelled))
    }
}

fn build_event(file: VideoFileEntry, probe: &DurationProbe) -> TimelineEvent {
    let duration = probe.probe(&file.path);
    let end = TimeDelta::try_seconds(duration.trunc() as i64)
        .and_then(|d| file.modified.checked_add_signed(d))
        .unwrap_or(file.modified);

    let name = file
        .path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

    debug!(
        "建立事件 {name} [{}]: {} ~ {} ({duration:.2}s)",
        file.track, file.modified, end
    );

    TimelineEvent::new(name, file.track, file.modified, end, vec![file.path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::DurationSource;
    use anyhow::bail;
    use std::fs;
    use tempfile::TempDir;

    struct FixedSeconds(f64);

    impl DurationSource for FixedSeconds {
        fn name(&self) -> &str {
            "fixed"
        }

        fn duration_seconds(&self, path: &Path) -> Result<f64> {
            if path.to_string_lossy().contains("broken") {
                bail!("cannot decode");
            }
            Ok(self.0)
        }
    }

    /// 第一次被呼叫時就觸發中斷，模擬使用者在掃描途中按下 Ctrl-C
    struct InterruptingSource(Arc<AtomicBool>);

    impl DurationSource for InterruptingSource {
        fn name(&self) -> &str {
            "interrupting"
        }

        fn duration_seconds(&self, _path: &Path) -> Result<f64> {
            self.0.store(true, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(20));
            Ok(3.0)
        }
    }

    fn probe(seconds: f64) -> Arc<DurationProbe> {
        Arc::new(DurationProbe::with_sources(
            vec![Box::new(FixedSeconds(seconds))],
            60.0,
        ))
    }

    #[test]
    fn test_default_worker_count_bounded() {
        let workers = default_worker_count();
        assert!((1..=MAX_PROBE_WORKERS).contains(&workers));
    }

    #[test]
    fn test_scan_builds_events_and_progress() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("trip");
        fs::create_dir_all(root.join("cam1")).unwrap();
        for name in ["a.mp4", "b.mp4", "broken.mov"] {
            fs::write(root.join("cam1").join(name), b"x").unwrap();
        }
        let output = temp_dir.path().join("out");

        let scanner = FolderScanner::new(
            &root,
            &output,
            probe(12.9),
            Arc::new(AtomicBool::new(false)),
        )
        .with_max_workers(2);

        let mut progress = Vec::new();
        let outcome = scanner.scan(|c, t| progress.push((c, t))).unwrap();

        assert_eq!(outcome.events.len(), 3);
        assert_eq!(outcome.total_files, 3);
        assert!(!outcome.cancelled);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

        for event in &outcome.events {
            assert_eq!(event.device, "cam1");
            assert_eq!(event.videos.len(), 1);
            let expected = if event.name == "broken.mov" { 60 } else { 12 };
            assert_eq!(event.duration_seconds(), expected);
        }
        assert!(outcome.csv_path.exists());
        assert!(outcome.json_path.exists());
    }

    #[test]
    fn test_cancelled_before_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("trip");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.mp4"), b"x").unwrap();

        let scanner = FolderScanner::new(
            &root,
            &temp_dir.path().join("out"),
            probe(5.0),
            Arc::new(AtomicBool::new(true)),
        );
        let outcome = scanner.scan(|_, _| {}).unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.total_files, 1);
        assert!(outcome.csv_path.exists());
    }

    #[test]
    fn test_cancelled_mid_scan_keeps_partial_results() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("trip");
        fs::create_dir_all(&root).unwrap();
        for i in 0..10 {
            fs::write(root.join(format!("clip{i:02}.mp4")), b"x").unwrap();
        }

        let shutdown_signal = Arc::new(AtomicBool::new(false));
        let probe = Arc::new(DurationProbe::with_sources(
            vec![Box::new(InterruptingSource(Arc::clone(&shutdown_signal)))],
            60.0,
        ));
        let scanner = FolderScanner::new(
            &root,
            &temp_dir.path().join("out"),
            probe,
            Arc::clone(&shutdown_signal),
        )
        .with_max_workers(2);

        let mut progress = Vec::new();
        let outcome = scanner.scan(|c, t| progress.push((c, t))).unwrap();

        // 已開始的探測會完成，之後的檔案不再處理
        assert!(outcome.cancelled);
        assert_eq!(outcome.total_files, 10);
        assert!(!outcome.events.is_empty());
        assert!(outcome.events.len() <= 2);
        assert!(outcome.events.iter().all(|e| e.duration_seconds() == 3));

        let last = *progress.last().unwrap();
        assert_eq!(last, (outcome.events.len(), 10));
        assert!(last.0 < last.1);

        let csv = fs::read_to_string(&outcome.csv_path).unwrap();
        assert_eq!(csv.lines().count(), outcome.events.len() + 1);
    }

    #[test]
    fn test_unwritable_output_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let scanner = FolderScanner::new(
            temp_dir.path(),
            &blocker.join("timeline"),
            probe(5.0),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(scanner.scan(|_, _| {}).is_err());
    }
}
