use super::session::TimelineSession;
use crate::component::csv_parser::{CsvParser, ParseOutcome};
use crate::component::folder_scanner::{FolderScanner, ScanOutcome};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::timeline::{
    CSV_TIME_FORMAT, GapUnit, SharedTimelineParams, export_events_csv, format_local,
};
use crate::tools::{
    DurationProbe, JobHandle, ensure_directory_exists, validate_directory_exists,
    validate_file_exists,
};
use anyhow::Result;
use chrono::Local;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct TimelineWorkbench {
    shutdown_signal: Arc<AtomicBool>,
    probe: Arc<DurationProbe>,
    session: TimelineSession,
}

impl TimelineWorkbench {
    pub fn new(config: &Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        let timeline = &config.settings.timeline;
        let probe = DurationProbe::ffprobe(Duration::from_secs(timeline.probe_timeout_secs));
        Self {
            shutdown_signal,
            probe: Arc::new(probe),
            session: TimelineSession::new(SharedTimelineParams::new(timeline.to_params())),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &TimelineSession {
        &self.session
    }

    /// 掃描資料夾，再把產生的 CSV 重新匯入
    pub fn scan_folder(&mut self, config: &mut Config) -> Result<()> {
        println!("{}", style("=== 掃描影片資料夾 ===").cyan().bold());

        let Some(input_path) = prompt_recent_path(config, "請輸入要掃描的資料夾路徑")? else {
            return Ok(());
        };
        let directory = PathBuf::from(&input_path);
        validate_directory_exists(&directory)?;

        self.reset_shutdown_signal();
        println!("{}", style("掃描影片檔案中...").dim());
        let scanner = FolderScanner::new(
            &directory,
            &config.settings.output_directory,
            Arc::clone(&self.probe),
            Arc::clone(&self.shutdown_signal),
        );
        let outcome = wait_with_progress(scanner.spawn()?, "探測影片長度...")?;
        print_scan_summary(&outcome);

        add_recent_path(&mut config.settings, &input_path);
        save_settings(&config.settings)?;

        self.import_csv(&outcome.csv_path)
    }

    /// 匯入使用者指定的 CSV
    pub fn import_from_prompt(&mut self) -> Result<()> {
        println!("{}", style("=== 匯入 CSV ===").cyan().bold());

        let path: String = Input::new()
            .with_prompt("請輸入 CSV 檔案路徑")
            .interact_text()?;
        let path = PathBuf::from(path.trim());
        validate_file_exists(&path)?;

        self.import_csv(&path)
    }

    fn import_csv(&mut self, path: &Path) -> Result<()> {
        self.reset_shutdown_signal();
        let parser = CsvParser::new(
            path,
            Arc::clone(&self.probe),
            Arc::clone(&self.shutdown_signal),
        );
        let outcome: ParseOutcome = wait_with_progress(parser.spawn()?, "解析 CSV...")?;

        println!(
            "{}",
            style(format!("讀取 {} 個事件", outcome.events.len())).green()
        );
        if outcome.skipped_rows > 0 {
            println!(
                "{}",
                style(format!("略過 {} 列無法解析的資料", outcome.skipped_rows)).yellow()
            );
        }
        if outcome.cancelled {
            println!("{}", style("解析已中斷，只載入部分事件").yellow());
        }

        self.session.load_events(outcome.events, path);
        self.print_timeline();
        Ok(())
    }

    pub fn print_timeline(&self) {
        let merged = self.session.merged();
        if merged.is_empty() {
            println!("{}", style("目前沒有任何事件，請先掃描資料夾或匯入 CSV").yellow());
            return;
        }

        let params = self.session.params();
        println!();
        println!("{}", style("=== 時間軸 ===").cyan().bold());
        if let Some(source) = self.session.source() {
            println!("  {} {}", style("來源:").dim(), source.display());
        }
        if let (Some(start), Some(end)) = (params.global_start, params.global_end) {
            println!(
                "  {} {} ~ {}",
                style("範圍:").dim(),
                format_local(start, CSV_TIME_FORMAT),
                format_local(end, CSV_TIME_FORMAT)
            );
        }
        println!(
            "  {} {} {}",
            style("合併門檻:").dim(),
            params.gap_threshold,
            params.gap_threshold_unit
        );
        if let Some(width) = params.timeline_width() {
            println!(
                "  {} {width:.0} px（列高 {:.0} px）",
                style("寬度:").dim(),
                params.scaled_row_height()
            );
        }

        for (track, summary) in merged.iter().zip(self.session.track_summaries()) {
            println!();
            println!(
                "{} {}",
                style(format!("[{}]", track.device)).cyan(),
                style(format!(
                    "{} 個片段 / {} 個影片 / x={:.0} w={:.0}",
                    summary.segment_count, summary.video_count, summary.offset_x, summary.span_width
                ))
                .dim()
            );
            for (index, segment) in track.segments.iter().enumerate() {
                println!(
                    "  {}. {} ~ {} ({} 個影片)",
                    index + 1,
                    format_local(segment.start, CSV_TIME_FORMAT),
                    format_local(segment.end, CSV_TIME_FORMAT),
                    segment.videos.len()
                );
            }
        }
    }

    pub fn change_gap_threshold(&mut self, config: &mut Config) -> Result<()> {
        println!("{}", style("=== 合併門檻 ===").cyan().bold());

        let current = self.session.params();
        println!(
            "{} {} {}",
            style("目前設定:").dim(),
            current.gap_threshold,
            current.gap_threshold_unit
        );

        let units = GapUnit::all();
        let items: Vec<String> = units.iter().map(ToString::to_string).collect();
        let default_index = units
            .iter()
            .position(|&u| u == current.gap_threshold_unit)
            .unwrap_or(0);

        let Some(selection) = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇單位")
            .items(&items)
            .default(default_index)
            .interact_opt()?
        else {
            return Ok(());
        };
        let unit = units[selection];

        let value: f64 = Input::new()
            .with_prompt("請輸入門檻值")
            .default(current.gap_threshold)
            .validate_with(|v: &f64| {
                if v.is_finite() && *v >= 0.0 {
                    Ok(())
                } else {
                    Err("門檻必須是非負數")
                }
            })
            .interact_text()?;

        self.session.set_gap_threshold(value, unit);
        config.settings.timeline.gap_threshold = value;
        config.settings.timeline.gap_threshold_unit = unit;
        save_settings(&config.settings)?;
        info!("合併門檻更新為 {value} {unit}");

        self.print_timeline();
        Ok(())
    }

    pub fn export_events(&self, config: &Config) -> Result<()> {
        println!("{}", style("=== 匯出事件 ===").cyan().bold());

        let events = self.session.events();
        if events.is_empty() {
            println!("{}", style("目前沒有任何事件可匯出").yellow());
            return Ok(());
        }

        let default_path = config.settings.output_directory.join(format!(
            "timeline_events_{}.csv",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let path: String = Input::new()
            .with_prompt("請輸入輸出檔案路徑")
            .default(default_path.to_string_lossy().into_owned())
            .interact_text()?;
        let path = PathBuf::from(path.trim());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_directory_exists(parent)?;
        }

        let written = export_events_csv(events, &path)?;
        println!(
            "{}",
            style(format!("已匯出 {written} 個事件到 {}", path.display())).green()
        );
        Ok(())
    }

    /// 上一次的中斷只作用在當時的工作
    fn reset_shutdown_signal(&self) {
        if self.shutdown_signal.swap(false, Ordering::SeqCst) {
            warn!("清除先前的中斷信號");
        }
    }
}

fn prompt_recent_path(config: &Config, prompt: &str) -> Result<Option<String>> {
    let recent_paths = &config.settings.recent_paths;

    if recent_paths.is_empty() {
        let path: String = Input::new().with_prompt(prompt).interact_text()?;
        return Ok(Some(path.trim().to_string()));
    }

    let mut options: Vec<String> = recent_paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
            format!("{} [{indicator}] {p}", i + 1)
        })
        .collect();
    options.push("輸入新路徑...".to_string());

    println!("{}", style("(按 ESC 返回主選單)").dim());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇路徑")
        .items(&options)
        .default(0)
        .interact_opt()?;

    match selection {
        None => Ok(None),
        Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
        Some(_) => {
            let path: String = Input::new().with_prompt(prompt).interact_text()?;
            Ok(Some(path.trim().to_string()))
        }
    }
}

fn wait_with_progress<T>(handle: JobHandle<T>, message: &'static str) -> Result<T> {
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar.set_message(message);

    let result = handle.wait(|completed, total| {
        progress_bar.set_length(total as u64);
        progress_bar.set_position(completed as u64);
    });
    progress_bar.finish_and_clear();
    result
}

fn print_scan_summary(outcome: &ScanOutcome) {
    println!();
    println!("{}", style("=== 掃描摘要 ===").cyan().bold());
    println!("  影片檔案: {} 個", outcome.total_files);
    println!("  建立事件: {} 個", style(outcome.events.len()).green());
    println!("  CSV: {}", outcome.csv_path.display());
    println!("  JSON: {}", outcome.json_path.display());
    if outcome.cancelled {
        println!("{}", style("掃描已中斷，紀錄只包含已完成的檔案").yellow());
    }
}
