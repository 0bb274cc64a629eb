use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// 單一 ffprobe 呼叫預設的逾時時間
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    nb_frames: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// 從容器資訊取得影片長度（秒）
pub fn probe_format_duration(path: &Path, timeout: Duration) -> Result<f64> {
    let stdout = run_ffprobe(&["-show_format"], path, timeout)?;
    parse_format_duration(&stdout)
}

/// 以視訊串流的幀數與幀率推算影片長度（秒）
pub fn probe_frame_count_duration(path: &Path, timeout: Duration) -> Result<f64> {
    let stdout = run_ffprobe(&["-show_streams", "-select_streams", "v:0"], path, timeout)?;
    parse_frame_count_duration(&stdout)
}

fn parse_format_duration(json: &str) -> Result<f64> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .ok_or_else(|| anyhow!("無法取得影片長度"))
}

fn parse_frame_count_duration(json: &str) -> Result<f64> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    let stream = probe
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref().is_none_or(|t| t == "video"))
        .ok_or_else(|| anyhow!("找不到視訊串流"))?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|n| *n > 0.0)
        .ok_or_else(|| anyhow!("無法取得影片幀數"))?;

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .filter(|fps| *fps > 0.0)
        .ok_or_else(|| anyhow!("無法取得影片幀率"))?;

    Ok(frame_count / frame_rate)
}

/// 執行 ffprobe 並在逾時時終止程序
fn run_ffprobe(extra_args: &[&str], path: &Path, timeout: Duration) -> Result<String> {
    let mut child = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json"])
        .args(extra_args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    // 另開執行緒讀取 stdout，避免管線塞滿造成 ffprobe 卡住
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("無法取得 ffprobe 輸出"))?;
    let reader = thread::spawn(move || {
        let mut buffer = String::new();
        stdout.read_to_string(&mut buffer).map(|_| buffer)
    });

    let started = Instant::now();
    let status: ExitStatus = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            bail!(
                "ffprobe 逾時（{} 秒）: {}",
                timeout.as_secs(),
                path.display()
            );
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = reader
        .join()
        .map_err(|_| anyhow!("讀取 ffprobe 輸出的執行緒異常結束"))?
        .context("無法讀取 ffprobe 輸出")?;

    if !status.success() {
        bail!("ffprobe 執行失敗: {}", path.display());
    }

    Ok(output)
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
