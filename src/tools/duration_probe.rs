//! 影片時長探測
//!
//! 依序嘗試多個來源，全部失敗時回傳固定的預設值，呼叫端永遠拿得到一個長度。

use super::ffprobe_info::{
    DEFAULT_PROBE_TIMEOUT, probe_format_duration, probe_frame_count_duration,
};
use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::Path;
use std::time::Duration;

/// 所有來源都失敗時使用的長度（秒），未經驗證的暫定值
pub const DEFAULT_FALLBACK_SECONDS: f64 = 60.0;

pub trait DurationSource: Send + Sync {
    fn name(&self) -> &str;
    fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// 主要來源：容器層級的 duration
pub struct FfprobeFormatDuration {
    timeout: Duration,
}

impl FfprobeFormatDuration {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DurationSource for FfprobeFormatDuration {
    fn name(&self) -> &str {
        "ffprobe-format"
    }

    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        probe_format_duration(path, self.timeout)
    }
}

/// 次要來源：幀數 / 幀率
pub struct FfprobeFrameCount {
    timeout: Duration,
}

impl FfprobeFrameCount {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DurationSource for FfprobeFrameCount {
    fn name(&self) -> &str {
        "ffprobe-frame-count"
    }

    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        probe_frame_count_duration(path, self.timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationOrigin {
    Source(String),
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbedDuration {
    pub seconds: f64,
    pub origin: DurationOrigin,
}

pub struct DurationProbe {
    sources: Vec<Box<dyn DurationSource>>,
    fallback_seconds: f64,
}

impl Default for DurationProbe {
    fn default() -> Self {
        Self::ffprobe(DEFAULT_PROBE_TIMEOUT)
    }
}

impl DurationProbe {
    #[must_use]
    pub fn ffprobe(timeout: Duration) -> Self {
        Self::with_sources(
            vec![
                Box::new(FfprobeFormatDuration::new(timeout)),
                Box::new(FfprobeFrameCount::new(timeout)),
            ],
            DEFAULT_FALLBACK_SECONDS,
        )
    }

    #[must_use]
    pub fn with_sources(sources: Vec<Box<dyn DurationSource>>, fallback_seconds: f64) -> Self {
        Self {
            sources,
            fallback_seconds,
        }
    }

    #[must_use]
    pub const fn fallback_seconds(&self) -> f64 {
        self.fallback_seconds
    }

    /// 取得影片長度（秒），不會失敗
    #[must_use]
    pub fn probe(&self, path: &Path) -> f64 {
        self.probe_detailed(path).seconds
    }

    #[must_use]
    pub fn probe_detailed(&self, path: &Path) -> ProbedDuration {
        for source in &self.sources {
            match checked(source.duration_seconds(path)) {
                Ok(seconds) => {
                    debug!(
                        "{} 取得長度 {:.2}s: {}",
                        source.name(),
                        seconds,
                        path.display()
                    );
                    return ProbedDuration {
                        seconds,
                        origin: DurationOrigin::Source(source.name().to_string()),
                    };
                }
                Err(e) => debug!("{} 失敗: {e:#}", source.name()),
            }
        }

        warn!(
            "無法取得影片長度，使用預設 {:.0}s: {}",
            self.fallback_seconds,
            path.display()
        );
        ProbedDuration {
            seconds: self.fallback_seconds,
            origin: DurationOrigin::Fallback,
        }
    }
}

fn checked(result: Result<f64>) -> Result<f64> {
    let seconds = result?;
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("無效的影片長度: {seconds}");
    }
    Ok(seconds)
}
