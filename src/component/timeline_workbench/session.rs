use crate::timeline::{
    GapUnit, MergedEvent, SharedTimelineParams, TimelineEvent, TimelineParams, merge_events,
};
use log::info;
use std::path::{Path, PathBuf};

/// 單一軌道的顯示摘要
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub device: String,
    pub segment_count: usize,
    pub video_count: usize,
    /// 第一個片段的起點（像素）
    pub offset_x: f64,
    /// 最後一個片段終點與第一個片段起點的距離（像素）
    pub span_width: f64,
}

/// 工作台狀態：原始事件、合併結果與共享參數
///
/// 原始事件保持不變，每次調整門檻都從原始事件重新合併。
#[derive(Debug, Default)]
pub struct TimelineSession {
    events: Vec<TimelineEvent>,
    merged: Vec<MergedEvent>,
    params: SharedTimelineParams,
    source: Option<PathBuf>,
}

impl TimelineSession {
    #[must_use]
    pub fn new(params: SharedTimelineParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// 取代目前的事件並重新合併
    pub fn load_events(&mut self, events: Vec<TimelineEvent>, source: &Path) {
        info!("載入 {} 個事件: {}", events.len(), source.display());
        self.events = events;
        self.source = Some(source.to_path_buf());
        self.remerge();
    }

    pub fn set_gap_threshold(&mut self, value: f64, unit: GapUnit) {
        self.params.update(|p| {
            p.gap_threshold = value;
            p.gap_threshold_unit = unit;
        });
        self.remerge();
    }

    pub fn remerge(&mut self) {
        let threshold = self.params.snapshot().gap_threshold_seconds();
        self.merged = merge_events(&self.events, threshold);
        self.params.update(|p| p.update_global_bounds(&self.merged));
        info!(
            "合併完成: {} 個事件 -> {} 條軌道（門檻 {threshold} 秒）",
            self.events.len(),
            self.merged.len()
        );
    }

    #[must_use]
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    #[must_use]
    pub fn merged(&self) -> &[MergedEvent] {
        &self.merged
    }

    #[must_use]
    pub fn params(&self) -> TimelineParams {
        self.params.snapshot()
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn track_summaries(&self) -> Vec<TrackSummary> {
        let params = self.params.snapshot();
        self.merged
            .iter()
            .map(|track| {
                let first = track.segments.first().map(|s| s.start);
                let last = track.segments.last().map(|s| s.end);
                let offset_x = first.map_or(0.0, |t| params.time_to_x(t));
                let span_width = last.map_or(0.0, |t| params.time_to_x(t)) - offset_x;
                TrackSummary {
                    device: track.device.clone(),
                    segment_count: track.segments.len(),
                    video_count: track.video_count(),
                    offset_x,
                    span_width: span_width.max(0.0),
                }
            })
            .collect()
    }
}
