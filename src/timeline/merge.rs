//! 時間區間合併
//!
//! 以軌道分組後依開始時間排序，間隔不超過容差（含等於）的事件合併成同一片段。

use super::event::{MergedEvent, TimelineEvent};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// 將原始事件合併為每條軌道一個 `MergedEvent`，軌道依名稱排序
#[must_use]
pub fn merge_events(events: &[TimelineEvent], gap_threshold_seconds: f64) -> Vec<MergedEvent> {
    // NaN 與負值都視為 0
    let threshold = if gap_threshold_seconds >= 0.0 {
        gap_threshold_seconds
    } else {
        0.0
    };

    let mut by_device: BTreeMap<&str, Vec<&TimelineEvent>> = BTreeMap::new();
    for event in events {
        by_device.entry(event.device.as_str()).or_default().push(event);
    }

    by_device
        .into_iter()
        .map(|(device, mut group)| {
            group.sort_by_key(|e| e.start_time);
            merge_track(device, &group, threshold)
        })
        .collect()
}

fn merge_track(device: &str, events: &[&TimelineEvent], threshold: f64) -> MergedEvent {
    let mut merged = MergedEvent::new(device, device);
    let Some((first, rest)) = events.split_first() else {
        return merged;
    };

    let mut current = RunningSegment::from_event(first);
    for next in rest {
        if gap_seconds(current.end, next.start_time) <= threshold {
            current.extend(next);
        } else {
            let closed = std::mem::replace(&mut current, RunningSegment::from_event(next));
            merged.add_segment(closed.start, closed.end, closed.videos);
        }
    }
    merged.add_segment(current.start, current.end, current.videos);

    merged
}

fn gap_seconds(current_end: DateTime<Utc>, next_start: DateTime<Utc>) -> f64 {
    (next_start - current_end).num_milliseconds() as f64 / 1000.0
}

struct RunningSegment {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    videos: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl RunningSegment {
    fn from_event(event: &TimelineEvent) -> Self {
        let mut segment = Self {
            start: event.start_time,
            end: event.end_time,
            videos: Vec::with_capacity(event.videos.len()),
            seen: HashSet::new(),
        };
        segment.push_videos(&event.videos);
        segment
    }

    fn extend(&mut self, event: &TimelineEvent) {
        self.end = self.end.max(event.end_time);
        self.push_videos(&event.videos);
    }

    fn push_videos(&mut self, videos: &[PathBuf]) {
        for video in videos {
            if self.seen.insert(video.clone()) {
                self.videos.push(video.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
            .and_utc()
    }

    fn event(device: &str, start: DateTime<Utc>, end: DateTime<Utc>, video: &str) -> TimelineEvent {
        TimelineEvent::new(video, device, start, end, vec![PathBuf::from(video)])
    }

    fn example_pair() -> Vec<TimelineEvent> {
        vec![
            event("cam1", at(10, 0, 0), at(10, 5, 0), "/cam1/a.mp4"),
            event("cam1", at(10, 5, 20), at(10, 10, 0), "/cam1/b.mp4"),
        ]
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_events(&[], 30.0).is_empty());
    }

    #[test]
    fn test_gap_within_threshold_merges() {
        let merged = merge_events(&example_pair(), 30.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].device, "cam1");
        assert_eq!(merged[0].name, "cam1");
        assert_eq!(merged[0].segments.len(), 1);
        let segment = &merged[0].segments[0];
        assert_eq!(segment.start, at(10, 0, 0));
        assert_eq!(segment.end, at(10, 10, 0));
        assert_eq!(segment.videos.len(), 2);
    }

    #[test]
    fn test_gap_over_threshold_splits() {
        let merged = merge_events(&example_pair(), 10.0);
        let segments = &merged[0].segments;
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start, segments[0].end), (at(10, 0, 0), at(10, 5, 0)));
        assert_eq!((segments[1].start, segments[1].end), (at(10, 5, 20), at(10, 10, 0)));
    }

    #[test]
    fn test_gap_equal_to_threshold_merges() {
        let merged = merge_events(&example_pair(), 20.0);
        assert_eq!(merged[0].segments.len(), 1);
    }

    #[test]
    fn test_contained_event_keeps_outer_end() {
        let events = vec![
            event("cam", at(1, 0, 0), at(2, 0, 0), "/outer.mp4"),
            event("cam", at(1, 10, 0), at(1, 20, 0), "/inner.mp4"),
        ];
        let merged = merge_events(&events, 0.0);
        assert_eq!(merged[0].segments.len(), 1);
        assert_eq!(merged[0].segments[0].end, at(2, 0, 0));
    }

    #[test]
    fn test_unsorted_input_and_multiple_tracks() {
        let events = vec![
            event("b", at(3, 0, 0), at(3, 1, 0), "/b2.mp4"),
            event("a", at(1, 0, 0), at(1, 1, 0), "/a1.mp4"),
            event("b", at(1, 0, 0), at(1, 1, 0), "/b1.mp4"),
        ];
        let merged = merge_events(&events, 60.0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].device, "a");
        assert_eq!(merged[1].device, "b");
        assert_eq!(merged[1].segments.len(), 2);
        assert_eq!(merged[1].segments[0].videos, vec![PathBuf::from("/b1.mp4")]);
    }

    #[test]
    fn test_duplicate_videos_deduplicated_in_order() {
        let events = vec![
            TimelineEvent::new(
                "x",
                "cam",
                at(1, 0, 0),
                at(1, 1, 0),
                vec![PathBuf::from("/a.mp4"), PathBuf::from("/b.mp4")],
            ),
            TimelineEvent::new(
                "y",
                "cam",
                at(1, 0, 30),
                at(1, 2, 0),
                vec![PathBuf::from("/b.mp4"), PathBuf::from("/c.mp4")],
            ),
        ];
        let merged = merge_events(&events, 0.0);
        assert_eq!(
            merged[0].segments[0].videos,
            vec![
                PathBuf::from("/a.mp4"),
                PathBuf::from("/b.mp4"),
                PathBuf::from("/c.mp4")
            ]
        );
    }

    #[test]
    fn test_negative_threshold_treated_as_zero() {
        let events = vec![
            event("cam", at(1, 0, 0), at(1, 1, 0), "/a.mp4"),
            event("cam", at(1, 1, 0), at(1, 2, 0), "/b.mp4"),
        ];
        assert_eq!(merge_events(&events, -5.0)[0].segments.len(), 1);
        assert_eq!(merge_events(&events, f64::NAN)[0].segments.len(), 1);
    }

    fn instant(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().to_utc()
    }

    #[test]
    fn test_gap_measured_in_elapsed_time_across_clock_change() {
        // 美東 2024-11-03 01:59 (EDT) 之後時鐘回撥到 01:00 (EST)
        let events = vec![
            event(
                "cam",
                instant("2024-11-03T01:59:30-04:00"),
                instant("2024-11-03T01:00:00-05:00"),
                "/a.mp4",
            ),
            event(
                "cam",
                instant("2024-11-03T01:00:10-05:00"),
                instant("2024-11-03T01:01:10-05:00"),
                "/b.mp4",
            ),
        ];
        assert_eq!(events[0].duration_seconds(), 30);

        let merged = merge_events(&events, 30.0);
        assert_eq!(merged[0].segments.len(), 1);
        assert_eq!(merged[0].segments[0].start, instant("2024-11-03T05:59:30Z"));
        assert_eq!(merged[0].segments[0].end, instant("2024-11-03T06:01:10Z"));
        assert_eq!(merge_events(&events, 5.0)[0].segments.len(), 2);
    }

    /// 以簡單的線性同餘產生器建立可重現的隨機事件
    fn pseudo_random_events(seed: u64, count: usize) -> Vec<TimelineEvent> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            state >> 33
        };
        let base = at(0, 0, 0);
        (0..count)
            .map(|i| {
                let device = format!("cam{}", next() % 3);
                let start = base + TimeDelta::seconds((next() % 5000) as i64);
                let end = start + TimeDelta::seconds((next() % 300) as i64);
                event(&device, start, end, &format!("/v{i}.mp4"))
            })
            .collect()
    }

    /// 將區間聯集正規化為互不重疊的排序區間（端點相接視為連續）
    fn union(mut spans: Vec<(DateTime<Utc>, DateTime<Utc>)>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        spans.sort();
        let mut out: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
        for (s, e) in spans {
            match out.last_mut() {
                Some(last) if s <= last.1 => last.1 = last.1.max(e),
                _ => out.push((s, e)),
            }
        }
        out
    }

    #[test]
    fn test_properties_on_generated_inputs() {
        for seed in 1..20 {
            let events = pseudo_random_events(seed, 60);
            for threshold in [0.0, 15.0, 120.0] {
                let merged = merge_events(&events, threshold);

                for track in &merged {
                    for pair in track.segments.windows(2) {
                        assert!(pair[0].start <= pair[1].start);
                        assert!(gap_seconds(pair[0].end, pair[1].start) > threshold);
                    }

                    let input: Vec<_> = events
                        .iter()
                        .filter(|e| e.device == track.device)
                        .map(|e| (e.start_time, e.end_time))
                        .collect();
                    let output: Vec<_> = track.segments.iter().map(|s| (s.start, s.end)).collect();
                    // 合併只會填補容差內的空隙，因此輸出聯集必須涵蓋輸入聯集，
                    // 且每個輸出片段的端點都來自輸入
                    let input_union = union(input.clone());
                    for (s, e) in &input_union {
                        assert!(output.iter().any(|(os, oe)| os <= s && e <= oe));
                    }
                    for (s, e) in &output {
                        assert!(input.iter().any(|(is, _)| is == s));
                        assert!(input.iter().any(|(_, ie)| ie == e));
                    }
                    if threshold == 0.0 {
                        assert_eq!(union(output), input_union);
                    }
                }

                let total_videos: usize = merged.iter().map(MergedEvent::video_count).sum();
                assert_eq!(total_videos, events.len());

                assert_eq!(merge_events(&events, threshold), merged);
            }
        }
    }

    #[test]
    fn test_larger_threshold_never_increases_segments() {
        for seed in 1..10 {
            let events = pseudo_random_events(seed, 80);
            let mut previous = usize::MAX;
            for threshold in [0.0, 5.0, 30.0, 300.0, 3600.0] {
                let count: usize = merge_events(&events, threshold)
                    .iter()
                    .map(|m| m.segments.len())
                    .sum();
                assert!(count <= previous);
                previous = count;
            }
        }
    }
}
