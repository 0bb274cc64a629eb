//! 寬鬆的日期時間解析
//!
//! 依序嘗試 Unix 秒數、ISO-8601、固定格式清單，全部失敗時回傳目前時間。
//! 沒有時差資訊的文字視為本地時間。

use crate::timeline::local_to_utc;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeSource {
    EpochSeconds,
    Iso8601,
    Pattern(&'static str),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDateTime {
    pub value: DateTime<Utc>,
    pub source: DateTimeSource,
}

impl ParsedDateTime {
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, DateTimeSource::Fallback)
    }
}

type Parser = fn(&str) -> Option<ParsedDateTime>;

const PARSERS: [Parser; 3] = [parse_epoch_seconds, parse_iso8601, parse_pattern];

const ISO_NAIVE_PATTERNS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// 月份在前的格式排在日期在前之前，`01/02/2024` 會被視為一月二日
const DATETIME_PATTERNS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m-%d-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_PATTERNS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y",
];

#[must_use]
pub fn parse_datetime(input: &str) -> ParsedDateTime {
    let input = input.trim();
    PARSERS
        .iter()
        .find_map(|parser| parser(input))
        .unwrap_or_else(|| ParsedDateTime {
            value: Utc::now(),
            source: DateTimeSource::Fallback,
        })
}

fn parse_epoch_seconds(input: &str) -> Option<ParsedDateTime> {
    let seconds: i64 = input.parse().ok()?;
    let value = DateTime::from_timestamp(seconds, 0)?;
    Some(ParsedDateTime {
        value,
        source: DateTimeSource::EpochSeconds,
    })
}

fn parse_iso8601(input: &str) -> Option<ParsedDateTime> {
    let value = DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.to_utc())
        .or_else(|| {
            ISO_NAIVE_PATTERNS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .and_then(local_to_utc)
        })?;
    Some(ParsedDateTime {
        value,
        source: DateTimeSource::Iso8601,
    })
}

fn parse_pattern(input: &str) -> Option<ParsedDateTime> {
    let with_time = DATETIME_PATTERNS.iter().find_map(|&fmt| {
        NaiveDateTime::parse_from_str(input, fmt)
            .ok()
            .map(|value| (value, fmt))
    });
    let (value, fmt) = with_time.or_else(|| {
        DATE_PATTERNS.iter().find_map(|&fmt| {
            NaiveDate::parse_from_str(input, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|value| (value, fmt))
        })
    })?;
    Some(ParsedDateTime {
        value: local_to_utc(value)?,
        source: DateTimeSource::Pattern(fmt),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 本地時間 → UTC 時刻
    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        local_to_utc(naive).unwrap()
    }

    #[test]
    fn test_epoch_seconds_first() {
        let parsed = parse_datetime("1700000000");
        assert_eq!(parsed.source, DateTimeSource::EpochSeconds);
        assert_eq!(parsed.value, DateTime::from_timestamp(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn test_iso8601_variants() {
        let parsed = parse_datetime("2024-03-01T10:05:20");
        assert_eq!(parsed.source, DateTimeSource::Iso8601);
        assert_eq!(parsed.value, ymd_hms(2024, 3, 1, 10, 5, 20));

        let with_offset = parse_datetime("2024-03-01T10:05:20Z");
        assert_eq!(with_offset.source, DateTimeSource::Iso8601);
        assert_eq!(
            with_offset.value,
            DateTime::parse_from_rfc3339("2024-03-01T10:05:20Z")
                .unwrap()
                .to_utc()
        );

        // 回撥時段的兩個時刻以時差區分，不會混淆
        let before = parse_datetime("2024-11-03T01:30:00-04:00").value;
        let after = parse_datetime("2024-11-03T01:30:00-05:00").value;
        assert_eq!((after - before).num_seconds(), 3600);
    }

    #[test]
    fn test_patterns() {
        let parsed = parse_datetime(" 2024-03-01 10:05:20 ");
        assert_eq!(parsed.source, DateTimeSource::Pattern("%Y-%m-%d %H:%M:%S"));
        assert_eq!(parsed.value, ymd_hms(2024, 3, 1, 10, 5, 20));

        let slashed = parse_datetime("2024/03/01 10:05:20");
        assert_eq!(slashed.value, ymd_hms(2024, 3, 1, 10, 5, 20));

        let date_only = parse_datetime("2024/03/01");
        assert_eq!(date_only.source, DateTimeSource::Pattern("%Y/%m/%d"));
        assert_eq!(date_only.value, ymd_hms(2024, 3, 1, 0, 0, 0));
    }

    #[test]
    fn test_month_first_before_day_first() {
        assert_eq!(
            parse_datetime("01/02/2024 08:00:00").value,
            ymd_hms(2024, 1, 2, 8, 0, 0)
        );
        // 月份不可能是 25，只能以日期在前解析
        let day_first = parse_datetime("25/12/2024 08:00:00");
        assert_eq!(day_first.source, DateTimeSource::Pattern("%d/%m/%Y %H:%M:%S"));
        assert_eq!(day_first.value, ymd_hms(2024, 12, 25, 8, 0, 0));
        assert_eq!(
            parse_datetime("25-12-2024").value,
            ymd_hms(2024, 12, 25, 0, 0, 0)
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_datetime("yesterday-ish");
        let after = Utc::now();
        assert!(parsed.is_fallback());
        assert!(parsed.value >= before && parsed.value <= after);
        assert!(parse_datetime("").is_fallback());
    }
}
