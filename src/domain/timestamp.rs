// ==========================================
// 工单排程校验服务 - 时间归一化
// ==========================================
// 职责: 外部时间戳 → UTC 时刻；UTC 时刻 → `Z` 结尾的 ISO-8601 文本
// 红线: 不带时区的时间戳一律拒绝，不默认视为 UTC
// ==========================================

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Timelike, Utc};
use thiserror::Error;

/// 对外输出格式（秒级精度，固定 `Z` 后缀）
///
/// 该格式按字典序排序即按时间排序，仓储层直接以 TEXT 存储并做范围比较。
pub const UTC_Z_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 可存储的年份上限（四位年份，保证文本序即时间序）
pub const MAX_YEAR: i32 = 9999;

/// 带偏移量的解析格式（`Z` 已在解析前替换为 `+00:00`）
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

/// 不带偏移量的格式，仅用于识别"裸时间"并给出明确的拒绝原因
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 时间戳归一化错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("时间戳为空")]
    Empty,

    #[error("时间戳缺少时区信息: {0}")]
    MissingOffset(String),

    #[error("时间戳格式错误: {0}")]
    Malformed(String),
}

/// 将外部时间戳解析为 UTC 时刻
///
/// 两段式解析:
/// 1. 语法解析，必须带 `Z` 或数值偏移量
/// 2. 若失败但能按裸时间/裸日期解析，判为 `MissingOffset`，否则为 `Malformed`
///
/// 成功时转换为 UTC 并截断到整秒。首尾空白、闰秒（`:60`）以及
/// UTC 年份超出 `0..=9999` 的时刻均判为 `Malformed`。
pub fn normalize(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }
    if raw.trim() != raw {
        return Err(TimestampError::Malformed(raw.to_string()));
    }

    let candidate = replace_utc_designator(raw);
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&candidate, format) {
            // chrono 以 nanosecond >= 1e9 表示闰秒
            if parsed.nanosecond() >= 1_000_000_000 {
                return Err(TimestampError::Malformed(raw.to_string()));
            }
            let instant = parsed.with_timezone(&Utc).trunc_subsecs(0);
            if !is_storable(&instant) {
                return Err(TimestampError::Malformed(raw.to_string()));
            }
            return Ok(instant);
        }
    }

    if is_naive(raw) {
        return Err(TimestampError::MissingOffset(raw.to_string()));
    }

    Err(TimestampError::Malformed(raw.to_string()))
}

/// UTC 年份是否在 `0..=9999` 内
pub fn is_storable(instant: &DateTime<Utc>) -> bool {
    (0..=MAX_YEAR).contains(&instant.year())
}

/// 渲染为 `YYYY-MM-DDTHH:MM:SSZ`
pub fn to_utc_z(instant: &DateTime<Utc>) -> String {
    instant.format(UTC_Z_FORMAT).to_string()
}

// 仅替换末尾的 UTC 标识
fn replace_utc_designator(raw: &str) -> String {
    match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(body) => format!("{}+00:00", body),
        None => raw.to_string(),
    }
}

fn is_naive(raw: &str) -> bool {
    NAIVE_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(raw, format).is_ok())
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

// ==========================================
// serde 辅助: DateTime<Utc> <-> "....Z"
// ==========================================

/// 用于 `#[serde(with = "...")]` 的 UTC `Z` 序列化模块
pub mod utc_z {
    use super::{normalize, to_utc_z};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_utc_z(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_normalize_z_designator() {
        assert_eq!(
            normalize("2025-08-20T09:00:00Z").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
        assert_eq!(
            normalize("2025-08-20T09:00:00z").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
    }

    #[test]
    fn test_normalize_converts_offset_to_utc() {
        assert_eq!(
            normalize("2025-08-20T14:30:00+05:30").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
        assert_eq!(
            normalize("2025-08-20T04:00:00-0500").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
        assert_eq!(
            normalize("2025-08-20 09:00:00+00:00").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
    }

    #[test]
    fn test_normalize_truncates_fraction_and_accepts_minutes() {
        assert_eq!(
            normalize("2025-08-20T09:00:00.750Z").unwrap(),
            utc(2025, 8, 20, 9, 0, 0)
        );
        assert_eq!(
            normalize("2025-08-20T09:15Z").unwrap(),
            utc(2025, 8, 20, 9, 15, 0)
        );
    }

    #[test]
    fn test_normalize_rejects_naive() {
        assert_eq!(
            normalize("2025-08-20T09:00:00"),
            Err(TimestampError::MissingOffset("2025-08-20T09:00:00".to_string()))
        );
        assert!(matches!(
            normalize("2025-08-20"),
            Err(TimestampError::MissingOffset(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_empty_and_garbage() {
        assert_eq!(normalize(""), Err(TimestampError::Empty));
        assert!(matches!(
            normalize("tomorrow morning"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(
            normalize("2025-13-40T09:00:00Z"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(
            normalize("2025/08/20 09:00:00Z"),
            Err(TimestampError::Malformed(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_years_beyond_four_digits() {
        assert!(matches!(
            normalize("+10000-01-01T01:00:00Z"),
            Err(TimestampError::Malformed(_))
        ));
        // 本地年份合法，但换算到 UTC 后越界
        assert!(matches!(
            normalize("9999-12-31T23:30:00-01:00"),
            Err(TimestampError::Malformed(_))
        ));
        assert_eq!(
            normalize("9999-12-31T23:59:59Z").unwrap(),
            utc(9999, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_normalize_rejects_leap_second_and_padding() {
        assert!(matches!(
            normalize("2099-01-01T09:00:60Z"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(
            normalize(" 2099-01-01T09:00:00Z"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(
            normalize("2099-01-01T09:00:00Z\n"),
            Err(TimestampError::Malformed(_))
        ));
        assert!(matches!(normalize("   "), Err(TimestampError::Malformed(_))));
    }

    #[test]
    fn test_round_trip() {
        let instant = utc(2031, 1, 2, 3, 4, 5);
        let rendered = to_utc_z(&instant);
        assert_eq!(rendered, "2031-01-02T03:04:05Z");
        assert_eq!(normalize(&rendered).unwrap(), instant);
    }

    #[test]
    fn test_serde_helper() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Window {
            #[serde(with = "utc_z")]
            at: DateTime<Utc>,
        }

        let json = serde_json::to_string(&Window {
            at: utc(2030, 6, 1, 8, 0, 0),
        })
        .unwrap();
        assert_eq!(json, r#"{"at":"2030-06-01T08:00:00Z"}"#);

        let back: Window = serde_json::from_str(r#"{"at":"2030-06-01T10:00:00+02:00"}"#).unwrap();
        assert_eq!(back.at, utc(2030, 6, 1, 8, 0, 0));

        assert!(serde_json::from_str::<Window>(r#"{"at":"2030-06-01T10:00:00"}"#).is_err());
    }
}
