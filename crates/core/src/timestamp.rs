//! UTC timestamp handling for persisted records.
//!
//! Data files contain timestamps written by several generations of the application:
//! RFC 3339 values with an offset, values with no zone designator at all, and the
//! placeholder `0001-01-01T00:00:00` for "never set". Reading is lenient and always yields
//! UTC; writing always produces RFC 3339 with a `Z` suffix.
//!
//! Normalization rules applied when a record is added or updated:
//! - an unset timestamp becomes "now"
//! - a timestamp without a zone is taken as UTC (done while parsing)
//! - a timestamp with any other offset is converted to UTC (done while parsing)

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// The placeholder used for a timestamp that was never set (`0001-01-01T00:00:00Z`).
pub fn unset() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn is_unset(value: &DateTime<Utc>) -> bool {
    *value <= unset()
}

/// Replaces an unset timestamp with the current time.
pub fn normalize(value: DateTime<Utc>) -> DateTime<Utc> {
    if is_unset(&value) {
        Utc::now()
    } else {
        value
    }
}

/// Parses a timestamp in any of the accepted layouts.
///
/// An empty string yields [`unset`]. Returns `None` when nothing matches.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(unset());
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }

    const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical on-disk rendering: RFC 3339, UTC, `Z` suffix, fractional digits only as needed.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter for `DateTime<Utc>` fields using the lenient reader and canonical writer.
pub mod utc {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_lenient(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}
