//! Lenient calendar-date parsing for API payloads and cache snapshots.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Date as it may appear on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Wrapped {
        #[serde(rename = "$date")]
        date: String,
    },
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
///
/// Timestamps are reduced to their UTC date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

/// `deserialize_with` helper for `Option<NaiveDate>` fields.
///
/// Unparseable values become `None` rather than failing the whole record.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDate>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawDate::Text(s) | RawDate::Wrapped { date: s } => parse_date(&s),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_opt")]
        date: Option<NaiveDate>,
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-09-01"), ymd(2024, 9, 1));
        assert_eq!(parse_date("2024-09-01T00:00:00.000Z"), ymd(2024, 9, 1));
        assert_eq!(parse_date("2024-09-01T23:30:00-02:00"), ymd(2024, 9, 2));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("01/09/2024"), None);
    }

    #[test]
    fn test_deserialize_wrapped_and_missing() {
        let h: Holder = serde_json::from_str(r#"{"date": {"$date": "1990-05-17T00:00:00Z"}}"#).unwrap();
        assert_eq!(h.date, ymd(1990, 5, 17));

        let h: Holder = serde_json::from_str(r#"{"date": null}"#).unwrap();
        assert_eq!(h.date, None);

        let h: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(h.date, None);

        let h: Holder = serde_json::from_str(r#"{"date": "garbage"}"#).unwrap();
        assert_eq!(h.date, None);
    }
}
