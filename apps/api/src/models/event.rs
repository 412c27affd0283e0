use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One tracked user event. Only `event_type = 'conversion'` rows feed the
/// attribution pipeline; impressions and clicks ride along for future use.
///
/// `timestamp` is stored as raw TEXT: upstream trackers deliver mixed
/// ISO-8601 forms and the occasional garbage value, and ingestion must not
/// reject a conversion over a bad clock string.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversionEventRow {
    pub id: Uuid,
    pub campaign_id: String,
    pub timestamp: String,
    pub event_type: String,
    pub source: Option<String>,
    pub referrer: Option<String>,
    pub geo: Option<String>,
    pub user_id: Option<String>,
    pub revenue: Option<f64>,
}

impl ConversionEventRow {
    /// Event instant, if the stored text parses. `None` excludes the row
    /// from temporal matching without failing the computation.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// One TV airing of a campaign spot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AiringRow {
    pub id: Uuid,
    pub campaign_id: String,
    pub airing_time: String,
    pub channel: Option<String>,
    pub region: Option<String>,
}

impl AiringRow {
    pub fn aired_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.airing_time)
    }
}

/// Lenient timestamp parser for the TEXT columns.
///
/// Accepts, in order: RFC 3339 (offset or Z), a naive ISO date-time with
/// `T` or space separator (seconds and fractional seconds optional, read
/// as UTC), and a bare date (read as midnight UTC). Anything else is
/// `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_timestamp("2025-11-01T10:00:00+05:30").unwrap();
        assert_eq!(parsed.hour(), 4);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_zulu() {
        let parsed = parse_timestamp("2025-11-01T10:00:00Z").unwrap();
        assert_eq!(parsed.hour(), 10);
    }

    #[test]
    fn test_parse_naive_datetime_as_utc() {
        let parsed = parse_timestamp("2025-11-01T10:30:00").unwrap();
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        assert!(parse_timestamp("2025-11-01T10:30:00.123456").is_some());
    }

    #[test]
    fn test_parse_space_separator() {
        assert!(parse_timestamp("2025-11-01 10:30:00").is_some());
    }

    #[test]
    fn test_parse_minutes_precision() {
        let parsed = parse_timestamp("2025-11-01T10:30").unwrap();
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 30);
        assert_eq!(parsed.second(), 0);
        assert!(parse_timestamp("2025-11-01 10:30").is_some());
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let parsed = parse_timestamp("2025-11-01").unwrap();
        assert_eq!(parsed.hour(), 0);
        assert_eq!(parsed.minute(), 0);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("not-a-timestamp").is_none());
        assert!(parse_timestamp("2025-13-45").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
    }

    #[test]
    fn test_unparsable_event_has_no_instant() {
        let event = ConversionEventRow {
            id: Uuid::new_v4(),
            campaign_id: "camp_001".to_string(),
            timestamp: "yesterday-ish".to_string(),
            event_type: "conversion".to_string(),
            source: None,
            referrer: None,
            geo: None,
            user_id: None,
            revenue: None,
        };
        assert!(event.occurred_at().is_none());
    }
}
