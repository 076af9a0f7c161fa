//! Borrow/return audit log model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Event kind recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEvent {
    Borrow,
    Return,
}

impl HistoryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEvent::Borrow => "borrow",
            HistoryEvent::Return => "return",
        }
    }
}

impl std::fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HistoryEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrow" => Ok(HistoryEvent::Borrow),
            "return" => Ok(HistoryEvent::Return),
            _ => Err(format!("Invalid history event: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for HistoryEvent {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for HistoryEvent {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for HistoryEvent {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Audit log row. Book title and user name are immutable snapshots taken at
/// event time, so rows stay meaningful after the referenced book or user is
/// deleted.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct HistoryEntry {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub book_id: Uuid,
    pub book_title: String,
    pub user_name: String,
    pub event: HistoryEvent,
    pub recorded_at: DateTime<Utc>,
}

/// History list query parameters; unrecognized parameters are ignored
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Book title substring
    pub book_title: Option<String>,
    /// User name substring
    pub user_name: Option<String>,
    /// Comma-separated event set (`borrow,return`)
    pub event: Option<String>,
    /// Inclusive day range `YYYY-MM-DD,YYYY-MM-DD`
    pub date: Option<String>,
    pub page_num: Option<i64>,
    pub per_page: Option<i64>,
}

/// Parse an inclusive `start,end` day range into UTC bounds covering
/// start 00:00:00 through end 23:59:59. Timestamps longer than a date are
/// truncated to their day.
pub fn parse_date_range(raw: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = raw.split_once(',')?;
    let start_day: NaiveDate = start.trim().get(..10)?.parse().ok()?;
    let end_day: NaiveDate = end.trim().get(..10)?.parse().ok()?;

    let from = start_day.and_hms_opt(0, 0, 0)?.and_utc();
    let to = end_day.and_hms_opt(23, 59, 59)?.and_utc();
    Some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn date_range_covers_whole_days() {
        let (from, to) = parse_date_range("2024-03-01,2024-03-05").unwrap();
        assert_eq!(from.to_string(), "2024-03-01 00:00:00 UTC");
        assert_eq!(to.to_string(), "2024-03-05 23:59:59 UTC");
        assert_eq!(to.second(), 59);
    }

    #[test]
    fn date_range_truncates_timestamps_to_days() {
        let (from, to) = parse_date_range("2024-03-01T10:30:00,2024-03-01T11:00:00").unwrap();
        assert_eq!(from.to_string(), "2024-03-01 00:00:00 UTC");
        assert_eq!(to.to_string(), "2024-03-01 23:59:59 UTC");
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!(parse_date_range("2024-03-01").is_none());
        assert!(parse_date_range("yesterday,today").is_none());
        assert!(parse_date_range("").is_none());
    }

    #[test]
    fn event_parses_case_insensitively() {
        assert_eq!("Borrow".parse::<HistoryEvent>().unwrap(), HistoryEvent::Borrow);
        assert_eq!("RETURN".parse::<HistoryEvent>().unwrap(), HistoryEvent::Return);
        assert!("renew".parse::<HistoryEvent>().is_err());
    }
}
