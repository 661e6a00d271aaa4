use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A booked time slot as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub start_at: NaiveDateTime,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub end_at: NaiveDateTime,
}

impl Reservation {
    /// Whether this slot overlaps `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_at < end && start < self.end_at
    }
}

/// Body of `POST /reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub name: String,
    pub description: String,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub start_at: NaiveDateTime,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub end_at: NaiveDateTime,
}

/// Body of `PUT /reservations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub start_at: NaiveDateTime,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub end_at: NaiveDateTime,
}

/// ISO-8601 local date-times as the API speaks them (`2025-03-01T18:30:00`).
/// Parsing also accepts minutes-only values and RFC 3339 timestamps.
mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::parse_local_datetime;

    const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(WIRE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_local_datetime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time: {raw}")))
    }
}
