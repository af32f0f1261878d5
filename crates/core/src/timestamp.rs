//! Serde adapters for backend timestamps.
//!
//! The backend emits either RFC 3339 instants or zone-less local date-times
//! (`2024-05-01T09:30:00` / `2024-05-01T09:30:00.123`). Zone-less values are
//! read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, LOCAL_FORMAT).ok().map(|naive| naive.and_utc())
}

pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(instant) => serializer.serialize_str(&instant.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse(&value).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("unrecognized timestamp `{value}`"))
            }),
        }
    }
}
