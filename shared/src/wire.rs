//! Serde helpers for timestamps arriving in any of the shapes front ends produce.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::patch::Patch;

/// Parses RFC 3339, a bare `YYYY-MM-DD` (local midnight) or a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` (local wall time).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_in(raw, &Local)
}

/// Like [`parse_timestamp`], reading zone-less input as wall time in `zone`.
/// A wall time skipped by a DST jump is rejected; an ambiguous one takes the
/// earlier instant.
pub fn parse_timestamp_in<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// `Option<DateTime<Utc>>` where an empty string or `null` means "none".
pub mod optional_timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_timestamp(text)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{text}`"))),
        }
    }
}

pub fn patch_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Patch<Option<DateTime<Utc>>>, D::Error> {
    optional_timestamp::deserialize(deserializer).map(Patch::Set)
}
