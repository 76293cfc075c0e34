//! Lenient timestamp decoding.
//!
//! The server emits three shapes depending on the endpoint: naive ISO 8601
//! (`isoformat()`), RFC 3339 with a zone, and the HTTP date format its JSON
//! encoder falls back to for raw datetime columns.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// Parse any of the server's timestamp shapes into a naive UTC time.
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_utc()))
        .or_else(|| DateTime::parse_from_rfc2822(value).ok().map(|dt| dt.naive_utc()))
}

/// `deserialize_with` helper for optional timestamp fields. Unparseable
/// values are an error, `null` is `None`.
pub fn optional<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp `{}`", raw))),
    }
}
