//! Date-time handling for request and response bodies.
//!
//! Requests may send a bare date (`2024-01-05`, meaning midnight), a civil
//! date-time (`2024-01-05T09:30:00`) or an instant carrying an offset
//! (`2024-01-05T09:30:00.000Z`, `2024-01-05T09:30:00+01:00`). Instants are
//! converted to the wall-clock time of the server's zone, the same zone
//! `created_at` / `updated_at` are stamped in. Responses always use the full
//! civil form.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;
use serde::{Deserialize, Deserializer};

/// Parses request input in the server's time zone
pub fn parse(value: &str) -> Result<DateTime, String> {
    parse_in(value, &TimeZone::system())
}

/// Parses a bare date, a civil date-time or an offset-bearing instant,
/// resolving instants to wall-clock time in `zone`
pub fn parse_in(value: &str, zone: &TimeZone) -> Result<DateTime, String> {
    let value = value.trim();
    // Civil parsing would accept `+01:00` and silently drop it, so instants go first
    if let Ok(instant) = value.parse::<Timestamp>() {
        return Ok(instant.to_zoned(zone.clone()).datetime());
    }
    if let Ok(datetime) = value.parse::<DateTime>() {
        return Ok(datetime);
    }
    value
        .parse::<Date>()
        .map(|date| date.to_datetime(jiff::civil::Time::midnight()))
        .map_err(|_| format!("Data non valida: {}", value))
}

pub fn format(value: DateTime) -> String {
    value.strftime("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Renders a stored timestamp for a response body
pub fn format_stored(value: jiff_diesel::DateTime) -> String {
    format(value.to_jiff())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            parse(&raw).map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}
