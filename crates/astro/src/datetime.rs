//! Date/time and timezone offset input handling.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::AstroError;

/// Largest accepted offset from UTC, in seconds (±14:00).
const MAX_OFFSET_SECS: i32 = 14 * 3600;

/// A parsed `date_time` value. The offset is present only when the input
/// carried one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeInput {
    pub local: PrimitiveDateTime,
    pub offset: Option<UtcOffset>,
}

impl DateTimeInput {
    /// Resolve to UTC. An offset in the input wins over `fallback`; with
    /// neither, the value is taken to be UTC already.
    ///
    /// Fails when the UTC instant falls outside the representable years
    /// (for example 9999-12-31T23:00 at -05:00).
    pub fn to_utc(self, fallback: Option<UtcOffset>) -> Result<OffsetDateTime, AstroError> {
        let offset = self.offset.or(fallback).unwrap_or(UtcOffset::UTC);
        self.local
            .assume_offset(offset)
            .checked_to_offset(UtcOffset::UTC)
            .ok_or_else(|| {
                AstroError::DateTimeOutOfRange(format!("{} {}", self.local, offset))
            })
    }
}

/// Parse an ISO 8601 / RFC 3339 date-time, with or without an offset.
///
/// A space may separate date and time; seconds and fractional seconds are
/// optional, and a bare date means midnight.
pub fn parse_date_time(raw: &str) -> Result<DateTimeInput, AstroError> {
    let s = raw.trim().replacen(' ', "T", 1);
    let invalid = || AstroError::InvalidDateTime(raw.to_string());

    if let Ok(dt) = OffsetDateTime::parse(&s, &Rfc3339) {
        return Ok(aware(dt));
    }
    if let Ok(dt) = OffsetDateTime::parse(
        &s,
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ) {
        return Ok(aware(dt));
    }

    let local = PrimitiveDateTime::parse(
        &s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        PrimitiveDateTime::parse(&s, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    })
    .or_else(|_| {
        Date::parse(&s, format_description!("[year]-[month]-[day]")).map(Date::midnight)
    })
    .map_err(|_| invalid())?;

    Ok(DateTimeInput {
        local,
        offset: None,
    })
}

fn aware(dt: OffsetDateTime) -> DateTimeInput {
    DateTimeInput {
        local: PrimitiveDateTime::new(dt.date(), dt.time()),
        offset: Some(dt.offset()),
    }
}

/// Parse a timezone offset.
///
/// Accepted: `Z`, `UTC`, `±HH`, `±HHMM`, `±HH:MM` (optionally prefixed by
/// `UTC` or `GMT`), and decimal hours such as `2` or `-5.5`.
pub fn parse_tz_offset(raw: &str) -> Result<UtcOffset, AstroError> {
    let invalid = || AstroError::InvalidTzOffset(raw.to_string());

    let upper = raw.trim().to_ascii_uppercase();
    let body = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper)
        .trim();
    if body.is_empty() || body == "Z" {
        return Ok(UtcOffset::UTC);
    }

    let (sign, rest) = match body.as_bytes()[0] {
        b'+' => (1, &body[1..]),
        b'-' => (-1, &body[1..]),
        _ => (1, body),
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.') {
        return Err(invalid());
    }

    let seconds = if let Some((hours, minutes)) = rest.split_once(':') {
        hours_and_minutes(hours, minutes).ok_or_else(invalid)?
    } else if rest.len() == 4 && rest.chars().all(|c| c.is_ascii_digit()) {
        hours_and_minutes(&rest[..2], &rest[2..]).ok_or_else(invalid)?
    } else {
        let hours: f64 = rest.parse().map_err(|_| invalid())?;
        if !hours.is_finite() || hours * 3600.0 > f64::from(MAX_OFFSET_SECS) {
            return Err(invalid());
        }
        (hours * 3600.0).round() as i32
    };

    if seconds > MAX_OFFSET_SECS {
        return Err(invalid());
    }
    UtcOffset::from_whole_seconds(sign * seconds).map_err(|_| invalid())
}

fn hours_and_minutes(hours: &str, minutes: &str) -> Option<i32> {
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let h: i32 = hours.parse().ok()?;
    let m: i32 = minutes.parse().ok()?;
    (m < 60).then_some(h * 3600 + m * 60)
}

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian day (UT) of an instant. Works from the Unix timestamp, so no
/// offset conversion is needed.
pub fn julian_day(at: OffsetDateTime) -> f64 {
    let seconds = at.unix_timestamp() as f64 + f64::from(at.nanosecond()) / 1e9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}
