//! Timestamp codec: the service's RFC-1123-style `posted` strings, the ISO-8601
//! pagination offset, and local display strings.

use crate::error::TimelineError;
use chrono::Local;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// e.g. `Sat, 11 Jan 2020 01:14:29 GMT`
const SERVICE_TIME: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// e.g. `2020-01-11T01:14:29.000Z`; milliseconds are always rendered as `000`.
const OFFSET: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].000Z");

const LOCAL: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parse a service `posted` value into a UTC instant.
pub fn parse_service_time(s: &str) -> Result<OffsetDateTime, TimelineError> {
    let bad = || TimelineError::Format { value: s.to_string() };
    let dt = PrimitiveDateTime::parse(s, SERVICE_TIME).map_err(|_| bad())?;
    // the weekday component is not cross-checked against the date by the parser
    let weekday = dt.weekday().to_string();
    if s.get(..3) != weekday.get(..3) {
        return Err(bad());
    }
    Ok(dt.assume_utc())
}

/// Render an instant as a pagination offset (UTC, sub-second part dropped).
pub fn format_offset(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(UtcOffset::UTC);
    // Only literals and numeric components: formatting cannot fail for in-range years.
    utc.format(OFFSET).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.000Z",
            utc.year(),
            u8::from(utc.month()),
            utc.day(),
            utc.hour(),
            utc.minute(),
            utc.second()
        )
    })
}

/// Zone used for display times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayZone {
    /// The host's zone. Each instant gets the offset in force at that instant,
    /// so daylight saving is honoured.
    #[default]
    Local,
    /// The same offset for every instant.
    Fixed(UtcOffset),
}

impl From<UtcOffset> for DisplayZone {
    fn from(offset: UtcOffset) -> Self {
        DisplayZone::Fixed(offset)
    }
}

/// Render an instant in `zone` as `YYYY-MM-DD HH:MM:SS`.
pub fn format_local(instant: OffsetDateTime, zone: DisplayZone) -> String {
    match zone {
        DisplayZone::Fixed(offset) => format_fixed(instant, offset),
        DisplayZone::Local => match chrono::DateTime::from_timestamp(instant.unix_timestamp(), 0) {
            Some(utc) => utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_fixed(instant, UtcOffset::UTC),
        },
    }
}

fn format_fixed(instant: OffsetDateTime, offset: UtcOffset) -> String {
    let local = instant.to_offset(offset);
    local.format(LOCAL).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            local.year(),
            u8::from(local.month()),
            local.day(),
            local.hour(),
            local.minute(),
            local.second()
        )
    })
}

/// `parse_service_time` followed by `format_local`.
pub fn service_time_to_local(s: &str, zone: DisplayZone) -> Result<String, TimelineError> {
    Ok(format_local(parse_service_time(s)?, zone))
}

/// Drop the sub-second part so cursor comparisons match the offset's granularity.
pub(crate) fn truncate_to_second(instant: OffsetDateTime) -> OffsetDateTime {
    instant.replace_nanosecond(0).unwrap_or(instant)
}
