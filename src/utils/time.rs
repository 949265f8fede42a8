use std::fmt::Display;

use chrono::TimeZone;

use crate::trip::NOT_AVAILABLE;

/// This is the standard way of showing a leg boundary in journeytrack.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a number of seconds as `HH:MM:SS`. Negative values are shown as zero.
pub fn format_clock(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats epoch milliseconds as a wall-clock time in `zone`.
pub fn format_timestamp_in<Tz: TimeZone>(timestamp: Option<i64>, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    timestamp
        .and_then(|v| zone.timestamp_millis_opt(v).single())
        .map(|v| v.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.into())
}
