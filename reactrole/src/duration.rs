//! Human duration strings.
//!
//! `parse_duration` is a permissive unit aggregator: it picks every
//! `<integer><unit>` match out of the input and sums them, so `"2d1h"`,
//! `"1h2d"` and `"90m"` are all valid regardless of order or repetition.

use chrono::{DateTime, Duration, Utc};

use std::fmt::Write;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Parses a duration string like `"1w2d"` or `"1h 30m"`.
///
/// Scans for non-overlapping `<integer><unit>` matches with unit one of
/// `w`, `d`, `h`, `m`, ignoring everything else. Returns `None` when no
/// match was found or the total is zero.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let bytes = input.as_bytes();

    let mut total_ms: i64 = 0;
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }

        let value: i64 = match input[start..i].parse() {
            Ok(value) => value,
            Err(_) => continue,
        };

        let mut unit = i;
        while unit < bytes.len() && bytes[unit].is_ascii_whitespace() {
            unit += 1;
        }

        let ms_per_unit = match bytes.get(unit) {
            Some(b'w') => MS_PER_WEEK,
            Some(b'd') => MS_PER_DAY,
            Some(b'h') => MS_PER_HOUR,
            Some(b'm') => MS_PER_MINUTE,
            _ => continue,
        };

        total_ms = total_ms.saturating_add(value.saturating_mul(ms_per_unit));
        i = unit + 1;
    }

    match total_ms > 0 {
        true => Some(Duration::milliseconds(total_ms)),
        false => None,
    }
}

/// Renders a duration string in long form, e.g. `"1 day, 2 hours"`.
///
/// Re-parses `input` via [`parse_duration`]; unparseable input renders as
/// `"Invalid duration"`.
pub fn format_duration(input: &str) -> String {
    let ms = match parse_duration(input) {
        Some(duration) => duration.num_milliseconds(),
        None => return String::from("Invalid duration"),
    };

    let days = ms / MS_PER_DAY;
    let hours = ms % MS_PER_DAY / MS_PER_HOUR;
    let minutes = ms % MS_PER_HOUR / MS_PER_MINUTE;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} day{}", days, plural(days)));
    }
    if hours > 0 {
        parts.push(format!("{} hour{}", hours, plural(hours)));
    }
    if minutes > 0 {
        parts.push(format!("{} minute{}", minutes, plural(minutes)));
    }

    parts.join(", ")
}

/// Renders the time left until `expires_at` in compact form, e.g.
/// `"2d 3h 5m"`. A past timestamp renders as `"Expired"`, a positive
/// remainder under one minute as `"Less than a minute"`.
pub fn format_remaining_time(expires_at: DateTime<Utc>) -> String {
    let diff = expires_at - Utc::now();

    if diff <= Duration::zero() {
        return String::from("Expired");
    }

    let days = diff.num_days();
    let hours = diff.num_hours() % 24;
    let minutes = diff.num_minutes() % 60;

    let mut remaining = String::new();
    if days > 0 {
        write!(remaining, "{}d ", days).unwrap();
    }
    if hours > 0 {
        write!(remaining, "{}h ", hours).unwrap();
    }
    if minutes > 0 {
        write!(remaining, "{}m", minutes).unwrap();
    }

    match remaining.trim_end() {
        "" => String::from("Less than a minute"),
        remaining => remaining.to_string(),
    }
}

fn plural(n: i64) -> &'static str {
    match n {
        1 => "",
        _ => "s",
    }
}

#[cfg(test)]
mod tests {
    use super::{format_duration, format_remaining_time, parse_duration};
    use chrono::{Duration, Utc};

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
        assert_eq!(parse_duration("2d"), parse_duration("1d 1d"));
        assert_eq!(parse_duration("50m").unwrap(), Duration::minutes(50));

        // Order-independent aggregation.
        assert_eq!(parse_duration("2d1h"), parse_duration("1h2d"));

        // Whitespace between integer and unit.
        assert_eq!(parse_duration("1 h").unwrap(), Duration::hours(1));

        // Unknown characters are skipped, usable matches still count.
        assert_eq!(parse_duration("about 2h or so").unwrap(), Duration::hours(2));
    }

    #[test]
    fn test_parse_duration_absent() {
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("10s"), None);

        // A zero total is indistinguishable from garbage.
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("0w0d0h0m"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("1d2h"), "1 day, 2 hours");
        assert_eq!(format_duration("90m"), "1 hour, 30 minutes");
        assert_eq!(format_duration("1w"), "7 days");
        assert_eq!(format_duration("3d"), "3 days");
        assert_eq!(format_duration("1m"), "1 minute");
        assert_eq!(format_duration("nonsense"), "Invalid duration");
    }

    #[test]
    fn test_format_remaining_time() {
        let remaining = format_remaining_time(Utc::now() + Duration::seconds(90));
        assert_eq!(remaining, "1m");

        let expires_at = Utc::now() + Duration::days(2) + Duration::minutes(185) + Duration::seconds(30);
        assert_eq!(format_remaining_time(expires_at), "2d 3h 5m");

        assert_eq!(
            format_remaining_time(Utc::now() - Duration::seconds(1)),
            "Expired"
        );
        assert_eq!(
            format_remaining_time(Utc::now() + Duration::seconds(30)),
            "Less than a minute"
        );
    }
}
