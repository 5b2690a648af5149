//! Time handling for archive listings and frame labels.

use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the `_yyyymmddHHMM.` timestamp embedded in mosaic filenames.
static FILENAME_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})\.").expect("valid regex"));

/// UTC days covered by one acquisition: yesterday and today.
///
/// Inclusive range from the start of yesterday to the start of today.
pub fn listing_days(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    let mut day = (now - Duration::days(1)).date_naive();
    let mut days = Vec::with_capacity(2);

    while day <= today {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    days
}

/// Archive path segment for a day (`yyyy/mm/dd`).
pub fn listing_path(day: NaiveDate) -> String {
    day.format("%Y/%m/%d").to_string()
}

/// Extract the UTC timestamp from a mosaic filename or URL.
///
/// Example: `n0r_202401151235.png` -> 2024-01-15 12:35 UTC
pub fn timestamp_from_filename(name: &str) -> Option<DateTime<Utc>> {
    let caps = FILENAME_TIMESTAMP.captures(name)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = field(1)? as i32;
    let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Obsolete HTTP-date layouts still accepted by servers (RFC 850, asctime).
const OBSOLETE_HTTP_DATE_FORMATS: [&str; 2] = ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %d %H:%M:%S %Y"];

/// Parse an HTTP `Last-Modified` header value as UTC.
///
/// Accepts the IMF-fixdate form (`Mon, 15 Jan 2024 12:40:00 GMT`) and the two
/// obsolete forms HTTP/1.1 requires recipients to understand.
pub fn timestamp_from_last_modified(value: &str) -> Option<DateTime<Utc>> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(dt) = DateTime::parse_from_rfc2822(&value) {
        return Some(dt.with_timezone(&Utc));
    }

    OBSOLETE_HTTP_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Short clock label for a frame (`3:45 PM`), left-padded to 8 characters.
pub fn format_time_simple<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{:>8}", time.format("%-I:%M %p").to_string())
}
