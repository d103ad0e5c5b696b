use crate::constants::MAX_BUFFER_HINT;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use chrono_tz::America::Santiago;
use chrono_tz::Tz;
use std::time::Duration;

/// Current wall-clock time in Chile, the zone every Mercado Publico date is published in.
pub fn santiago_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Santiago)
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn yesterday_utc() -> NaiveDate {
    today_utc() - ChronoDuration::days(1)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Initial capacity for a buffer whose size comes from a page label or an
/// archive header. Those are untrusted, so the hint is capped.
pub fn buffer_capacity(claimed: u64) -> usize {
    usize::try_from(claimed).map_or(MAX_BUFFER_HINT, |size| size.min(MAX_BUFFER_HINT))
}
