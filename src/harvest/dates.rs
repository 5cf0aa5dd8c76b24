//! Relative review dates ("2 minggu lalu", "3 weeks ago") to absolute instants.
//!
//! Units are fixed approximations (a year is 365 days, a month 30) since the
//! feed itself only reports coarse ages. Text without a number or without a
//! known unit resolves to the reference instant: treating an unreadable age
//! as "now" keeps the review rather than discarding it as too old.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

static MAGNITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("magnitude pattern is valid"));

/// Unit keywords in priority order, Indonesian and English.
const UNITS: &[(&[&str], TimeUnit)] = &[
    (&["tahun", "year"], TimeUnit::Year),
    (&["bulan", "month"], TimeUnit::Month),
    (&["minggu", "week"], TimeUnit::Week),
    (&["hari", "day"], TimeUnit::Day),
    (&["jam", "hour"], TimeUnit::Hour),
    (&["menit", "minute"], TimeUnit::Minute),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl TimeUnit {
    fn span(self, n: i64) -> Option<Duration> {
        match self {
            TimeUnit::Year => Duration::try_days(n.checked_mul(365)?),
            TimeUnit::Month => Duration::try_days(n.checked_mul(30)?),
            TimeUnit::Week => Duration::try_weeks(n),
            TimeUnit::Day => Duration::try_days(n),
            TimeUnit::Hour => Duration::try_hours(n),
            TimeUnit::Minute => Duration::try_minutes(n),
        }
    }
}

/// First recognized unit keyword, checked from largest to smallest.
pub fn detect_unit(text: &str) -> Option<TimeUnit> {
    let lower = text.to_lowercase();
    UNITS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, unit)| *unit)
}

/// Resolve a relative date phrase against `reference`.
pub fn resolve(date_text: &str, reference: DateTime<Utc>) -> DateTime<Utc> {
    let Some(digits) = MAGNITUDE.find(date_text) else {
        return reference;
    };
    let Ok(n) = digits.as_str().parse::<u32>() else {
        return reference;
    };
    let Some(unit) = detect_unit(date_text) else {
        return reference;
    };

    unit.span(i64::from(n))
        .and_then(|span| reference.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Oldest instant still inside a window of `years_back` years.
pub fn cutoff(reference: DateTime<Utc>, years_back: u32) -> DateTime<Utc> {
    TimeUnit::Year
        .span(i64::from(years_back))
        .and_then(|span| reference.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
