//! Derived display fields and currency formatting.
//!
//! Everything here is recomputed on every read and never persisted.

use chrono::NaiveTime;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::status::ProjectStatus;
use crate::types::{Date, Money, Timestamp};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Health score at or above which a project is `excellent`.
pub const EXCELLENT_THRESHOLD: f64 = 10.0;
/// Health score at or above which a project is `good`.
pub const GOOD_THRESHOLD: f64 = 0.0;
/// Health score at or above which a project is `warning`; below is `critical`.
pub const WARNING_THRESHOLD: f64 = -10.0;

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Midnight UTC at the start of `date`.
pub fn date_start_utc(date: Date) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// A project is overdue once its estimated end has passed and it is not
/// completed.
pub fn is_overdue(estimated_end: Option<Date>, status: ProjectStatus, now: Timestamp) -> bool {
    match estimated_end {
        Some(end) => date_start_utc(end) < now && status != ProjectStatus::Completed,
        None => false,
    }
}

/// Whole days until the estimated end, rounded up. Negative once overdue.
pub fn days_remaining(estimated_end: Date, now: Timestamp) -> i64 {
    let millis = (date_start_utc(estimated_end) - now).num_milliseconds();
    if millis >= 0 {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    } else {
        // Integer division truncates toward zero, which is the ceiling here.
        millis / MILLIS_PER_DAY
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Progress-versus-schedule classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl Health {
    pub fn classify(health_score: f64) -> Self {
        if health_score >= EXCELLENT_THRESHOLD {
            Health::Excellent
        } else if health_score >= GOOD_THRESHOLD {
            Health::Good
        } else if health_score >= WARNING_THRESHOLD {
            Health::Warning
        } else {
            Health::Critical
        }
    }
}

/// Derived health figures for one project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHealth {
    pub expected_progress: f64,
    pub health_score: f64,
    pub health: Health,
}

/// Progress the schedule implies by `now`, in `0.0..=100.0`.
///
/// A zero-length schedule expects nothing before its end date and
/// everything after it.
pub fn expected_progress(start: Date, estimated_end: Date, now: Timestamp) -> f64 {
    let remaining = days_remaining(estimated_end, now);
    let total = (estimated_end - start).num_days();
    if total <= 0 {
        return if remaining <= 0 { 100.0 } else { 0.0 };
    }
    let expected = 100.0 * (1.0 - remaining as f64 / total as f64);
    expected.clamp(0.0, 100.0)
}

/// Compare actual progress with [`expected_progress`]. `None` when either
/// schedule date is missing.
pub fn project_health(
    progress: i32,
    start: Option<Date>,
    estimated_end: Option<Date>,
    now: Timestamp,
) -> Option<ProjectHealth> {
    let (start, end) = (start?, estimated_end?);
    let expected = expected_progress(start, end, now);
    let score = f64::from(progress) - expected;
    Some(ProjectHealth {
        expected_progress: round1(expected),
        health_score: round1(score),
        health: Health::classify(score),
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Locale conventions for money display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub symbol_after: bool,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl CurrencyFormat {
    /// `$1,234.56`
    pub fn en_us() -> Self {
        Self {
            symbol: "$".to_string(),
            symbol_after: false,
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    /// `1.234,56 €`
    pub fn euro() -> Self {
        Self {
            symbol: "€".to_string(),
            symbol_after: true,
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

/// Itemized amount with two decimals, e.g. `$12,500.00`.
pub fn format_currency(amount: Money, format: &CurrencyFormat) -> String {
    format_with_scale(amount, 2, format)
}

/// Dashboard figure without fractional digits, e.g. `$1,250,000`.
pub fn format_currency_compact(amount: Money, format: &CurrencyFormat) -> String {
    format_with_scale(amount, 0, format)
}

fn format_with_scale(amount: Money, scale: u32, format: &CurrencyFormat) -> String {
    let mut rounded = amount
        .abs()
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    let digits = rounded.to_string();
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut number = group_thousands(int_part, format.thousands_separator);
    if let Some(frac) = frac_part {
        number.push(format.decimal_separator);
        number.push_str(frac);
    }

    let sign = if amount < Money::ZERO && !rounded.is_zero() { "-" } else { "" };
    if format.symbol_after {
        format!("{sign}{number} {}", format.symbol)
    } else {
        format!("{sign}{}{number}", format.symbol)
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_only_when_not_completed() {
        let now = Utc::now();
        let yesterday = (now - Duration::days(1)).date_naive();
        assert!(is_overdue(Some(yesterday), ProjectStatus::InProgress, now));
        assert!(!is_overdue(Some(yesterday), ProjectStatus::Completed, now));
        assert!(!is_overdue(None, ProjectStatus::InProgress, now));
    }

    #[test]
    fn future_end_is_not_overdue() {
        let now = Utc::now();
        let next_month = (now + Duration::days(30)).date_naive();
        assert!(!is_overdue(Some(next_month), ProjectStatus::Planning, now));
    }

    #[test]
    fn days_remaining_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(days_remaining(date(2025, 3, 2), now), 1);
        assert_eq!(days_remaining(date(2025, 3, 11), now), 10);
    }

    #[test]
    fn days_remaining_goes_negative() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(days_remaining(date(2025, 3, 5), now), -5);
        assert_eq!(days_remaining(date(2025, 3, 10), now), 0);
    }

    #[test]
    fn expected_progress_tracks_elapsed_time() {
        // 100-day schedule, 80 days remaining -> 20% expected.
        let start = date(2025, 1, 1);
        let end = start + Duration::days(100);
        let now = Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap();
        assert_eq!(days_remaining(end, now), 80);
        assert!((expected_progress(start, end, now) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn expected_progress_is_clamped() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(expected_progress(date(2025, 1, 1), date(2025, 2, 1), now), 100.0);
        assert_eq!(expected_progress(date(2026, 1, 1), date(2027, 1, 1), now), 0.0);
    }

    #[test]
    fn health_thresholds() {
        assert_eq!(Health::classify(10.0), Health::Excellent);
        assert_eq!(Health::classify(0.0), Health::Good);
        assert_eq!(Health::classify(-0.5), Health::Warning);
        assert_eq!(Health::classify(-10.0), Health::Warning);
        assert_eq!(Health::classify(-10.1), Health::Critical);
    }

    #[test]
    fn project_halfway_on_schedule_is_good() {
        let now = Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap();
        let health = project_health(50, Some(date(2025, 1, 1)), Some(date(2025, 1, 21)), now)
            .expect("dates present");
        assert_eq!(health.expected_progress, 50.0);
        assert_eq!(health.health_score, 0.0);
        assert_eq!(health.health, Health::Good);
    }

    #[test]
    fn lagging_project_is_critical() {
        let now = Utc.with_ymd_and_hms(2025, 1, 19, 0, 0, 0).unwrap();
        let health = project_health(20, Some(date(2025, 1, 1)), Some(date(2025, 1, 21)), now)
            .expect("dates present");
        assert_eq!(health.health, Health::Critical);
    }

    #[test]
    fn health_needs_both_dates() {
        assert!(project_health(50, None, Some(date(2025, 1, 1)), Utc::now()).is_none());
    }

    #[test]
    fn currency_two_decimals() {
        let us = CurrencyFormat::en_us();
        assert_eq!(format_currency(Money::new(123_456_789, 2), &us), "$1,234,567.89");
        assert_eq!(format_currency(Money::from(0), &us), "$0.00");
        assert_eq!(format_currency(Money::new(-5_005, 3), &us), "-$5.01");
    }

    #[test]
    fn currency_compact_drops_cents() {
        let us = CurrencyFormat::en_us();
        assert_eq!(format_currency_compact(Money::new(125_000_049, 2), &us), "$1,250,000");
        assert_eq!(format_currency_compact(Money::new(999_50, 2), &us), "$1,000");
    }

    #[test]
    fn currency_respects_locale() {
        let eu = CurrencyFormat::euro();
        assert_eq!(format_currency(Money::new(123_456, 2), &eu), "1.234,56 €");
    }
}
