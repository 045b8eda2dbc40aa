//! Resolution of provider-reported temporal references against a
//! reference date.
//!
//! The completion provider reports time ranges in unresolved form (explicit
//! dates, or a bare month with optional year) together with a confidence
//! flag. This module turns that into a concrete [`TimeRange`] or drops it.
//! A plan must never carry a time filter the provider was not confident
//! about, and an unresolvable reference is omitted entirely rather than
//! defaulted to "all time" or "today".

use chrono::{Datelike, NaiveDate};

use crate::plan::{RawTimeRange, TimeRange};

/// Resolve a raw time range against `reference_date`.
///
/// Rules:
/// - unconfident ranges are dropped;
/// - explicit dates pass through unchanged (an inverted range survives and
///   later filters to an empty set);
/// - a month without a year anchors to the most recent occurrence of that
///   month that has started on or before the reference date;
/// - a year without month or dates covers that whole year;
/// - anything else resolves to `None`.
pub fn resolve_time_range(raw: &RawTimeRange, reference_date: NaiveDate) -> Option<TimeRange> {
    if !raw.confident {
        return None;
    }

    if raw.start_date.is_some() || raw.end_date.is_some() {
        return Some(TimeRange {
            start: raw.start_date,
            end: raw.end_date,
            timezone: raw.timezone.clone(),
        });
    }

    if let Some(month) = raw.month {
        if !(1..=12).contains(&month) {
            return None;
        }
        let year = match raw.year {
            Some(y) => y,
            None => most_recent_year_for_month(month, reference_date),
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = last_day_of_month(year, month)?;
        return Some(TimeRange {
            start: Some(start),
            end: Some(end),
            timezone: raw.timezone.clone(),
        });
    }

    if let Some(year) = raw.year {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        return Some(TimeRange {
            start: Some(start),
            end: Some(end),
            timezone: raw.timezone.clone(),
        });
    }

    None
}

/// Year of the most recent occurrence of `month` that has started on or
/// before the reference date. "In March" asked during February 2026 means
/// March 2025; asked during March or later it means the current year.
fn most_recent_year_for_month(month: u32, reference_date: NaiveDate) -> i32 {
    if month <= reference_date.month() {
        reference_date.year()
    } else {
        reference_date.year() - 1
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn confident(raw: RawTimeRange) -> RawTimeRange {
        RawTimeRange {
            confident: true,
            ..raw
        }
    }

    #[test]
    fn unconfident_range_is_dropped() {
        let raw = RawTimeRange {
            start_date: Some(d(2025, 2, 1)),
            end_date: Some(d(2025, 2, 28)),
            confident: false,
            ..Default::default()
        };
        assert!(resolve_time_range(&raw, d(2025, 6, 1)).is_none());
    }

    #[test]
    fn explicit_dates_pass_through() {
        let raw = confident(RawTimeRange {
            start_date: Some(d(2025, 2, 1)),
            end_date: Some(d(2025, 2, 28)),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 1)).unwrap();
        assert_eq!(range.start, Some(d(2025, 2, 1)));
        assert_eq!(range.end, Some(d(2025, 2, 28)));
    }

    #[test]
    fn open_start_passes_through() {
        let raw = confident(RawTimeRange {
            start_date: Some(d(2025, 3, 3)),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 1)).unwrap();
        assert_eq!(range.start, Some(d(2025, 3, 3)));
        assert_eq!(range.end, None);
    }

    #[test]
    fn inverted_explicit_range_survives_resolution() {
        // Retrieval turns it into an empty eligible set; resolution does
        // not reject it.
        let raw = confident(RawTimeRange {
            start_date: Some(d(2025, 3, 1)),
            end_date: Some(d(2025, 2, 1)),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 1)).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn past_month_resolves_to_current_year() {
        // "in March", asked June 2025 → March 2025.
        let raw = confident(RawTimeRange {
            month: Some(3),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.start, Some(d(2025, 3, 1)));
        assert_eq!(range.end, Some(d(2025, 3, 31)));
    }

    #[test]
    fn future_month_resolves_to_previous_year() {
        // "in October", asked June 2025 → October 2024.
        let raw = confident(RawTimeRange {
            month: Some(10),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.start, Some(d(2024, 10, 1)));
        assert_eq!(range.end, Some(d(2024, 10, 31)));
    }

    #[test]
    fn current_month_resolves_to_current_year() {
        let raw = confident(RawTimeRange {
            month: Some(6),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.start, Some(d(2025, 6, 1)));
        assert_eq!(range.end, Some(d(2025, 6, 30)));
    }

    #[test]
    fn month_with_explicit_year_is_not_reanchored() {
        let raw = confident(RawTimeRange {
            month: Some(10),
            year: Some(2023),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.start, Some(d(2023, 10, 1)));
        assert_eq!(range.end, Some(d(2023, 10, 31)));
    }

    #[test]
    fn february_end_handles_leap_years() {
        let raw = confident(RawTimeRange {
            month: Some(2),
            year: Some(2024),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.end, Some(d(2024, 2, 29)));
    }

    #[test]
    fn december_end_crosses_year_boundary() {
        let raw = confident(RawTimeRange {
            month: Some(12),
            year: Some(2024),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.end, Some(d(2024, 12, 31)));
    }

    #[test]
    fn bare_year_covers_whole_year() {
        let raw = confident(RawTimeRange {
            year: Some(2024),
            ..Default::default()
        });
        let range = resolve_time_range(&raw, d(2025, 6, 15)).unwrap();
        assert_eq!(range.start, Some(d(2024, 1, 1)));
        assert_eq!(range.end, Some(d(2024, 12, 31)));
    }

    #[test]
    fn invalid_month_is_dropped() {
        let raw = confident(RawTimeRange {
            month: Some(13),
            ..Default::default()
        });
        assert!(resolve_time_range(&raw, d(2025, 6, 15)).is_none());
    }

    #[test]
    fn empty_confident_range_is_dropped() {
        // Confident but with nothing to resolve: omitted, never defaulted.
        let raw = confident(RawTimeRange::default());
        assert!(resolve_time_range(&raw, d(2025, 6, 15)).is_none());
    }
}
