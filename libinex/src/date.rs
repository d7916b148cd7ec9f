use chrono::{Datelike, NaiveDate};
use std::fmt;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Calendar date of a record, restricted to years `1..=9999`.
///
/// Ordering is chronological, so "most recent first" is simply descending
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Build a date from its parts, `None` when the parts don't name a real
    /// day within the supported year range.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Date> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl From<Date> for NaiveDate {
    fn from(date: Date) -> NaiveDate {
        date.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year(),
            self.month(),
            self.day()
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::date::Date;

    #[test]
    fn test_leap_years() {
        assert!(Date::from_ymd(2024, 2, 29).is_some());
        assert!(Date::from_ymd(2000, 2, 29).is_some());
        assert!(Date::from_ymd(1900, 2, 29).is_none());
        assert!(Date::from_ymd(2023, 2, 29).is_none());
    }

    #[test]
    fn test_year_range() {
        assert!(Date::from_ymd(0, 1, 1).is_none());
        assert!(Date::from_ymd(1, 1, 1).is_some());
        assert!(Date::from_ymd(9999, 12, 31).is_some());
        assert!(Date::from_ymd(10000, 1, 1).is_none());
    }

    #[test]
    fn test_month_lengths() {
        assert!(Date::from_ymd(2024, 4, 31).is_none());
        assert!(Date::from_ymd(2024, 12, 31).is_some());
        assert!(Date::from_ymd(2024, 13, 1).is_none());
        assert!(Date::from_ymd(2024, 1, 0).is_none());
    }

    #[test]
    fn test_display_pads_fields() {
        let date = Date::from_ymd(7, 3, 9).unwrap();
        assert_eq!(format!("{}", date), "0007-03-09");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let older = Date::from_ymd(2024, 5, 1).unwrap();
        let newer = Date::from_ymd(2024, 5, 2).unwrap();
        assert!(newer > older);
        assert!(Date::from_ymd(2023, 12, 31).unwrap() < older);
    }
}
