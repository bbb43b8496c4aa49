//! Business-day counting and holiday calendars.
//!
//! The calculator holds no holiday data of its own. Callers pass a
//! [`HolidayLookup`], which can be a persisted [`HolidayCalendar`], a closure,
//! or [`NoHolidays`].

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while counting days.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The end of the range comes before its start.
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Answers whether a given date is a holiday.
pub trait HolidayLookup {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl<F> HolidayLookup for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// A lookup with no holidays at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayLookup for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// A single public or local holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: String,
    pub date: NaiveDate,
    pub name: String,
    /// Regional/local holiday rather than a national one.
    pub is_local: bool,
}

/// A named set of holidays, typically one per country or region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    pub id: String,
    pub name: String,
    pub country: String,
    pub region: Option<String>,
    pub locality: Option<String>,
    pub holidays: Vec<Holiday>,
}

impl HolidayCalendar {
    /// Creates an empty calendar.
    pub fn new(id: impl Into<String>, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: country.into(),
            region: None,
            locality: None,
            holidays: Vec::new(),
        }
    }

    /// Returns the holiday falling on `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.iter().find(|holiday| holiday.date == date)
    }

    pub fn add_holiday(&mut self, holiday: Holiday) {
        self.holidays.push(holiday);
    }

    /// Removes the holiday with the given ID. Returns `false` if none matched.
    pub fn remove_holiday(&mut self, holiday_id: &str) -> bool {
        let before = self.holidays.len();
        self.holidays.retain(|holiday| holiday.id != holiday_id);
        self.holidays.len() != before
    }
}

impl HolidayLookup for HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_on(date).is_some()
    }
}

/// Returns `true` for Saturdays and Sundays.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts the days in `[start, end]` that qualify for a vacation request.
///
/// Both ends are inclusive. A day counts when
/// `(include_weekends || !weekend) && (include_holidays || !holiday)`.
pub fn count_days<H>(
    start: NaiveDate,
    end: NaiveDate,
    include_weekends: bool,
    include_holidays: bool,
    holidays: &H,
) -> Result<u32, RangeError>
where
    H: HolidayLookup + ?Sized,
{
    if end < start {
        return Err(RangeError::InvalidRange { start, end });
    }

    let mut count = 0;
    for day in start.iter_days().take_while(|day| *day <= end) {
        let weekday_ok = include_weekends || !is_weekend(day);
        let holiday_ok = include_holidays || !holidays.is_holiday(day);
        if weekday_ok && holiday_ok {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn christmas_calendar() -> HolidayCalendar {
        let mut calendar = HolidayCalendar::new("es", "Spain", "ES");
        calendar.add_holiday(Holiday {
            id: "xmas".to_string(),
            date: date(2024, 12, 25),
            name: "Christmas Day".to_string(),
            is_local: false,
        });
        calendar
    }

    #[test]
    fn weekdays_only_over_a_working_week() {
        // Mon 2024-06-03 .. Fri 2024-06-07
        let count = count_days(date(2024, 6, 3), date(2024, 6, 7), false, false, &NoHolidays);
        assert_eq!(count, Ok(5));
    }

    #[test]
    fn single_day_range_is_inclusive() {
        let count = count_days(date(2024, 6, 3), date(2024, 6, 3), false, false, &NoHolidays);
        assert_eq!(count, Ok(1));
    }

    #[test]
    fn weekends_excluded_unless_requested() {
        // Mon 2024-06-03 .. Sun 2024-06-09
        let start = date(2024, 6, 3);
        let end = date(2024, 6, 9);
        assert_eq!(count_days(start, end, false, false, &NoHolidays), Ok(5));
        assert_eq!(count_days(start, end, true, false, &NoHolidays), Ok(7));
    }

    #[test]
    fn holidays_excluded_unless_requested() {
        // Mon 2024-12-23 .. Fri 2024-12-27, Christmas on Wednesday
        let calendar = christmas_calendar();
        let start = date(2024, 12, 23);
        let end = date(2024, 12, 27);
        assert_eq!(count_days(start, end, false, false, &calendar), Ok(4));
        assert_eq!(count_days(start, end, false, true, &calendar), Ok(5));
    }

    #[test]
    fn weekend_holiday_counts_once_when_both_included() {
        // Sat 2024-06-08 is a holiday in this lookup
        let lookup = |day: NaiveDate| day == date(2024, 6, 8);
        let start = date(2024, 6, 8);
        let end = date(2024, 6, 9);
        assert_eq!(count_days(start, end, true, true, &lookup), Ok(2));
        assert_eq!(count_days(start, end, true, false, &lookup), Ok(1));
        assert_eq!(count_days(start, end, false, true, &lookup), Ok(0));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = count_days(date(2024, 6, 7), date(2024, 6, 3), false, false, &NoHolidays)
            .unwrap_err();
        assert_eq!(
            err,
            RangeError::InvalidRange {
                start: date(2024, 6, 7),
                end: date(2024, 6, 3),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid date range: end 2024-06-03 is before start 2024-06-07"
        );
    }

    #[test]
    fn range_crossing_year_boundary() {
        // Mon 2024-12-30 .. Fri 2025-01-03
        let count = count_days(date(2024, 12, 30), date(2025, 1, 3), false, false, &NoHolidays);
        assert_eq!(count, Ok(5));
    }

    #[test]
    fn remove_holiday_reports_whether_anything_matched() {
        let mut calendar = christmas_calendar();
        assert!(calendar.is_holiday(date(2024, 12, 25)));
        assert!(!calendar.remove_holiday("missing"));
        assert!(calendar.remove_holiday("xmas"));
        assert!(!calendar.is_holiday(date(2024, 12, 25)));
    }

    #[test]
    fn holiday_on_returns_matching_entry() {
        let calendar = christmas_calendar();
        let holiday = calendar.holiday_on(date(2024, 12, 25)).unwrap();
        assert_eq!(holiday.name, "Christmas Day");
        assert!(calendar.holiday_on(date(2024, 12, 24)).is_none());
    }
}
