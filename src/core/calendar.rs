//! Holiday calendar used for the working-day predictor column.
//!
//! A day is a working day when it falls Monday through Friday and is not listed as a
//! holiday. [`HolidayCalendar::nerc`] builds the six NERC off-peak holidays observed by
//! US power markets; any other set can be supplied explicitly.
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Creates an empty calendar (weekends only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calendar preloaded with holidays.
    pub fn with_holidays<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// NERC holidays for every year in `start_year..=end_year`.
    ///
    /// New Year's Day, Memorial Day, Independence Day, Labor Day, Thanksgiving and
    /// Christmas. Fixed-date holidays falling on Sunday move to Monday; Saturday
    /// holidays are not shifted, matching NERC practice.
    pub fn nerc(start_year: i32, end_year: i32) -> Self {
        let mut holidays = BTreeSet::new();
        for year in start_year..=end_year {
            holidays.insert(sunday_to_monday(year, 1, 1));
            holidays.insert(last_weekday_of_month(year, 5, Weekday::Mon));
            holidays.insert(sunday_to_monday(year, 7, 4));
            holidays.insert(nth_weekday_of_month(year, 9, Weekday::Mon, 1));
            holidays.insert(nth_weekday_of_month(year, 11, Weekday::Thu, 4));
            holidays.insert(sunday_to_monday(year, 12, 25));
        }
        Self { holidays }
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }
}

fn sunday_to_monday(year: i32, month: u32, day: u32) -> NaiveDate {
    let actual = NaiveDate::from_ymd_opt(year, month, day).expect("valid fixed holiday date");
    if actual.weekday() == Weekday::Sun {
        actual + Duration::days(1)
    } else {
        actual
    }
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first-of-month date");
    let first_w = first.weekday().num_days_from_monday() as i32;
    let target_w = weekday.num_days_from_monday() as i32;
    let offset = (7 + target_w - first_w) % 7;
    let day = 1 + offset as u32 + 7 * (n - 1);
    NaiveDate::from_ymd_opt(year, month, day).expect("valid nth weekday date")
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid first-of-month date");
    let last = next_month - Duration::days(1);
    let last_w = last.weekday().num_days_from_monday() as i32;
    let target_w = weekday.num_days_from_monday() as i32;
    let offset = (7 + last_w - target_w) % 7;
    last - Duration::days(offset as i64)
}
