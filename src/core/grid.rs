//! Hourly simulation grid aligned to calendar days.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::core::{HOURS_PER_DAY, HolidayCalendar, Result, dimension_mismatch};

/// Inclusive `[start, end]` date horizon sampled every hour from midnight.
///
/// Hour `h` of the grid belongs to day `h / 24`; days never overlap and always start at
/// 00:00 of their calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyGrid {
    start: NaiveDate,
    days: usize,
}

impl HourlyGrid {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(dimension_mismatch(format!(
                "end date {end} precedes start date {start}"
            )));
        }
        let days = (end - start).num_days() as usize + 1;
        Ok(Self { start, days })
    }

    /// Grid of `days` whole days starting at `start`.
    pub fn from_days(start: NaiveDate, days: usize) -> Result<Self> {
        if days == 0 {
            return Err(dimension_mismatch("horizon must contain at least one day"));
        }
        Ok(Self { start, days })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.days as i64 - 1)
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn hours(&self) -> usize {
        self.days * HOURS_PER_DAY
    }

    pub fn date(&self, day: usize) -> NaiveDate {
        self.start + Duration::days(day as i64)
    }

    pub fn timestamp(&self, hour: usize) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN) + Duration::hours(hour as i64)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.hours()).map(|h| self.timestamp(h))
    }

    /// Trial-invariant predictor columns, computed once per grid.
    pub fn calendar_columns(&self, holidays: &HolidayCalendar) -> CalendarColumns {
        let hours = self.hours();
        let mut hour_of_day = Vec::with_capacity(hours);
        let mut day_of_week = Vec::with_capacity(hours);
        let mut is_working_day = Vec::with_capacity(hours);

        for day in 0..self.days {
            let date = self.date(day);
            let dow = date.weekday().number_from_sunday() as f64;
            let working = if holidays.is_working_day(date) { 1.0 } else { 0.0 };
            for hour in 0..HOURS_PER_DAY {
                hour_of_day.push(hour as f64);
                day_of_week.push(dow);
                is_working_day.push(working);
            }
        }

        CalendarColumns {
            hour_of_day,
            day_of_week,
            is_working_day,
        }
    }

    /// Seasonal feature rows `[days_since_epoch, hour_of_day, day_of_year]`.
    pub fn seasonal_rows(&self) -> Vec<[f64; 3]> {
        // NaiveDate's default is 1970-01-01.
        let epoch = NaiveDate::default().and_time(NaiveTime::MIN);
        self.timestamps()
            .map(|ts| {
                let hour = ts.hour() as f64;
                let days = (ts - epoch).num_hours() as f64 / HOURS_PER_DAY as f64;
                [days, hour, ts.ordinal() as f64]
            })
            .collect()
    }
}

/// Hour-by-hour calendar predictors.
///
/// `day_of_week` runs 1 = Sunday through 7 = Saturday.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarColumns {
    pub hour_of_day: Vec<f64>,
    pub day_of_week: Vec<f64>,
    pub is_working_day: Vec<f64>,
}
