//! Date bounds of relative intervals
//!
//! Weeks start on Monday. Every interval is half-open: `lower <= date < upper`.

use crate::criteria::IntervalType;
use crate::error::{FilterError, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Bounds of an interval, `None` meaning unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalBounds {
    pub lower: Option<NaiveDateTime>,
    pub upper: Option<NaiveDateTime>,
}

impl IntervalBounds {
    fn between(lower: NaiveDate, upper: NaiveDate) -> Self {
        Self {
            lower: Some(lower.and_time(NaiveTime::MIN)),
            upper: Some(upper.and_time(NaiveTime::MIN)),
        }
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.lower.map_or(true, |lower| value >= lower)
            && self.upper.map_or(true, |upper| value < upper)
    }
}

/// Calendar anchors derived from the reference day
struct Anchors {
    today: NaiveDate,
    first_day_of_this_week: NaiveDate,
    first_day_of_next_week: NaiveDate,
    last_day_of_next_week: NaiveDate,
    first_day_of_last_week: NaiveDate,
    first_day_of_this_month: NaiveDate,
    first_day_of_next_month: NaiveDate,
    first_day_of_this_year: NaiveDate,
    first_day_of_next_year: NaiveDate,
}

fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.ok_or_else(|| out_of_range(date))
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        FilterError::Evaluation(format!("date {}-{}-{} out of range", year, month, day))
    })
}

fn out_of_range(date: NaiveDate) -> FilterError {
    FilterError::Evaluation(format!("interval around {} out of range", date))
}

impl Anchors {
    fn new(today: NaiveDate) -> Result<Self> {
        let first_day_of_this_week =
            shift(today, -i64::from(today.weekday().num_days_from_monday()))?;
        let first_day_of_next_week = shift(first_day_of_this_week, 7)?;
        let (next_month_year, next_month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };

        Ok(Self {
            today,
            first_day_of_this_week,
            first_day_of_next_week,
            last_day_of_next_week: shift(first_day_of_next_week, 6)?,
            first_day_of_last_week: shift(first_day_of_this_week, -7)?,
            first_day_of_this_month: ymd(today.year(), today.month(), 1)?,
            first_day_of_next_month: ymd(next_month_year, next_month, 1)?,
            first_day_of_this_year: ymd(today.year(), 1, 1)?,
            first_day_of_next_year: ymd(today.year() + 1, 1, 1)?,
        })
    }
}

/// Compute the bounds of `interval` relative to the day `today`
pub fn interval_bounds(interval: IntervalType, today: NaiveDate) -> Result<IntervalBounds> {
    let a = Anchors::new(today)?;
    let day = |n: i64| shift(a.today, n);

    let bounds = match interval {
        IntervalType::IntervalToday => IntervalBounds::between(a.today, day(1)?),
        IntervalType::IntervalTomorrow => IntervalBounds::between(day(1)?, day(2)?),
        IntervalType::IntervalYesterday => IntervalBounds::between(day(-1)?, a.today),
        IntervalType::IntervalEarlierThisWeek => {
            IntervalBounds::between(a.first_day_of_this_week, a.today)
        }
        IntervalType::IntervalLaterThisWeek => {
            IntervalBounds::between(day(2)?, a.first_day_of_next_week)
        }
        IntervalType::IntervalNextWeek => IntervalBounds::between(
            a.first_day_of_next_week,
            shift(a.last_day_of_next_week, 1)?,
        ),
        IntervalType::IntervalLastWeek => {
            IntervalBounds::between(a.first_day_of_last_week, a.first_day_of_this_week)
        }
        IntervalType::IntervalEarlierThisMonth => {
            IntervalBounds::between(a.first_day_of_this_month, a.first_day_of_last_week)
        }
        IntervalType::IntervalLaterThisMonth => IntervalBounds::between(
            shift(a.last_day_of_next_week, 1)?,
            a.first_day_of_next_month,
        ),
        IntervalType::IntervalEarlierThisYear => {
            IntervalBounds::between(a.first_day_of_this_year, a.first_day_of_this_month)
        }
        IntervalType::IntervalLaterThisYear => {
            IntervalBounds::between(a.first_day_of_next_month, a.first_day_of_next_year)
        }
        IntervalType::IntervalPriorThisYear => IntervalBounds {
            lower: None,
            upper: Some(a.first_day_of_this_year.and_time(NaiveTime::MIN)),
        },
        IntervalType::IntervalBeyondThisYear => IntervalBounds {
            lower: Some(a.first_day_of_next_year.and_time(NaiveTime::MIN)),
            upper: None,
        },
    };
    Ok(bounds)
}
