//! Calendar-aligned period boundaries.
//!
//! All boundaries are time-zone naive and inclusive: a period starts at
//! `00:00:00.000` of its first day and ends at `23:59:59.999` of its last.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{BudgetPeriodKind, PeriodWindow};
use crate::errors::{ExpenseError, Result};

pub struct PeriodCalculator;

impl PeriodCalculator {
    /// Returns the budget period of `kind` that contains `anchor`.
    pub fn compute(kind: BudgetPeriodKind, anchor: NaiveDate) -> Result<PeriodWindow> {
        let (first, last) = match kind {
            BudgetPeriodKind::Daily => (anchor, anchor),
            BudgetPeriodKind::Weekly => {
                // Weeks run Monday..Sunday; a Sunday anchor closes the prior week.
                let delta = anchor.weekday().num_days_from_monday() as i64;
                let monday = anchor - Duration::days(delta);
                (monday, monday + Duration::days(6))
            }
            BudgetPeriodKind::Monthly => {
                let first = first_of_month(anchor.year(), anchor.month())?;
                (first, last_of_month(anchor.year(), anchor.month())?)
            }
            BudgetPeriodKind::Yearly => (
                calendar_date(anchor.year(), 1, 1)?,
                calendar_date(anchor.year(), 12, 31)?,
            ),
        };
        PeriodWindow::new(start_of_day(first), end_of_day(last))
    }

    /// Parses a raw period kind before computing, rejecting unknown kinds.
    pub fn compute_named(kind: &str, anchor: NaiveDate) -> Result<PeriodWindow> {
        Self::compute(kind.parse()?, anchor)
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

pub(crate) fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ExpenseError::InvalidInput(format!("{}-{:02}-{:02} is not a calendar date", year, month, day))
    })
}

pub(crate) fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    calendar_date(year, month, 1)
}

pub(crate) fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = shift_month(year, month, 1);
    Ok(first_of_month(next_year, next_month)? - Duration::days(1))
}

/// Moves a `(year, month)` pair by `months`, carrying across year boundaries.
pub(crate) fn shift_month(year: i32, month: u32, months: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + months;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}
