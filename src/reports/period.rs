//! Report windows.
//!
//! Monthly, quarterly and yearly reports always cover the previous closed
//! unit; weekly reports are a trailing seven-day window ending at `now`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{PeriodWindow, ReportPeriodKind};
use crate::errors::{ExpenseError, Result};
use crate::ledger::period::{
    calendar_date, end_of_day, first_of_month, last_of_month, shift_month, start_of_day,
};

/// Caller-supplied bounds for a `CUSTOM` report.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339. A date-only end
/// covers that whole day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomPeriod {
    pub start: String,
    pub end: String,
}

impl CustomPeriod {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

pub struct ReportPeriodResolver;

impl ReportPeriodResolver {
    pub fn resolve(
        kind: ReportPeriodKind,
        custom: Option<&CustomPeriod>,
        now: NaiveDateTime,
    ) -> Result<PeriodWindow> {
        let today = now.date();
        match kind {
            ReportPeriodKind::Weekly => PeriodWindow::new(now - Duration::days(7), now),
            ReportPeriodKind::Monthly => {
                let (year, month) = shift_month(today.year(), today.month(), -1);
                Self::whole_days(first_of_month(year, month)?, last_of_month(year, month)?)
            }
            ReportPeriodKind::Quarterly => {
                let current_quarter_month = (today.month0() / 3) * 3 + 1;
                let (year, month) = shift_month(today.year(), current_quarter_month, -3);
                let (end_year, end_month) = shift_month(year, month, 2);
                Self::whole_days(
                    first_of_month(year, month)?,
                    last_of_month(end_year, end_month)?,
                )
            }
            ReportPeriodKind::Yearly => {
                let year = today.year() - 1;
                Self::whole_days(calendar_date(year, 1, 1)?, calendar_date(year, 12, 31)?)
            }
            ReportPeriodKind::Custom => {
                let custom = custom.ok_or(ExpenseError::MissingCustomPeriod)?;
                let start = parse_bound(&custom.start, Bound::Start)?;
                let end = parse_bound(&custom.end, Bound::End)?;
                PeriodWindow::new(start, end)
            }
        }
    }

    fn whole_days(first: NaiveDate, last: NaiveDate) -> Result<PeriodWindow> {
        PeriodWindow::new(start_of_day(first), end_of_day(last))
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(raw: &str, bound: Bound) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(match bound {
            Bound::Start => start_of_day(date),
            Bound::End => end_of_day(date),
        });
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(at);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.naive_local());
    }
    Err(ExpenseError::InvalidInput(format!(
        "`{}` is not a valid date",
        raw
    )))
}
