use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ExpenseError, Result};

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Entities owned by exactly one user.
pub trait Owned {
    fn owner(&self) -> Uuid;
}

/// Inclusive `[start, end]` window used by budgets and reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(ExpenseError::InvalidInput(format!(
                "period start {} is after period end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn overlaps(&self, other: &PeriodWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of calendar days touched by the window, counting both ends.
    pub fn calendar_days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}
