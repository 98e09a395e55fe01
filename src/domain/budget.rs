//! Budgets and the period kinds they can be defined over.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::errors::ExpenseError;

/// Calendar units a budget can span. Reports have their own kind set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetPeriodKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetPeriodKind::Daily => "DAILY",
            BudgetPeriodKind::Weekly => "WEEKLY",
            BudgetPeriodKind::Monthly => "MONTHLY",
            BudgetPeriodKind::Yearly => "YEARLY",
        }
    }
}

impl Default for BudgetPeriodKind {
    fn default() -> Self {
        BudgetPeriodKind::Monthly
    }
}

impl fmt::Display for BudgetPeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriodKind {
    type Err = ExpenseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(BudgetPeriodKind::Daily),
            "WEEKLY" => Ok(BudgetPeriodKind::Weekly),
            "MONTHLY" => Ok(BudgetPeriodKind::Monthly),
            "YEARLY" => Ok(BudgetPeriodKind::Yearly),
            _ => Err(ExpenseError::InvalidPeriodKind(raw.to_string())),
        }
    }
}

/// A spending limit over one calendar period, optionally tied to a category.
///
/// `current_spent` is maintained incrementally by the budget ledger as
/// expenses are created, edited, and removed; it is never derived at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `None` makes this a wildcard budget covering every category.
    pub category_id: Option<Uuid>,
    pub name: String,
    pub amount_limit: Decimal,
    pub current_spent: Decimal,
    pub period_kind: BudgetPeriodKind,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Budget {
    pub fn new(
        user_id: Uuid,
        category_id: Option<Uuid>,
        name: impl Into<String>,
        amount_limit: Decimal,
        period_kind: BudgetPeriodKind,
        period: PeriodWindow,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            category_id,
            name: name.into(),
            amount_limit,
            current_spent: Decimal::ZERO,
            period_kind,
            period_start: period.start,
            period_end: period.end,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn period(&self) -> PeriodWindow {
        PeriodWindow {
            start: self.period_start,
            end: self.period_end,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.category_id.is_none()
    }

    /// True when this budget receives contributions from expenses in `category_id`.
    pub fn covers_category(&self, category_id: Uuid) -> bool {
        self.category_id.map_or(true, |own| own == category_id)
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Budget {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_budget_kinds_case_insensitively() {
        assert_eq!(
            "weekly".parse::<BudgetPeriodKind>().unwrap(),
            BudgetPeriodKind::Weekly
        );
        assert_eq!(
            "YEARLY".parse::<BudgetPeriodKind>().unwrap(),
            BudgetPeriodKind::Yearly
        );
    }

    #[test]
    fn quarterly_is_not_a_budget_kind() {
        let err = "QUARTERLY".parse::<BudgetPeriodKind>().unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidPeriodKind(ref raw) if raw == "QUARTERLY"));
    }

    #[test]
    fn serializes_as_upper_case_tags() {
        let json = serde_json::to_string(&BudgetPeriodKind::Monthly).unwrap();
        assert_eq!(json, "\"MONTHLY\"");
    }
}
