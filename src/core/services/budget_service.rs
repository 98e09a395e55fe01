//! Budget administration: creation with overlap checks, progress overviews,
//! and spend repair.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::services::{validate_money, validate_name, ServiceResult};
use crate::domain::{Budget, BudgetPeriodKind, PeriodWindow};
use crate::errors::ExpenseError;
use crate::ledger::reconciler::require_category;
use crate::ledger::PeriodCalculator;
use crate::storage::{in_transaction, read_only, Repository, StorageBackend};
use crate::utils::money::{checked_sum, percentage};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBudget {
    pub name: String,
    /// `None` creates a wildcard budget.
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub amount_limit: Decimal,
    #[serde(default)]
    pub period_kind: BudgetPeriodKind,
    /// Anchor date for the period; defaults to today.
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
}

impl NewBudget {
    pub fn new(name: impl Into<String>, amount_limit: Decimal, period_kind: BudgetPeriodKind) -> Self {
        Self {
            name: name.into(),
            category_id: None,
            amount_limit,
            period_kind,
            period_start: None,
        }
    }

    pub fn for_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn anchored_at(mut self, anchor: NaiveDate) -> Self {
        self.period_start = Some(anchor);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BudgetChanges {
    pub name: Option<String>,
    pub amount_limit: Option<Decimal>,
    /// `Some(None)` turns the budget into a wildcard.
    pub category_id: Option<Option<Uuid>>,
    pub period_kind: Option<BudgetPeriodKind>,
    pub period_start: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// A budget with its progress figures as of a given instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetOverview {
    pub budget: Budget,
    /// Capped at 100.
    pub progress_percentage: f64,
    /// Floored at zero.
    pub remaining_amount: Decimal,
    pub days_remaining: i64,
}

impl BudgetOverview {
    pub fn at(budget: Budget, now: NaiveDateTime) -> Self {
        let progress_percentage = if budget.amount_limit > Decimal::ZERO {
            percentage(budget.current_spent, budget.amount_limit).min(100.0)
        } else {
            0.0
        };
        let remaining_amount = (budget.amount_limit - budget.current_spent).max(Decimal::ZERO);
        let millis_left = (budget.period_end - now).num_milliseconds();
        let days_remaining = if millis_left > 0 {
            (millis_left + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
        } else {
            0
        };
        Self {
            budget,
            progress_percentage,
            remaining_amount,
            days_remaining,
        }
    }
}

pub struct BudgetService;

impl BudgetService {
    pub fn create(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        input: NewBudget,
        now: NaiveDateTime,
    ) -> ServiceResult<Budget> {
        let name = validate_name("Budget", &input.name)?;
        validate_limit(input.amount_limit)?;
        let anchor = input.period_start.unwrap_or_else(|| now.date());
        let period = PeriodCalculator::compute(input.period_kind, anchor)?;

        let budget = in_transaction(storage, |tx| {
            if let Some(category_id) = input.category_id {
                require_category(&*tx, user_id, category_id)?;
                ensure_no_overlap(&*tx, user_id, category_id, &period, None)?;
            }
            let budget = Budget::new(
                user_id,
                input.category_id,
                name,
                input.amount_limit,
                input.period_kind,
                period,
                now,
            );
            tx.insert_budget(budget.clone())?;
            Ok(budget)
        })?;
        tracing::info!(
            budget_id = %budget.id,
            user_id = %user_id,
            period_start = %budget.period_start,
            period_end = %budget.period_end,
            "budget created"
        );
        Ok(budget)
    }

    pub fn get(storage: &dyn StorageBackend, user_id: Uuid, budget_id: Uuid) -> ServiceResult<Budget> {
        read_only(storage, |tx| fetch(tx, user_id, budget_id))
    }

    /// All of the user's budgets, most recent period first.
    pub fn list(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        now: NaiveDateTime,
    ) -> ServiceResult<Vec<BudgetOverview>> {
        let mut budgets = read_only(storage, |tx| tx.budgets_for_user(user_id))?;
        budgets.sort_by(|a, b| {
            b.period_start
                .cmp(&a.period_start)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(budgets
            .into_iter()
            .map(|budget| BudgetOverview::at(budget, now))
            .collect())
    }

    /// Edits a budget. `current_spent` is left as is; use
    /// [`BudgetService::recompute_spent`] after moving a period or category.
    pub fn update(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        budget_id: Uuid,
        changes: BudgetChanges,
        now: NaiveDateTime,
    ) -> ServiceResult<Budget> {
        if let Some(limit) = changes.amount_limit {
            validate_limit(limit)?;
        }
        let name = changes
            .name
            .as_deref()
            .map(|name| validate_name("Budget", name))
            .transpose()?;

        in_transaction(storage, |tx| {
            let mut budget = fetch(&*tx, user_id, budget_id)?;
            if let Some(name) = name {
                budget.name = name;
            }
            if let Some(limit) = changes.amount_limit {
                budget.amount_limit = limit;
            }
            if let Some(category_id) = changes.category_id {
                if let Some(id) = category_id {
                    require_category(&*tx, user_id, id)?;
                }
                budget.category_id = category_id;
            }
            if changes.period_kind.is_some() || changes.period_start.is_some() {
                let kind = changes.period_kind.unwrap_or(budget.period_kind);
                let anchor = changes
                    .period_start
                    .unwrap_or_else(|| budget.period_start.date());
                let period = PeriodCalculator::compute(kind, anchor)?;
                budget.period_kind = kind;
                budget.period_start = period.start;
                budget.period_end = period.end;
            }
            if let Some(active) = changes.is_active {
                budget.is_active = active;
            }
            if let (Some(category_id), true) = (budget.category_id, budget.is_active) {
                ensure_no_overlap(&*tx, user_id, category_id, &budget.period(), Some(budget.id))?;
            }
            budget.updated_at = now;
            tx.update_budget(&budget)?;
            Ok(budget)
        })
    }

    pub fn delete(storage: &dyn StorageBackend, user_id: Uuid, budget_id: Uuid) -> ServiceResult<()> {
        in_transaction(storage, |tx| tx.delete_budget(user_id, budget_id))?;
        tracing::info!(budget_id = %budget_id, user_id = %user_id, "budget deleted");
        Ok(())
    }

    /// Rebuilds `current_spent` from the expenses that currently match the
    /// budget's category and period.
    pub fn recompute_spent(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        budget_id: Uuid,
        now: NaiveDateTime,
    ) -> ServiceResult<Budget> {
        in_transaction(storage, |tx| {
            let mut budget = fetch(&*tx, user_id, budget_id)?;
            let period = budget.period();
            let spent = checked_sum(
                tx.expenses_between(user_id, &period)?
                    .iter()
                    .filter(|expense| budget.covers_category(expense.category_id))
                    .map(|expense| expense.amount),
            )
            .ok_or_else(|| ExpenseError::overflow("recomputing budget spend"))?;
            if spent != budget.current_spent {
                tracing::warn!(
                    budget_id = %budget.id,
                    recorded = %budget.current_spent,
                    actual = %spent,
                    "budget spend drifted; repaired"
                );
            }
            budget.current_spent = spent;
            budget.updated_at = now;
            tx.update_budget(&budget)?;
            Ok(budget)
        })
    }
}

fn fetch<R>(repo: &R, user_id: Uuid, budget_id: Uuid) -> ServiceResult<Budget>
where
    R: Repository + ?Sized,
{
    repo.budget(user_id, budget_id)?
        .ok_or_else(|| ExpenseError::not_found("Budget", budget_id))
}

fn validate_limit(limit: Decimal) -> ServiceResult<()> {
    validate_money("budget amount limit", limit)
}

fn ensure_no_overlap<R>(
    repo: &R,
    user_id: Uuid,
    category_id: Uuid,
    period: &PeriodWindow,
    exclude: Option<Uuid>,
) -> ServiceResult<()>
where
    R: Repository + ?Sized,
{
    if let Some(existing) = repo.overlapping_budget(user_id, category_id, period, exclude)? {
        return Err(ExpenseError::Conflict(format!(
            "budget `{}` already covers this category from {} to {}",
            existing.name, existing.period_start, existing.period_end
        )));
    }
    Ok(())
}
