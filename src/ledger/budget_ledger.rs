//! Applies signed spend deltas to budgets.

use rust_decimal::Decimal;

use crate::domain::Budget;
use crate::errors::{ExpenseError, Result};
use crate::storage::Repository;

pub struct BudgetLedger;

impl BudgetLedger {
    /// Returns `budget` with `delta` added to its spend, floored at zero.
    ///
    /// A floor hit means more was reversed than was ever recorded; it is logged
    /// so the drift can be repaired with a recompute. A sum outside the
    /// decimal range is an error and leaves the budget as it was.
    pub fn apply_delta(budget: &Budget, delta: Decimal) -> Result<Budget> {
        let raw = budget.current_spent.checked_add(delta).ok_or_else(|| {
            tracing::error!(
                budget_id = %budget.id,
                current_spent = %budget.current_spent,
                delta = %delta,
                "budget spend overflowed"
            );
            ExpenseError::overflow("posting budget spend")
        })?;
        let mut updated = budget.clone();
        if raw < Decimal::ZERO {
            tracing::warn!(
                budget_id = %budget.id,
                current_spent = %budget.current_spent,
                delta = %delta,
                "budget spend clamped at zero"
            );
            updated.current_spent = Decimal::ZERO;
        } else {
            updated.current_spent = raw;
        }
        Ok(updated)
    }

    /// Applies `delta` to each budget and writes it through `repo`, one
    /// operation per budget.
    pub fn post<R>(repo: &mut R, budgets: &[Budget], delta: Decimal) -> Result<Vec<Budget>>
    where
        R: Repository + ?Sized,
    {
        let mut updated = Vec::with_capacity(budgets.len());
        for budget in budgets {
            let next = Self::apply_delta(budget, delta)?;
            tracing::debug!(
                budget_id = %budget.id,
                delta = %delta,
                spent = %next.current_spent,
                "posted budget delta"
            );
            repo.update_budget(&next)?;
            updated.push(next);
        }
        Ok(updated)
    }
}
