//! Keeps budget spend in step with the expense lifecycle.
//!
//! Every function here works on an open repository handle and leaves
//! committing to the caller, so an error anywhere discards the expense write
//! together with every budget delta posted before it.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{BudgetContext, Category, Expense, ExpenseChanges, NewExpense};
use crate::errors::{ExpenseError, Result};
use crate::ledger::{BudgetLedger, BudgetMatcher};
use crate::storage::Repository;

pub struct ExpenseReconciler;

impl ExpenseReconciler {
    /// Persists a new expense and adds its amount to every matching budget.
    pub fn create<R>(
        repo: &mut R,
        user_id: Uuid,
        input: NewExpense,
        now: NaiveDateTime,
    ) -> Result<Expense>
    where
        R: Repository + ?Sized,
    {
        require_category(repo, user_id, input.category_id)?;
        let expense = Expense::from_new(user_id, input, now);
        repo.insert_expense(expense.clone())?;
        contribute(repo, user_id, &expense.budget_context(), Sign::Add)?;
        Ok(expense)
    }

    /// Applies `changes`. When the [`BudgetContext`] moved, the old
    /// contribution is reversed and the new one posted as separate deltas.
    pub fn update<R>(
        repo: &mut R,
        user_id: Uuid,
        expense_id: Uuid,
        changes: ExpenseChanges,
        now: NaiveDateTime,
    ) -> Result<Expense>
    where
        R: Repository + ?Sized,
    {
        let mut expense = fetch(repo, user_id, expense_id)?;
        if let Some(category_id) = changes.category_id {
            require_category(repo, user_id, category_id)?;
        }
        let before = expense.budget_context();
        expense.apply(changes, now);
        let after = expense.budget_context();
        repo.update_expense(&expense)?;

        if before == after {
            return Ok(expense);
        }
        contribute(repo, user_id, &before, Sign::Reverse)?;
        contribute(repo, user_id, &after, Sign::Add)?;
        Ok(expense)
    }

    /// Reverses the expense's contribution, then removes it.
    pub fn delete<R>(repo: &mut R, user_id: Uuid, expense_id: Uuid) -> Result<Expense>
    where
        R: Repository + ?Sized,
    {
        let expense = fetch(repo, user_id, expense_id)?;
        contribute(repo, user_id, &expense.budget_context(), Sign::Reverse)?;
        repo.delete_expense(user_id, expense_id)?;
        Ok(expense)
    }
}

#[derive(Clone, Copy)]
enum Sign {
    Add,
    Reverse,
}

fn contribute<R>(repo: &mut R, user_id: Uuid, context: &BudgetContext, sign: Sign) -> Result<()>
where
    R: Repository + ?Sized,
{
    let budgets = BudgetMatcher::find_active_budgets(
        &*repo,
        user_id,
        context.category_id,
        context.expense_date,
    )?;
    let delta = match sign {
        Sign::Add => context.amount,
        Sign::Reverse => -context.amount,
    };
    if delta != Decimal::ZERO {
        BudgetLedger::post(repo, &budgets, delta)?;
    }
    Ok(())
}

fn fetch<R>(repo: &R, user_id: Uuid, expense_id: Uuid) -> Result<Expense>
where
    R: Repository + ?Sized,
{
    repo.expense(user_id, expense_id)?
        .ok_or_else(|| ExpenseError::not_found("Expense", expense_id))
}

/// The category must exist and be visible to the user.
pub(crate) fn require_category<R>(repo: &R, user_id: Uuid, category_id: Uuid) -> Result<Category>
where
    R: Repository + ?Sized,
{
    repo.category(category_id)?
        .filter(|category| category.is_visible_to(user_id))
        .ok_or_else(|| ExpenseError::not_found("Category", category_id))
}
