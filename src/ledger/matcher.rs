//! Finds the budgets an expense contributes to.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::Budget;
use crate::errors::Result;
use crate::storage::Repository;

pub struct BudgetMatcher;

impl BudgetMatcher {
    /// Active budgets owned by `user_id` whose period contains `on` and whose
    /// category is `category_id` or the wildcard. Several budgets may match.
    pub fn find_active_budgets<R>(
        repo: &R,
        user_id: Uuid,
        category_id: Uuid,
        on: NaiveDateTime,
    ) -> Result<Vec<Budget>>
    where
        R: Repository + ?Sized,
    {
        repo.active_budgets_on(user_id, category_id, on)
    }

    pub fn matches(budget: &Budget, user_id: Uuid, category_id: Uuid, on: NaiveDateTime) -> bool {
        budget.user_id == user_id
            && budget.is_active
            && budget.period().contains(on)
            && budget.covers_category(category_id)
    }

    /// In-memory form of the selection rule, used by backends without a query engine.
    pub fn select<'a>(
        budgets: &'a [Budget],
        user_id: Uuid,
        category_id: Uuid,
        on: NaiveDateTime,
    ) -> impl Iterator<Item = &'a Budget> + 'a {
        budgets
            .iter()
            .filter(move |budget| Self::matches(budget, user_id, category_id, on))
    }
}
