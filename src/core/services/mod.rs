pub mod budget_service;
pub mod category_service;
pub mod expense_service;
pub mod report_service;

pub use budget_service::{BudgetChanges, BudgetOverview, BudgetService, NewBudget};
pub use category_service::CategoryService;
pub use expense_service::ExpenseService;
pub use report_service::{ReportRequest, ReportService};

use rust_decimal::Decimal;

use crate::utils::money::{is_storable_amount, AMOUNT_SCALE, MAX_AMOUNT};

pub type ServiceResult<T> = crate::errors::Result<T>;

/// Longest accepted budget or category name, in characters.
pub(crate) const MAX_NAME_CHARS: usize = 100;

pub(crate) fn validate_name(entity: &str, candidate: &str) -> ServiceResult<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::ExpenseError::InvalidInput(format!(
            "{} name is required",
            entity
        )));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(crate::errors::ExpenseError::InvalidInput(format!(
            "{} name must be at most {} characters",
            entity, MAX_NAME_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// Accepts positive money values up to [`MAX_AMOUNT`] with at most two decimals.
pub(crate) fn validate_money(label: &str, amount: Decimal) -> ServiceResult<()> {
    if is_storable_amount(amount) {
        return Ok(());
    }
    Err(crate::errors::ExpenseError::InvalidInput(format!(
        "{} must be positive and at most {} with {} decimal places, got {}",
        label, MAX_AMOUNT, AMOUNT_SCALE, amount
    )))
}
