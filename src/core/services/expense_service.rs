//! Business logic for recording, editing, and removing expenses.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::services::{validate_money, ServiceResult};
use crate::domain::{Expense, ExpenseChanges, NewExpense};
use crate::errors::ExpenseError;
use crate::ledger::ExpenseReconciler;
use crate::storage::{in_transaction, read_only, Repository, StorageBackend};

/// Validated expense operations; every mutation runs in one transaction with
/// its budget reconciliation.
pub struct ExpenseService;

impl ExpenseService {
    pub fn create(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        input: NewExpense,
        now: NaiveDateTime,
    ) -> ServiceResult<Expense> {
        validate_amount(input.amount)?;
        if let Some(currency) = &input.currency {
            validate_currency(currency)?;
        }
        let expense = in_transaction(storage, |tx| {
            ExpenseReconciler::create(tx, user_id, input, now)
        })?;
        tracing::info!(
            expense_id = %expense.id,
            user_id = %user_id,
            amount = %expense.amount,
            "expense recorded"
        );
        Ok(expense)
    }

    pub fn update(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        expense_id: Uuid,
        changes: ExpenseChanges,
        now: NaiveDateTime,
    ) -> ServiceResult<Expense> {
        if let Some(amount) = changes.amount {
            validate_amount(amount)?;
        }
        if let Some(currency) = &changes.currency {
            validate_currency(currency)?;
        }
        let expense = in_transaction(storage, |tx| {
            ExpenseReconciler::update(tx, user_id, expense_id, changes, now)
        })?;
        tracing::info!(expense_id = %expense.id, user_id = %user_id, "expense updated");
        Ok(expense)
    }

    /// Removes the expense and returns it as it was.
    pub fn delete(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> ServiceResult<Expense> {
        let expense = in_transaction(storage, |tx| {
            ExpenseReconciler::delete(tx, user_id, expense_id)
        })?;
        tracing::info!(expense_id = %expense.id, user_id = %user_id, "expense deleted");
        Ok(expense)
    }

    pub fn get(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> ServiceResult<Expense> {
        read_only(storage, |tx| {
            tx.expense(user_id, expense_id)?
                .ok_or_else(|| ExpenseError::not_found("Expense", expense_id))
        })
    }

    /// The user's expenses, newest first.
    pub fn list(storage: &dyn StorageBackend, user_id: Uuid) -> ServiceResult<Vec<Expense>> {
        let mut expenses = read_only(storage, |tx| tx.expenses_for_user(user_id))?;
        expenses.sort_by(|a, b| {
            b.expense_date
                .cmp(&a.expense_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(expenses)
    }
}

fn validate_amount(amount: Decimal) -> ServiceResult<()> {
    validate_money("expense amount", amount)
}

fn validate_currency(currency: &str) -> ServiceResult<()> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ExpenseError::InvalidInput(format!(
            "currency `{}` must be a three letter code",
            currency
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::storage::JsonStorage;
    use chrono::NaiveDate;

    fn at(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn storage_with_category() -> (JsonStorage, Uuid) {
        let storage = JsonStorage::in_memory();
        let category = Category::system("Food", "utensils", at(1));
        let id = category.id;
        in_transaction(&storage, |tx| tx.insert_category(category)).unwrap();
        (storage, id)
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let (storage, category) = storage_with_category();
        let err = ExpenseService::create(
            &storage,
            Uuid::new_v4(),
            NewExpense::new(category, Decimal::ZERO, at(2)),
            at(2),
        )
        .expect_err("zero amount must be rejected");
        assert!(matches!(err, ExpenseError::InvalidInput(_)));

        let user = Uuid::new_v4();
        let expense = ExpenseService::create(
            &storage,
            user,
            NewExpense::new(category, Decimal::from(5), at(2)),
            at(2),
        )
        .unwrap();
        let err = ExpenseService::update(
            &storage,
            user,
            expense.id,
            ExpenseChanges {
                amount: Some(Decimal::from(-3)),
                ..ExpenseChanges::default()
            },
            at(3),
        )
        .expect_err("negative amount must be rejected");
        assert!(matches!(err, ExpenseError::InvalidInput(_)));
    }

    #[test]
    fn rejects_amounts_beyond_storable_range() {
        let (storage, category) = storage_with_category();
        let user = Uuid::new_v4();
        for amount in [
            Decimal::MAX - Decimal::from(10),
            Decimal::new(10_000_000_000, 2),
            Decimal::new(1_005, 3),
        ] {
            let err = ExpenseService::create(
                &storage,
                user,
                NewExpense::new(category, amount, at(2)),
                at(2),
            )
            .expect_err("amount outside the storable range");
            assert!(matches!(err, ExpenseError::InvalidInput(_)));
        }
        let largest = ExpenseService::create(
            &storage,
            user,
            NewExpense::new(category, Decimal::new(9_999_999_999, 2), at(2)),
            at(2),
        )
        .unwrap();
        assert_eq!(largest.amount, Decimal::new(9_999_999_999, 2));
    }

    #[test]
    fn rejects_malformed_currency() {
        let (storage, category) = storage_with_category();
        let mut input = NewExpense::new(category, Decimal::from(5), at(2));
        input.currency = Some("rupees".into());
        let err = ExpenseService::create(&storage, Uuid::new_v4(), input, at(2)).unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidInput(_)));
    }

    #[test]
    fn list_is_newest_first() {
        let (storage, category) = storage_with_category();
        let user = Uuid::new_v4();
        for day in [3, 9, 5] {
            ExpenseService::create(
                &storage,
                user,
                NewExpense::new(category, Decimal::from(day), at(day)),
                at(day),
            )
            .unwrap();
        }
        let days: Vec<Decimal> = ExpenseService::list(&storage, user)
            .unwrap()
            .into_iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(days, vec![Decimal::from(9), Decimal::from(5), Decimal::from(3)]);
    }

    #[test]
    fn get_is_scoped_to_owner() {
        let (storage, category) = storage_with_category();
        let user = Uuid::new_v4();
        let expense = ExpenseService::create(
            &storage,
            user,
            NewExpense::new(category, Decimal::from(5), at(2)),
            at(2),
        )
        .unwrap();
        assert_eq!(ExpenseService::get(&storage, user, expense.id).unwrap(), expense);
        let err = ExpenseService::get(&storage, Uuid::new_v4(), expense.id).unwrap_err();
        assert_eq!(err.kind().status_code(), 404);
    }
}
