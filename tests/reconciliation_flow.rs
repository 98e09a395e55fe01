mod common;

use common::{at, current_spent, seed_categories, FailingStorage};
use expense_core::{
    domain::{BudgetPeriodKind, ExpenseChanges, NewExpense},
    ledger::BudgetLedger,
    storage::{in_transaction, JsonStorage, Repository, StorageBackend},
    BudgetService, ErrorKind, ExpenseError, ExpenseService, NewBudget,
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct Household {
    user: Uuid,
    food: Uuid,
    travel: Uuid,
    food_budget: Uuid,
    travel_budget: Uuid,
    overall_budget: Uuid,
}

fn may_household(storage: &dyn StorageBackend) -> Household {
    let ids = seed_categories(storage, &["Food", "Travel"]);
    let (food, travel) = (ids[0], ids[1]);
    let user = Uuid::new_v4();
    let anchor = at(2024, 5, 1, 0).date();
    let make = |name: &str, limit: i64, category: Option<Uuid>| {
        let mut input = NewBudget::new(name, Decimal::from(limit), BudgetPeriodKind::Monthly)
            .anchored_at(anchor);
        input.category_id = category;
        BudgetService::create(storage, user, input, at(2024, 5, 1, 8))
            .expect("create budget")
            .id
    };
    Household {
        user,
        food,
        travel,
        food_budget: make("Groceries", 500, Some(food)),
        travel_budget: make("Trips", 2000, Some(travel)),
        overall_budget: make("Everything", 5000, None),
    }
}

fn record(storage: &dyn StorageBackend, hh: &Household, category: Uuid, amount: i64, day: u32) -> Uuid {
    ExpenseService::create(
        storage,
        hh.user,
        NewExpense::new(category, Decimal::from(amount), at(2024, 5, day, 12)),
        at(2024, 5, day, 12),
    )
    .expect("record expense")
    .id
}

/// Sum of the user's expenses a budget should be carrying right now.
fn expected_spent(storage: &dyn StorageBackend, hh: &Household, budget_id: Uuid) -> Decimal {
    let budget = BudgetService::get(storage, hh.user, budget_id).expect("budget exists");
    ExpenseService::list(storage, hh.user)
        .expect("list expenses")
        .iter()
        .filter(|e| budget.covers_category(e.category_id) && budget.period().contains(e.expense_date))
        .map(|e| e.amount)
        .sum()
}

fn assert_reconciled(storage: &dyn StorageBackend, hh: &Household) {
    for budget in [hh.food_budget, hh.travel_budget, hh.overall_budget] {
        assert_eq!(
            current_spent(storage, hh.user, budget),
            expected_spent(storage, hh, budget),
            "budget {budget} drifted from its matching expenses"
        );
    }
}

#[test]
fn create_then_delete_restores_every_budget() {
    let storage = JsonStorage::in_memory();
    let hh = may_household(&storage);

    let lunch = record(&storage, &hh, hh.food, 120, 3);
    assert_eq!(current_spent(&storage, hh.user, hh.food_budget), Decimal::from(120));
    assert_eq!(current_spent(&storage, hh.user, hh.overall_budget), Decimal::from(120));
    assert_eq!(current_spent(&storage, hh.user, hh.travel_budget), Decimal::ZERO);

    ExpenseService::delete(&storage, hh.user, lunch).expect("delete expense");
    for budget in [hh.food_budget, hh.travel_budget, hh.overall_budget] {
        assert_eq!(current_spent(&storage, hh.user, budget), Decimal::ZERO);
    }
}

#[test]
fn mixed_edits_keep_budgets_reconciled() {
    let storage = JsonStorage::in_memory();
    let hh = may_household(&storage);

    let groceries = record(&storage, &hh, hh.food, 80, 2);
    let train = record(&storage, &hh, hh.travel, 650, 9);
    let snacks = record(&storage, &hh, hh.food, 35, 14);
    assert_reconciled(&storage, &hh);

    // Re-file groceries as travel and bump the amount.
    ExpenseService::update(
        &storage,
        hh.user,
        groceries,
        ExpenseChanges {
            category_id: Some(hh.travel),
            amount: Some(Decimal::new(9550, 2)),
            ..ExpenseChanges::default()
        },
        at(2024, 5, 15, 9),
    )
    .expect("move groceries");
    assert_reconciled(&storage, &hh);

    // Push the train ticket into June, outside every May budget.
    ExpenseService::update(
        &storage,
        hh.user,
        train,
        ExpenseChanges {
            expense_date: Some(at(2024, 6, 2, 7)),
            ..ExpenseChanges::default()
        },
        at(2024, 5, 15, 9),
    )
    .expect("move train to june");
    assert_reconciled(&storage, &hh);
    assert_eq!(
        current_spent(&storage, hh.user, hh.travel_budget),
        Decimal::new(9550, 2)
    );

    ExpenseService::delete(&storage, hh.user, snacks).expect("delete snacks");
    record(&storage, &hh, hh.food, 210, 20);
    assert_reconciled(&storage, &hh);
    assert_eq!(current_spent(&storage, hh.user, hh.food_budget), Decimal::from(210));
    assert_eq!(
        current_spent(&storage, hh.user, hh.overall_budget),
        Decimal::new(30550, 2)
    );
}

#[test]
fn failed_budget_write_rolls_back_the_expense() {
    let storage = FailingStorage::new(JsonStorage::in_memory());
    let hh = may_household(&storage);
    record(&storage, &hh, hh.food, 40, 4);

    storage.fail_budget_writes(true);
    let err = ExpenseService::create(
        &storage,
        hh.user,
        NewExpense::new(hh.food, Decimal::from(60), at(2024, 5, 6, 18)),
        at(2024, 5, 6, 18),
    )
    .expect_err("budget write failure should abort the create");
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);

    storage.fail_budget_writes(false);
    let expenses = ExpenseService::list(&storage, hh.user).expect("list expenses");
    assert_eq!(expenses.len(), 1, "no orphan expense after rollback");
    assert_eq!(current_spent(&storage, hh.user, hh.food_budget), Decimal::from(40));
    assert_reconciled(&storage, &hh);
}

#[test]
fn failed_delete_keeps_expense_and_spend() {
    let storage = FailingStorage::new(JsonStorage::in_memory());
    let hh = may_household(&storage);
    let trip = record(&storage, &hh, hh.travel, 900, 11);

    storage.fail_budget_writes(true);
    ExpenseService::delete(&storage, hh.user, trip).expect_err("delete should fail");
    storage.fail_budget_writes(false);

    assert!(ExpenseService::get(&storage, hh.user, trip).is_ok());
    assert_eq!(current_spent(&storage, hh.user, hh.travel_budget), Decimal::from(900));
}

#[test]
fn unknown_category_is_rejected_without_side_effects() {
    let storage = JsonStorage::in_memory();
    let hh = may_household(&storage);

    let err = ExpenseService::create(
        &storage,
        hh.user,
        NewExpense::new(Uuid::new_v4(), Decimal::from(10), at(2024, 5, 2, 10)),
        at(2024, 5, 2, 10),
    )
    .expect_err("unknown category");
    assert!(matches!(err, ExpenseError::NotFound(_)));
    assert_eq!(err.kind().status_code(), 404);
    assert!(ExpenseService::list(&storage, hh.user)
        .expect("list expenses")
        .is_empty());
    assert_eq!(current_spent(&storage, hh.user, hh.overall_budget), Decimal::ZERO);
}

#[test]
fn zero_delta_leaves_budget_untouched() {
    let storage = JsonStorage::in_memory();
    let hh = may_household(&storage);
    record(&storage, &hh, hh.food, 75, 8);

    let budget = BudgetService::get(&storage, hh.user, hh.food_budget).expect("budget exists");
    assert_eq!(
        BudgetLedger::apply_delta(&budget, Decimal::ZERO).expect("zero delta applies"),
        budget
    );
}

#[test]
fn reversal_past_zero_clamps_and_recompute_repairs() {
    let storage = JsonStorage::in_memory();
    let hh = may_household(&storage);
    let dinner = record(&storage, &hh, hh.food, 100, 10);

    // Simulate drift: the stored spend is lower than what was recorded.
    in_transaction(&storage, |tx| {
        let mut budget = tx
            .budget(hh.user, hh.food_budget)?
            .expect("food budget present");
        budget.current_spent = Decimal::from(30);
        tx.update_budget(&budget)
    })
    .expect("inject drift");

    ExpenseService::delete(&storage, hh.user, dinner).expect("delete dinner");
    assert_eq!(current_spent(&storage, hh.user, hh.food_budget), Decimal::ZERO);

    record(&storage, &hh, hh.food, 45, 12);
    in_transaction(&storage, |tx| {
        let mut budget = tx
            .budget(hh.user, hh.food_budget)?
            .expect("food budget present");
        budget.current_spent = Decimal::from(999);
        tx.update_budget(&budget)
    })
    .expect("inject drift");
    let repaired = BudgetService::recompute_spent(&storage, hh.user, hh.food_budget, at(2024, 5, 13, 0))
        .expect("recompute");
    assert_eq!(repaired.current_spent, Decimal::from(45));
}
