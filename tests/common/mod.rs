#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use expense_core::{
    config::ConfigManager,
    domain::{Budget, Category, Expense, PeriodWindow, Report},
    errors::{ExpenseError, Result},
    storage::{in_transaction, JsonStorage, Repository, StorageBackend, UnitOfWork},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a file-backed store and config manager in a unique directory.
pub fn setup_test_env() -> (JsonStorage, ConfigManager) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    let config = config_manager.load().expect("load default config");
    let storage =
        JsonStorage::open(config_manager.store_path(&config)).expect("open json storage");
    (storage, config_manager)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .expect("valid date")
        .and_hms_opt(h, 0, 0)
        .expect("valid time")
}

/// Inserts shared categories and returns their ids in the given order.
pub fn seed_categories(storage: &dyn StorageBackend, names: &[&str]) -> Vec<Uuid> {
    let categories: Vec<Category> = names
        .iter()
        .map(|name| Category::system(*name, "tag", at(2024, 1, 1, 0)))
        .collect();
    let ids = categories.iter().map(|c| c.id).collect();
    in_transaction(storage, |tx| {
        for category in categories {
            tx.insert_category(category)?;
        }
        Ok(())
    })
    .expect("seed categories");
    ids
}

pub fn current_spent(storage: &dyn StorageBackend, user: Uuid, budget: Uuid) -> rust_decimal::Decimal {
    expense_core::BudgetService::get(storage, user, budget)
        .expect("budget exists")
        .current_spent
}

/// Storage wrapper that can be told to fail every budget write, to prove that
/// a failed reconciliation rolls back the whole unit of work.
pub struct FailingStorage {
    inner: JsonStorage,
    fail_budget_writes: AtomicBool,
}

impl FailingStorage {
    pub fn new(inner: JsonStorage) -> Self {
        Self {
            inner,
            fail_budget_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_budget_writes(&self, fail: bool) {
        self.fail_budget_writes.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for FailingStorage {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        Ok(Box::new(FailingTx {
            inner: self.inner.begin()?,
            fail_budget_writes: self.fail_budget_writes.load(Ordering::SeqCst),
        }))
    }
}

struct FailingTx<'a> {
    inner: Box<dyn UnitOfWork + 'a>,
    fail_budget_writes: bool,
}

impl UnitOfWork for FailingTx<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        self.inner.commit()
    }
}

impl Repository for FailingTx<'_> {
    fn category(&self, id: Uuid) -> Result<Option<Category>> {
        self.inner.category(id)
    }
    fn categories_visible_to(&self, user_id: Uuid) -> Result<Vec<Category>> {
        self.inner.categories_visible_to(user_id)
    }
    fn insert_category(&mut self, category: Category) -> Result<()> {
        self.inner.insert_category(category)
    }
    fn update_category(&mut self, category: &Category) -> Result<()> {
        self.inner.update_category(category)
    }
    fn delete_category(&mut self, id: Uuid) -> Result<()> {
        self.inner.delete_category(id)
    }
    fn category_in_use(&self, id: Uuid) -> Result<bool> {
        self.inner.category_in_use(id)
    }

    fn budget(&self, user_id: Uuid, id: Uuid) -> Result<Option<Budget>> {
        self.inner.budget(user_id, id)
    }
    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>> {
        self.inner.budgets_for_user(user_id)
    }
    fn active_budgets_on(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        on: NaiveDateTime,
    ) -> Result<Vec<Budget>> {
        self.inner.active_budgets_on(user_id, category_id, on)
    }
    fn overlapping_budget(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        window: &PeriodWindow,
        exclude: Option<Uuid>,
    ) -> Result<Option<Budget>> {
        self.inner
            .overlapping_budget(user_id, category_id, window, exclude)
    }
    fn budgets_overlapping(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Budget>> {
        self.inner.budgets_overlapping(user_id, window)
    }
    fn insert_budget(&mut self, budget: Budget) -> Result<()> {
        self.inner.insert_budget(budget)
    }
    fn update_budget(&mut self, budget: &Budget) -> Result<()> {
        if self.fail_budget_writes {
            return Err(ExpenseError::Upstream("injected budget write failure".into()));
        }
        self.inner.update_budget(budget)
    }
    fn delete_budget(&mut self, user_id: Uuid, id: Uuid) -> Result<()> {
        self.inner.delete_budget(user_id, id)
    }

    fn expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>> {
        self.inner.expense(user_id, id)
    }
    fn expenses_for_user(&self, user_id: Uuid) -> Result<Vec<Expense>> {
        self.inner.expenses_for_user(user_id)
    }
    fn expenses_between(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Expense>> {
        self.inner.expenses_between(user_id, window)
    }
    fn insert_expense(&mut self, expense: Expense) -> Result<()> {
        self.inner.insert_expense(expense)
    }
    fn update_expense(&mut self, expense: &Expense) -> Result<()> {
        self.inner.update_expense(expense)
    }
    fn delete_expense(&mut self, user_id: Uuid, id: Uuid) -> Result<()> {
        self.inner.delete_expense(user_id, id)
    }

    fn report(&self, user_id: Uuid, id: Uuid) -> Result<Option<Report>> {
        self.inner.report(user_id, id)
    }
    fn reports_for_user(&self, user_id: Uuid) -> Result<Vec<Report>> {
        self.inner.reports_for_user(user_id)
    }
    fn insert_report(&mut self, report: Report) -> Result<()> {
        self.inner.insert_report(report)
    }
    fn update_report(&mut self, report: &Report) -> Result<()> {
        self.inner.update_report(report)
    }
}
