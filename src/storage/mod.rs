pub mod json_backend;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::{Budget, Category, Expense, PeriodWindow, Report};
use crate::errors::Result;

/// Scoped reads and writes offered inside one unit of work.
///
/// Every user-owned lookup takes the owning user so callers can never reach
/// another user's rows.
pub trait Repository {
    fn category(&self, id: Uuid) -> Result<Option<Category>>;
    fn categories_visible_to(&self, user_id: Uuid) -> Result<Vec<Category>>;
    fn insert_category(&mut self, category: Category) -> Result<()>;
    fn update_category(&mut self, category: &Category) -> Result<()>;
    fn delete_category(&mut self, id: Uuid) -> Result<()>;
    /// True when any expense or budget references the category.
    fn category_in_use(&self, id: Uuid) -> Result<bool>;

    fn budget(&self, user_id: Uuid, id: Uuid) -> Result<Option<Budget>>;
    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>>;
    /// Active budgets whose period contains `on` and whose category is
    /// `category_id` or the wildcard.
    fn active_budgets_on(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        on: NaiveDateTime,
    ) -> Result<Vec<Budget>>;
    /// First active budget of exactly `category_id` overlapping `window`.
    fn overlapping_budget(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        window: &PeriodWindow,
        exclude: Option<Uuid>,
    ) -> Result<Option<Budget>>;
    /// Active budgets of any category overlapping `window`.
    fn budgets_overlapping(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Budget>>;
    fn insert_budget(&mut self, budget: Budget) -> Result<()>;
    fn update_budget(&mut self, budget: &Budget) -> Result<()>;
    fn delete_budget(&mut self, user_id: Uuid, id: Uuid) -> Result<()>;

    fn expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>>;
    fn expenses_for_user(&self, user_id: Uuid) -> Result<Vec<Expense>>;
    fn expenses_between(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Expense>>;
    fn insert_expense(&mut self, expense: Expense) -> Result<()>;
    fn update_expense(&mut self, expense: &Expense) -> Result<()>;
    fn delete_expense(&mut self, user_id: Uuid, id: Uuid) -> Result<()>;

    fn report(&self, user_id: Uuid, id: Uuid) -> Result<Option<Report>>;
    fn reports_for_user(&self, user_id: Uuid) -> Result<Vec<Report>>;
    fn insert_report(&mut self, report: Report) -> Result<()>;
    fn update_report(&mut self, report: &Report) -> Result<()>;
}

/// An open transaction. Dropping it without calling `commit` discards every
/// write made through it.
pub trait UnitOfWork: Repository {
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Abstraction over persistence backends capable of opening transactions.
pub trait StorageBackend: Send + Sync {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>>;
}

/// Runs `work` inside a fresh transaction, committing only when it succeeds.
pub fn in_transaction<T, F>(storage: &dyn StorageBackend, work: F) -> Result<T>
where
    F: FnOnce(&mut dyn UnitOfWork) -> Result<T>,
{
    let mut tx = storage.begin()?;
    let value = work(tx.as_mut())?;
    tx.commit()?;
    Ok(value)
}

/// Runs `work` against a transaction that is dropped without committing.
pub fn read_only<T, F>(storage: &dyn StorageBackend, work: F) -> Result<T>
where
    F: FnOnce(&dyn UnitOfWork) -> Result<T>,
{
    let tx = storage.begin()?;
    work(tx.as_ref())
}

pub use json_backend::{JsonStorage, StoreState, STORE_SCHEMA_VERSION};
