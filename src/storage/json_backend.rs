use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Budget, Category, Expense, Identifiable, Owned, PeriodWindow, Report};
use crate::errors::{ExpenseError, Result};
use crate::ledger::matcher::BudgetMatcher;
use crate::utils::paths::write_atomic;

use super::{Repository, StorageBackend, UnitOfWork};

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Everything the store persists, serialized as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub schema_version: u32,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            categories: Vec::new(),
            budgets: Vec::new(),
            expenses: Vec::new(),
            reports: Vec::new(),
        }
    }
}

/// Reference backend keeping state in memory and optionally mirroring it to a
/// JSON file on every commit.
///
/// `begin` holds the state lock until the transaction is committed or dropped,
/// so writers are serialized.
pub struct JsonStorage {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl JsonStorage {
    pub fn in_memory() -> Self {
        Self::with_state(StoreState::default())
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            path: None,
            state: Mutex::new(state),
        }
    }

    /// Opens (or starts) a store backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            load_state_from_path(&path)?
        } else {
            StoreState::default()
        };
        if state.schema_version > STORE_SCHEMA_VERSION {
            return Err(ExpenseError::Upstream(format!(
                "store schema {} is newer than supported {}",
                state.schema_version, STORE_SCHEMA_VERSION
            )));
        }
        tracing::debug!(path = %path.display(), "opened json store");
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> Result<StoreState> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| ExpenseError::Upstream("store lock poisoned".into()))
    }
}

impl StorageBackend for JsonStorage {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>> {
        let guard = self.lock()?;
        let working = guard.clone();
        Ok(Box::new(JsonTransaction {
            guard,
            working,
            path: self.path.as_deref(),
        }))
    }
}

struct JsonTransaction<'a> {
    guard: MutexGuard<'a, StoreState>,
    working: StoreState,
    path: Option<&'a Path>,
}

impl UnitOfWork for JsonTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        let JsonTransaction {
            mut guard,
            working,
            path,
        } = *self;
        // Persist first so a failed write leaves the committed state untouched.
        if let Some(path) = path {
            save_state_to_path(&working, path)?;
        }
        *guard = working;
        Ok(())
    }
}

impl Repository for JsonTransaction<'_> {
    fn category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.working.categories.iter().find(|c| c.id() == id).cloned())
    }

    fn categories_visible_to(&self, user_id: Uuid) -> Result<Vec<Category>> {
        Ok(self
            .working
            .categories
            .iter()
            .filter(|c| c.is_visible_to(user_id))
            .cloned()
            .collect())
    }

    fn insert_category(&mut self, category: Category) -> Result<()> {
        self.working.categories.push(category);
        Ok(())
    }

    fn update_category(&mut self, category: &Category) -> Result<()> {
        let slot = self
            .working
            .categories
            .iter_mut()
            .find(|c| c.id() == category.id())
            .ok_or_else(|| ExpenseError::not_found("Category", category.id))?;
        *slot = category.clone();
        Ok(())
    }

    fn delete_category(&mut self, id: Uuid) -> Result<()> {
        let before = self.working.categories.len();
        self.working.categories.retain(|c| c.id() != id);
        if self.working.categories.len() == before {
            return Err(ExpenseError::not_found("Category", id));
        }
        Ok(())
    }

    fn category_in_use(&self, id: Uuid) -> Result<bool> {
        Ok(self.working.expenses.iter().any(|e| e.category_id == id)
            || self
                .working
                .budgets
                .iter()
                .any(|b| b.category_id == Some(id)))
    }

    fn budget(&self, user_id: Uuid, id: Uuid) -> Result<Option<Budget>> {
        Ok(find_owned(&self.working.budgets, user_id, id))
    }

    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>> {
        Ok(owned_by(&self.working.budgets, user_id))
    }

    fn active_budgets_on(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        on: NaiveDateTime,
    ) -> Result<Vec<Budget>> {
        Ok(BudgetMatcher::select(&self.working.budgets, user_id, category_id, on)
            .cloned()
            .collect())
    }

    fn overlapping_budget(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        window: &PeriodWindow,
        exclude: Option<Uuid>,
    ) -> Result<Option<Budget>> {
        Ok(self
            .working
            .budgets
            .iter()
            .find(|b| {
                b.owner() == user_id
                    && b.is_active
                    && b.category_id == Some(category_id)
                    && Some(b.id) != exclude
                    && b.period().overlaps(window)
            })
            .cloned())
    }

    fn budgets_overlapping(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Budget>> {
        Ok(self
            .working
            .budgets
            .iter()
            .filter(|b| b.owner() == user_id && b.is_active && b.period().overlaps(window))
            .cloned()
            .collect())
    }

    fn insert_budget(&mut self, budget: Budget) -> Result<()> {
        self.working.budgets.push(budget);
        Ok(())
    }

    fn update_budget(&mut self, budget: &Budget) -> Result<()> {
        replace_owned(&mut self.working.budgets, budget, "Budget")
    }

    fn delete_budget(&mut self, user_id: Uuid, id: Uuid) -> Result<()> {
        remove_owned(&mut self.working.budgets, user_id, id, "Budget")
    }

    fn expense(&self, user_id: Uuid, id: Uuid) -> Result<Option<Expense>> {
        Ok(find_owned(&self.working.expenses, user_id, id))
    }

    fn expenses_for_user(&self, user_id: Uuid) -> Result<Vec<Expense>> {
        Ok(owned_by(&self.working.expenses, user_id))
    }

    fn expenses_between(&self, user_id: Uuid, window: &PeriodWindow) -> Result<Vec<Expense>> {
        Ok(self
            .working
            .expenses
            .iter()
            .filter(|e| e.owner() == user_id && window.contains(e.expense_date))
            .cloned()
            .collect())
    }

    fn insert_expense(&mut self, expense: Expense) -> Result<()> {
        self.working.expenses.push(expense);
        Ok(())
    }

    fn update_expense(&mut self, expense: &Expense) -> Result<()> {
        replace_owned(&mut self.working.expenses, expense, "Expense")
    }

    fn delete_expense(&mut self, user_id: Uuid, id: Uuid) -> Result<()> {
        remove_owned(&mut self.working.expenses, user_id, id, "Expense")
    }

    fn report(&self, user_id: Uuid, id: Uuid) -> Result<Option<Report>> {
        Ok(find_owned(&self.working.reports, user_id, id))
    }

    fn reports_for_user(&self, user_id: Uuid) -> Result<Vec<Report>> {
        Ok(owned_by(&self.working.reports, user_id))
    }

    fn insert_report(&mut self, report: Report) -> Result<()> {
        self.working.reports.push(report);
        Ok(())
    }

    fn update_report(&mut self, report: &Report) -> Result<()> {
        replace_owned(&mut self.working.reports, report, "Report")
    }
}

fn find_owned<T>(rows: &[T], user_id: Uuid, id: Uuid) -> Option<T>
where
    T: Identifiable + Owned + Clone,
{
    rows.iter()
        .find(|row| row.id() == id && row.owner() == user_id)
        .cloned()
}

fn owned_by<T>(rows: &[T], user_id: Uuid) -> Vec<T>
where
    T: Owned + Clone,
{
    rows.iter()
        .filter(|row| row.owner() == user_id)
        .cloned()
        .collect()
}

fn replace_owned<T>(rows: &mut [T], row: &T, entity: &str) -> Result<()>
where
    T: Identifiable + Owned + Clone,
{
    let slot = rows
        .iter_mut()
        .find(|existing| existing.id() == row.id() && existing.owner() == row.owner())
        .ok_or_else(|| ExpenseError::not_found(entity, row.id()))?;
    *slot = row.clone();
    Ok(())
}

fn remove_owned<T>(rows: &mut Vec<T>, user_id: Uuid, id: Uuid, entity: &str) -> Result<()>
where
    T: Identifiable + Owned,
{
    let before = rows.len();
    rows.retain(|row| !(row.id() == id && row.owner() == user_id));
    if rows.len() == before {
        return Err(ExpenseError::not_found(entity, id));
    }
    Ok(())
}

pub fn save_state_to_path(state: &StoreState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    write_atomic(path, &json)
}

pub fn load_state_from_path(path: &Path) -> Result<StoreState> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
