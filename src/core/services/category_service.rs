use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::{Category, CategoryChanges, NewCategory};
use crate::errors::ExpenseError;
use crate::ledger::reconciler::require_category;
use crate::storage::{in_transaction, read_only, Repository, StorageBackend};

use super::{validate_name, ServiceResult};

pub struct CategoryService;

impl CategoryService {
    pub fn create(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        input: NewCategory,
        now: NaiveDateTime,
    ) -> ServiceResult<Category> {
        let name = validate_name("Category", &input.name)?;
        in_transaction(storage, |tx| {
            Self::ensure_unique(&*tx, user_id, None, &name)?;
            let mut category = Category::owned_by(user_id, name, now);
            if let Some(icon) = input.icon.filter(|icon| !icon.trim().is_empty()) {
                category.icon = icon;
            }
            category.description = input.description;
            tx.insert_category(category.clone())?;
            Ok(category)
        })
    }

    pub fn get(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ServiceResult<Category> {
        read_only(storage, |tx| require_category(tx, user_id, category_id))
    }

    /// True when `category_id` names a category the user may file expenses under.
    pub fn exists(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ServiceResult<bool> {
        match Self::get(storage, user_id, category_id) {
            Ok(_) => Ok(true),
            Err(ExpenseError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// System categories plus the user's own, sorted by name.
    pub fn list(storage: &dyn StorageBackend, user_id: Uuid) -> ServiceResult<Vec<Category>> {
        let mut categories = read_only(storage, |tx| tx.categories_visible_to(user_id))?;
        categories.sort_by_key(|category| category.name.to_lowercase());
        Ok(categories)
    }

    /// Renames or restyles one of the user's own categories.
    pub fn edit(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        category_id: Uuid,
        changes: CategoryChanges,
        now: NaiveDateTime,
    ) -> ServiceResult<Category> {
        let name = changes
            .name
            .as_deref()
            .map(|name| validate_name("Category", name))
            .transpose()?;
        in_transaction(storage, |tx| {
            let mut category = Self::owned(&*tx, user_id, category_id)?;
            if let Some(name) = name {
                Self::ensure_unique(&*tx, user_id, Some(category_id), &name)?;
                category.name = name;
            }
            if let Some(icon) = changes.icon {
                category.icon = icon;
            }
            if let Some(description) = changes.description {
                category.description = Some(description);
            }
            category.updated_at = now;
            tx.update_category(&category)?;
            Ok(category)
        })
    }

    pub fn delete(storage: &dyn StorageBackend, user_id: Uuid, category_id: Uuid) -> ServiceResult<()> {
        in_transaction(storage, |tx| {
            Self::owned(&*tx, user_id, category_id)?;
            if tx.category_in_use(category_id)? {
                return Err(ExpenseError::Conflict(
                    "Category has linked expenses or budgets".into(),
                ));
            }
            tx.delete_category(category_id)
        })
    }

    fn owned<R>(repo: &R, user_id: Uuid, category_id: Uuid) -> ServiceResult<Category>
    where
        R: Repository + ?Sized,
    {
        let category = require_category(repo, user_id, category_id)?;
        if category.is_system || category.owner_id != Some(user_id) {
            return Err(ExpenseError::Conflict(format!(
                "Category `{}` is shared and cannot be changed",
                category.name
            )));
        }
        Ok(category)
    }

    fn ensure_unique<R>(
        repo: &R,
        user_id: Uuid,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> ServiceResult<()>
    where
        R: Repository + ?Sized,
    {
        let normalized = candidate.to_lowercase();
        let duplicate = repo.categories_visible_to(user_id)?.iter().any(|category| {
            category.name.trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| category.id != id)
        });
        if duplicate {
            Err(ExpenseError::Conflict(format!(
                "Category `{}` already exists",
                candidate
            )))
        } else {
            Ok(())
        }
    }
}
