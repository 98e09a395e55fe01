//! Domain types representing expense categories.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

pub const DEFAULT_ICON: &str = "receipt";

/// Groups expenses for budgeting and reporting.
///
/// Categories without an owner are system-wide and shared by every user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub is_system: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Category {
    pub fn system(name: impl Into<String>, icon: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: icon.into(),
            description: None,
            owner_id: None,
            is_system: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owned_by(owner_id: Uuid, name: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: DEFAULT_ICON.into(),
            description: None,
            owner_id: Some(owner_id),
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.owner_id.map_or(true, |owner| owner == user_id)
    }
}

impl Identifiable for Category {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for creating a user category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Editable presentation fields; identity and ownership never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}
