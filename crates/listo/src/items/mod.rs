//! List items.

pub mod repository;
mod service;

pub use service::ItemService;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An item row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub id: String,
    pub list_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub note: Option<String>,
    pub is_checked: bool,
    pub checked_at: Option<DateTime<Utc>>,
    pub checked_by: Option<String>,
    pub sort_index: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(list_id: &str, created_by: &str, data: &ItemCreate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            list_id: list_id.to_string(),
            name: data.name.trim().to_string(),
            quantity: data.quantity.unwrap_or(1),
            unit: data.unit.clone(),
            note: data.note.clone(),
            is_checked: false,
            checked_at: None,
            checked_by: None,
            sort_index: data.sort_index.unwrap_or(0),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, stamping check metadata when the checked
    /// state changes.
    pub fn apply(&mut self, update: &ItemUpdate, user_id: &str, now: DateTime<Utc>) {
        if let Some(name) = update.name.as_deref() {
            self.name = name.trim().to_string();
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if update.unit.is_some() {
            self.unit = update.unit.clone();
        }
        if update.note.is_some() {
            self.note = update.note.clone();
        }
        if let Some(sort_index) = update.sort_index {
            self.sort_index = sort_index;
        }
        if let Some(checked) = update.is_checked {
            self.set_checked(checked, user_id, now);
        }
        self.updated_at = now;
    }

    pub fn set_checked(&mut self, checked: bool, user_id: &str, now: DateTime<Utc>) {
        self.is_checked = checked;
        if checked {
            self.checked_at = Some(now);
            self.checked_by = Some(user_id.to_string());
        } else {
            self.checked_at = None;
            self.checked_by = None;
        }
    }
}

/// Request body for creating an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub sort_index: Option<i64>,
}

/// Request body for updating an item. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub is_checked: Option<bool>,
    #[serde(default)]
    pub sort_index: Option<i64>,
}

pub(crate) fn validate_item_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        bail!("invalid item name: must be 1-200 characters");
    }
    Ok(())
}

pub(crate) fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 1 {
        bail!("invalid quantity: must be at least 1");
    }
    Ok(())
}
