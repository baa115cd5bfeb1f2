//! Item operations with access control.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::lists::repository as lists_repo;

use super::repository;
use super::{Item, ItemCreate, ItemUpdate, validate_item_name, validate_quantity};

/// Service for item CRUD within a list.
#[derive(Debug, Clone)]
pub struct ItemService {
    pool: SqlitePool,
}

impl ItemService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_item(
        &self,
        user_id: &str,
        list_id: &str,
        data: ItemCreate,
    ) -> Result<Item> {
        validate_item_name(&data.name)?;
        if let Some(quantity) = data.quantity {
            validate_quantity(quantity)?;
        }

        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_editor(&mut conn, user_id, list_id).await?;

        let item = Item::new(list_id, user_id, &data);
        repository::insert_item(&mut conn, &item).await?;
        Ok(item)
    }

    pub async fn list_items(&self, user_id: &str, list_id: &str) -> Result<Vec<Item>> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_viewer(&mut conn, user_id, list_id).await?;
        repository::items_for_list(&mut conn, list_id).await
    }

    pub async fn update_item(
        &self,
        user_id: &str,
        list_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<Item> {
        if let Some(name) = update.name.as_deref() {
            validate_item_name(name)?;
        }
        if let Some(quantity) = update.quantity {
            validate_quantity(quantity)?;
        }

        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_editor(&mut conn, user_id, list_id).await?;

        let mut item = self.fetch_in_list(&mut conn, list_id, item_id).await?;
        item.apply(&update, user_id, Utc::now());
        repository::update_item_row(&mut conn, &item).await?;
        Ok(item)
    }

    /// Flip the checked state of an item.
    pub async fn toggle_item(&self, user_id: &str, list_id: &str, item_id: &str) -> Result<Item> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_editor(&mut conn, user_id, list_id).await?;

        let mut item = self.fetch_in_list(&mut conn, list_id, item_id).await?;
        let now = Utc::now();
        item.set_checked(!item.is_checked, user_id, now);
        item.updated_at = now;
        repository::update_item_row(&mut conn, &item).await?;
        Ok(item)
    }

    pub async fn delete_item(&self, user_id: &str, list_id: &str, item_id: &str) -> Result<Item> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_editor(&mut conn, user_id, list_id).await?;

        let item = self.fetch_in_list(&mut conn, list_id, item_id).await?;
        repository::delete_item(&mut conn, item_id).await?;
        Ok(item)
    }

    async fn fetch_in_list(
        &self,
        conn: &mut sqlx::SqliteConnection,
        list_id: &str,
        item_id: &str,
    ) -> Result<Item> {
        let item = repository::fetch_item(conn, item_id)
            .await?
            .context("item not found")?;
        if item.list_id != list_id {
            bail!("item not found");
        }
        Ok(item)
    }

    async fn require_viewer(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user_id: &str,
        list_id: &str,
    ) -> Result<()> {
        lists_repo::fetch_list(conn, list_id)
            .await?
            .context("list not found")?;
        lists_repo::member_role(conn, list_id, user_id)
            .await?
            .context("you don't have access to this list")?;
        Ok(())
    }

    async fn require_editor(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user_id: &str,
        list_id: &str,
    ) -> Result<()> {
        lists_repo::fetch_list(conn, list_id)
            .await?
            .context("list not found")?;
        let role = lists_repo::member_role(conn, list_id, user_id)
            .await?
            .context("you don't have access to this list")?;
        if !role.can_edit() {
            bail!("you don't have permission to edit this list");
        }
        Ok(())
    }
}
