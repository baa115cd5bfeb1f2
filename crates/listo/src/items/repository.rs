//! Item queries.
//!
//! Functions take a `&mut SqliteConnection` so they compose inside a
//! single transaction as well as against a pool connection.

use anyhow::{Context, Result};
use sqlx::SqliteConnection;

use super::Item;

const ITEM_COLUMNS: &str = "id, list_id, name, quantity, unit, note, is_checked, \
     checked_at, checked_by, sort_index, created_by, created_at, updated_at";

pub async fn insert_item(conn: &mut SqliteConnection, item: &Item) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO items (
            id, list_id, name, quantity, unit, note, is_checked,
            checked_at, checked_by, sort_index, created_by, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.list_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(&item.note)
    .bind(item.is_checked)
    .bind(item.checked_at)
    .bind(&item.checked_by)
    .bind(item.sort_index)
    .bind(&item.created_by)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(conn)
    .await
    .context("inserting item")?;

    Ok(())
}

pub async fn fetch_item(conn: &mut SqliteConnection, item_id: &str) -> Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"
    ))
    .bind(item_id)
    .fetch_optional(conn)
    .await
    .context("fetching item")?;

    Ok(item)
}

/// All items on a list, in sort order.
pub async fn items_for_list(conn: &mut SqliteConnection, list_id: &str) -> Result<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE list_id = ? ORDER BY sort_index, created_at"
    ))
    .bind(list_id)
    .fetch_all(conn)
    .await
    .context("fetching items for list")?;

    Ok(items)
}

/// Write every mutable column of an item row back.
pub async fn update_item_row(conn: &mut SqliteConnection, item: &Item) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE items
        SET name = ?, quantity = ?, unit = ?, note = ?, is_checked = ?,
            checked_at = ?, checked_by = ?, sort_index = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&item.name)
    .bind(item.quantity)
    .bind(&item.unit)
    .bind(&item.note)
    .bind(item.is_checked)
    .bind(item.checked_at)
    .bind(&item.checked_by)
    .bind(item.sort_index)
    .bind(item.updated_at)
    .bind(&item.id)
    .execute(conn)
    .await
    .context("updating item")?;

    Ok(())
}

pub async fn delete_item(conn: &mut SqliteConnection, item_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(item_id)
        .execute(conn)
        .await
        .context("deleting item")?;

    Ok(())
}
