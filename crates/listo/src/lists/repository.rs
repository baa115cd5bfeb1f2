//! List queries.
//!
//! All functions take a `&mut SqliteConnection` so they compose inside a
//! single transaction as well as against a pool connection.

use anyhow::{Context, Result};
use sqlx::SqliteConnection;

use super::{ListMember, MemberInfo, MemberRole, ShoppingList};

pub async fn insert_list(conn: &mut SqliteConnection, list: &ShoppingList) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shopping_lists (
            id, owner_id, name, color, icon, is_archived,
            share_token, share_token_role, share_token_enabled,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&list.id)
    .bind(&list.owner_id)
    .bind(&list.name)
    .bind(&list.color)
    .bind(&list.icon)
    .bind(list.is_archived)
    .bind(&list.share_token)
    .bind(&list.share_token_role)
    .bind(list.share_token_enabled)
    .bind(list.created_at)
    .bind(list.updated_at)
    .execute(conn)
    .await
    .context("inserting list")?;

    Ok(())
}

pub async fn insert_member(conn: &mut SqliteConnection, member: &ListMember) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO list_members (id, list_id, user_id, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&member.id)
    .bind(&member.list_id)
    .bind(&member.user_id)
    .bind(&member.role)
    .bind(member.created_at)
    .execute(conn)
    .await
    .context("inserting list member")?;

    Ok(())
}

pub async fn fetch_list(
    conn: &mut SqliteConnection,
    list_id: &str,
) -> Result<Option<ShoppingList>> {
    let list = sqlx::query_as::<_, ShoppingList>(
        r#"
        SELECT id, owner_id, name, color, icon, is_archived,
               share_token, share_token_role, share_token_enabled,
               created_at, updated_at
        FROM shopping_lists
        WHERE id = ?
        "#,
    )
    .bind(list_id)
    .fetch_optional(conn)
    .await
    .context("fetching list")?;

    Ok(list)
}

/// Role the user holds on the list, or None if not a member.
pub async fn member_role(
    conn: &mut SqliteConnection,
    list_id: &str,
    user_id: &str,
) -> Result<Option<MemberRole>> {
    let role: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT role FROM list_members
        WHERE list_id = ? AND user_id = ?
        "#,
    )
    .bind(list_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .context("fetching member role")?;

    role.map(|(r,)| MemberRole::parse(&r)).transpose()
}

/// Every member of the list with their user identity, oldest first.
pub async fn list_members(conn: &mut SqliteConnection, list_id: &str) -> Result<Vec<MemberInfo>> {
    let members = sqlx::query_as::<_, MemberInfo>(
        r#"
        SELECT m.id, m.list_id, m.user_id, u.name AS user_name, u.email,
               m.role, m.created_at
        FROM list_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.list_id = ?
        ORDER BY m.created_at
        "#,
    )
    .bind(list_id)
    .fetch_all(conn)
    .await
    .context("fetching list members")?;

    Ok(members)
}

/// One member of the list with their user identity.
pub async fn fetch_member_info(
    conn: &mut SqliteConnection,
    list_id: &str,
    user_id: &str,
) -> Result<Option<MemberInfo>> {
    let member = sqlx::query_as::<_, MemberInfo>(
        r#"
        SELECT m.id, m.list_id, m.user_id, u.name AS user_name, u.email,
               m.role, m.created_at
        FROM list_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.list_id = ? AND m.user_id = ?
        "#,
    )
    .bind(list_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .context("fetching list member")?;

    Ok(member)
}

/// Whether an active user row exists for the ID.
pub async fn active_user_exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = ? AND is_active = 1")
            .bind(user_id)
            .fetch_optional(conn)
            .await
            .context("checking user")?;

    Ok(row.is_some())
}

pub async fn update_member_role_row(
    conn: &mut SqliteConnection,
    list_id: &str,
    user_id: &str,
    role: MemberRole,
) -> Result<()> {
    sqlx::query("UPDATE list_members SET role = ? WHERE list_id = ? AND user_id = ?")
        .bind(role.as_str())
        .bind(list_id)
        .bind(user_id)
        .execute(conn)
        .await
        .context("updating member role")?;

    Ok(())
}

pub async fn delete_member(
    conn: &mut SqliteConnection,
    list_id: &str,
    user_id: &str,
) -> Result<()> {
    sqlx::query("DELETE FROM list_members WHERE list_id = ? AND user_id = ?")
        .bind(list_id)
        .bind(user_id)
        .execute(conn)
        .await
        .context("removing list member")?;

    Ok(())
}

/// All lists the user is a member of, newest first.
pub async fn lists_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<ShoppingList>> {
    let lists = sqlx::query_as::<_, ShoppingList>(
        r#"
        SELECT l.id, l.owner_id, l.name, l.color, l.icon, l.is_archived,
               l.share_token, l.share_token_role, l.share_token_enabled,
               l.created_at, l.updated_at
        FROM shopping_lists l
        JOIN list_members m ON m.list_id = l.id
        WHERE m.user_id = ?
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
    .context("fetching lists for user")?;

    Ok(lists)
}

/// Write every mutable column of a list row back.
pub async fn update_list_row(conn: &mut SqliteConnection, list: &ShoppingList) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE shopping_lists
        SET name = ?, color = ?, icon = ?, is_archived = ?,
            share_token = ?, share_token_role = ?, share_token_enabled = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&list.name)
    .bind(&list.color)
    .bind(&list.icon)
    .bind(list.is_archived)
    .bind(&list.share_token)
    .bind(&list.share_token_role)
    .bind(list.share_token_enabled)
    .bind(list.updated_at)
    .bind(&list.id)
    .execute(conn)
    .await
    .context("updating list")?;

    Ok(())
}

/// Delete a list. Members and items go with it via ON DELETE CASCADE.
pub async fn delete_list(conn: &mut SqliteConnection, list_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM shopping_lists WHERE id = ?")
        .bind(list_id)
        .execute(conn)
        .await
        .context("deleting list")?;

    Ok(())
}
