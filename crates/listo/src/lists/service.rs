//! List operations with access control.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::info;
use sqlx::SqlitePool;

use super::repository;
use super::{ListCreate, ListMember, ListUpdate, MemberAdd, MemberInfo, MemberRole, ShoppingList};
use super::{validate_color, validate_list_name};

/// Service for shopping list CRUD.
#[derive(Debug, Clone)]
pub struct ListService {
    pool: SqlitePool,
}

impl ListService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a list and register the creator as its owner member.
    pub async fn create_list(&self, user_id: &str, data: ListCreate) -> Result<ShoppingList> {
        validate_list_name(&data.name)?;
        if let Some(color) = data.color.as_deref() {
            validate_color(color)?;
        }

        let list = ShoppingList::new(user_id, data.name.trim(), data.color, data.icon);
        let member = ListMember::new(&list.id, user_id, MemberRole::Owner);

        let mut tx = self.pool.begin().await.context("starting transaction")?;
        repository::insert_list(&mut tx, &list).await?;
        repository::insert_member(&mut tx, &member).await?;
        tx.commit().await.context("committing list creation")?;

        info!("created list {} for user {}", list.id, user_id);
        Ok(list)
    }

    /// All lists the user belongs to.
    pub async fn lists_for_user(&self, user_id: &str) -> Result<Vec<ShoppingList>> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        repository::lists_for_user(&mut conn, user_id).await
    }

    /// Fetch a single list, requiring membership.
    pub async fn get_list(&self, user_id: &str, list_id: &str) -> Result<ShoppingList> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (list, _) = self.require_member(&mut conn, user_id, list_id).await?;
        Ok(list)
    }

    /// The user's role on a list, requiring membership.
    pub async fn require_role(&self, user_id: &str, list_id: &str) -> Result<MemberRole> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (_, role) = self.require_member(&mut conn, user_id, list_id).await?;
        Ok(role)
    }

    /// Apply a partial update. Requires editor or owner role.
    pub async fn update_list(
        &self,
        user_id: &str,
        list_id: &str,
        update: ListUpdate,
    ) -> Result<ShoppingList> {
        if let Some(name) = update.name.as_deref() {
            validate_list_name(name)?;
        }
        if let Some(color) = update.color.as_deref() {
            validate_color(color)?;
        }

        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (mut list, role) = self.require_member(&mut conn, user_id, list_id).await?;
        if !role.can_edit() {
            bail!("you don't have permission to edit this list");
        }

        if let Some(name) = update.name {
            list.name = name.trim().to_string();
        }
        if let Some(color) = update.color {
            list.color = color;
        }
        if let Some(icon) = update.icon {
            list.icon = icon;
        }
        if let Some(archived) = update.is_archived {
            list.is_archived = archived;
        }
        list.updated_at = Utc::now();

        repository::update_list_row(&mut conn, &list).await?;
        Ok(list)
    }

    /// Delete a list. Only the owner may delete.
    pub async fn delete_list(&self, user_id: &str, list_id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (_, role) = self.require_member(&mut conn, user_id, list_id).await?;
        if role != MemberRole::Owner {
            bail!("only the owner can delete this list");
        }

        repository::delete_list(&mut conn, list_id).await?;
        info!("deleted list {} by user {}", list_id, user_id);
        Ok(())
    }

    /// Add a user to a list. Only the owner may add members, and a list
    /// has exactly one owner.
    pub async fn add_member(
        &self,
        user_id: &str,
        list_id: &str,
        data: MemberAdd,
    ) -> Result<MemberInfo> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (_, role) = self.require_member(&mut conn, user_id, list_id).await?;
        if role != MemberRole::Owner {
            bail!("only the owner can manage members");
        }
        if data.role == MemberRole::Owner {
            bail!("invalid role: a list has exactly one owner");
        }
        if !repository::active_user_exists(&mut conn, &data.user_id).await? {
            bail!("user not found");
        }
        if repository::member_role(&mut conn, list_id, &data.user_id)
            .await?
            .is_some()
        {
            bail!("user is already a member of this list");
        }

        let member = ListMember::new(list_id, &data.user_id, data.role);
        repository::insert_member(&mut conn, &member).await?;
        info!(
            "added member {} to list {} as {}",
            data.user_id,
            list_id,
            data.role.as_str()
        );

        repository::fetch_member_info(&mut conn, list_id, &data.user_id)
            .await?
            .context("member not found")
    }

    /// All members of a list. Any member may view the roster.
    pub async fn list_members(&self, user_id: &str, list_id: &str) -> Result<Vec<MemberInfo>> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        self.require_member(&mut conn, user_id, list_id).await?;
        repository::list_members(&mut conn, list_id).await
    }

    /// Change a member's role. Owner-only; the owner's own role is fixed.
    pub async fn update_member_role(
        &self,
        user_id: &str,
        list_id: &str,
        member_user_id: &str,
        role: MemberRole,
    ) -> Result<MemberInfo> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (list, caller_role) = self.require_member(&mut conn, user_id, list_id).await?;
        if caller_role != MemberRole::Owner {
            bail!("only the owner can manage members");
        }
        if role == MemberRole::Owner || member_user_id == list.owner_id {
            bail!("invalid role: a list has exactly one owner");
        }

        repository::member_role(&mut conn, list_id, member_user_id)
            .await?
            .context("member not found")?;
        repository::update_member_role_row(&mut conn, list_id, member_user_id, role).await?;

        repository::fetch_member_info(&mut conn, list_id, member_user_id)
            .await?
            .context("member not found")
    }

    /// Remove a member. The owner can remove anyone but themselves;
    /// other members can only leave.
    pub async fn remove_member(
        &self,
        user_id: &str,
        list_id: &str,
        member_user_id: &str,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("acquiring connection")?;
        let (list, caller_role) = self.require_member(&mut conn, user_id, list_id).await?;
        if caller_role != MemberRole::Owner && user_id != member_user_id {
            bail!("you don't have permission to remove other members");
        }
        if member_user_id == list.owner_id {
            bail!("invalid member removal: the owner cannot leave their own list");
        }

        repository::member_role(&mut conn, list_id, member_user_id)
            .await?
            .context("member not found")?;
        repository::delete_member(&mut conn, list_id, member_user_id).await?;
        info!("removed member {member_user_id} from list {list_id}");
        Ok(())
    }

    async fn require_member(
        &self,
        conn: &mut sqlx::SqliteConnection,
        user_id: &str,
        list_id: &str,
    ) -> Result<(ShoppingList, MemberRole)> {
        let list = repository::fetch_list(conn, list_id)
            .await?
            .context("list not found")?;

        let role = repository::member_role(conn, list_id, user_id)
            .await?
            .context("you don't have access to this list")?;

        Ok((list, role))
    }
}
