//! Shopping lists and membership.

pub mod repository;
mod service;

pub use service::ListService;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Membership role on a list, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Viewer,
    Editor,
    Owner,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Viewer => "viewer",
            MemberRole::Editor => "editor",
            MemberRole::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "viewer" => Ok(MemberRole::Viewer),
            "editor" => Ok(MemberRole::Editor),
            "owner" => Ok(MemberRole::Owner),
            other => bail!("unknown member role '{other}'"),
        }
    }

    /// Whether this role may mutate the list and its items.
    pub fn can_edit(&self) -> bool {
        matches!(self, MemberRole::Editor | MemberRole::Owner)
    }
}

/// A shopping list row.
#[derive(Debug, Clone, FromRow)]
pub struct ShoppingList {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_archived: bool,
    pub share_token: Option<String>,
    pub share_token_role: Option<String>,
    pub share_token_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    pub fn new(owner_id: &str, name: &str, color: Option<String>, icon: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            color: color.unwrap_or_else(|| "#4CAF50".to_string()),
            icon: icon.unwrap_or_else(|| "shopping_cart".to_string()),
            is_archived: false,
            share_token: None,
            share_token_role: None,
            share_token_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A list membership row.
#[derive(Debug, Clone, FromRow)]
pub struct ListMember {
    pub id: String,
    pub list_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl ListMember {
    pub fn new(list_id: &str, user_id: &str, role: MemberRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            list_id: list_id.to_string(),
            user_id: user_id.to_string(),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Request body for adding a member to a list.
#[derive(Debug, Deserialize)]
pub struct MemberAdd {
    pub user_id: String,
    #[serde(default = "default_member_role")]
    pub role: MemberRole,
}

fn default_member_role() -> MemberRole {
    MemberRole::Viewer
}

/// Request body for changing a member's role.
#[derive(Debug, Deserialize)]
pub struct MemberRoleUpdate {
    pub role: MemberRole,
}

/// Membership joined with the member's identity, as exposed over the API.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberInfo {
    pub id: String,
    pub list_id: String,
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a list.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCreate {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Request body for updating a list. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_archived: Option<bool>,
}

/// List data as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShoppingList> for ListResponse {
    fn from(list: ShoppingList) -> Self {
        Self {
            id: list.id,
            owner_id: list.owner_id,
            name: list.name,
            color: list.color,
            icon: list.icon,
            is_archived: list.is_archived,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

pub(crate) fn validate_list_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 100 {
        bail!("invalid list name: must be 1-100 characters");
    }
    Ok(())
}

pub(crate) fn validate_color(color: &str) -> Result<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        bail!("invalid color: expected #RRGGBB");
    }
    Ok(())
}
