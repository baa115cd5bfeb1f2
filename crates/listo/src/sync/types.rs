//! Batch sync wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::items::{ItemCreate, ItemUpdate};
use crate::lists::{ListCreate, ListUpdate};

/// One queued client mutation.
///
/// `id` is the client's own action ID, echoed back in the result.
/// `entity_id` names the target entity; for creates it carries the
/// client's temporary ID (if any) so failures can be correlated.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncAction {
    pub id: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(flatten)]
    pub op: SyncOp,
    pub client_timestamp: DateTime<Utc>,
}

/// Item creation payload inside a sync batch. Unlike the REST endpoint,
/// the list is addressed in the payload rather than the URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncItemCreate {
    pub list_id: String,
    #[serde(flatten)]
    pub item: ItemCreate,
}

/// The mutation kind, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncOp {
    CreateList { payload: ListCreate },
    UpdateList { payload: ListUpdate },
    DeleteList,
    CreateItem { payload: SyncItemCreate },
    UpdateItem { payload: ItemUpdate },
    DeleteItem,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub actions: Vec<SyncAction>,
}

impl SyncOp {
    /// Kind of entity the action targets, echoed in its result.
    pub fn entity_type(&self) -> &'static str {
        match self {
            SyncOp::CreateList { .. } | SyncOp::UpdateList { .. } | SyncOp::DeleteList => "list",
            SyncOp::CreateItem { .. } | SyncOp::UpdateItem { .. } | SyncOp::DeleteItem => "item",
        }
    }
}

/// Authoritative server state attached to a conflicting action.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictInfo {
    pub id: String,
    pub server_version: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    /// The client action ID this verdict is for.
    pub action_id: String,
    pub success: bool,
    pub entity_type: &'static str,
    /// Server-side entity ID; for applied creates this is the newly
    /// assigned ID, otherwise the target (or client temp) ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictInfo>,
}

impl SyncResult {
    pub fn applied(action: &SyncAction, entity_id: Option<String>) -> Self {
        Self {
            action_id: action.id.clone(),
            success: true,
            entity_type: action.op.entity_type(),
            entity_id,
            error: None,
            conflict: None,
        }
    }

    pub fn conflict(action: &SyncAction, entity_id: &str, server_version: serde_json::Value) -> Self {
        Self {
            action_id: action.id.clone(),
            success: false,
            entity_type: action.op.entity_type(),
            entity_id: Some(entity_id.to_string()),
            error: None,
            conflict: Some(ConflictInfo {
                id: entity_id.to_string(),
                server_version,
            }),
        }
    }

    pub fn failed(action: &SyncAction, error: String) -> Self {
        Self {
            action_id: action.id.clone(),
            success: false,
            entity_type: action.op.entity_type(),
            entity_id: action.entity_id.clone(),
            error: Some(error),
            conflict: None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub results: Vec<SyncResult>,
    pub server_timestamp: DateTime<Utc>,
    pub synced_count: usize,
    pub failed_count: usize,
    pub conflict_count: usize,
}
