//! WebSocket message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::items::Item;
use crate::lists::ListResponse;

/// A user currently connected to a list channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceUser {
    pub user_id: String,
    pub user_name: String,
    pub connected_at: DateTime<Utc>,
}

/// Server-to-client events, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListEvent {
    ItemAdded {
        list_id: String,
        item: Item,
    },
    ItemUpdated {
        list_id: String,
        item: Item,
    },
    ItemDeleted {
        list_id: String,
        item_id: String,
    },
    ListUpdated {
        list_id: String,
        list: ListResponse,
    },
    ListDeleted {
        list_id: String,
    },
    UserJoined {
        list_id: String,
        user_id: String,
        user_name: String,
    },
    UserLeft {
        list_id: String,
        user_id: String,
    },
    UserTyping {
        list_id: String,
        user_id: String,
        user_name: String,
    },
    /// Snapshot of everyone currently on the channel.
    Presence {
        list_id: String,
        users: Vec<PresenceUser>,
    },
    Pong,
}

/// Client-to-server messages, tagged by `type`. Unknown types are
/// tolerated and ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The sender is typing; relayed to everyone else on the list.
    Typing,
    /// The client acknowledged a sync push. Accepted, nothing to do.
    SyncAck,
    Ping,
    /// Ask for a fresh presence snapshot.
    Presence,
    #[serde(other)]
    Unknown,
}
