//! Connection registry and fan-out.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::types::{ListEvent, PresenceUser};

/// Buffered events per connection before the hub starts dropping.
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct ConnectionEntry {
    conn_id: u64,
    user_id: String,
    user_name: String,
    connected_at: DateTime<Utc>,
    sender: mpsc::Sender<ListEvent>,
}

/// A registered connection: the ID to disconnect with and the event
/// stream to forward to the socket.
pub struct ConnectionHandle {
    pub conn_id: u64,
    pub receiver: mpsc::Receiver<ListEvent>,
}

/// Returned from [`ListHub::disconnect`] so the caller can announce the
/// departure.
#[derive(Debug)]
pub struct DisconnectInfo {
    pub user_id: String,
    pub user_name: String,
    /// The same user still has another connection open on this list
    /// (another tab or device).
    pub user_still_connected: bool,
}

/// Per-list connection hub.
///
/// Each connection gets a bounded channel. Broadcasting never blocks:
/// closed receivers are pruned on the spot and a full channel drops the
/// event for that connection only.
pub struct ListHub {
    channels: DashMap<String, Vec<ConnectionEntry>>,
    next_conn_id: AtomicU64,
}

impl Default for ListHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ListHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Join a list channel.
    pub fn connect(&self, list_id: &str, user_id: &str, user_name: &str) -> ConnectionHandle {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        self.channels
            .entry(list_id.to_string())
            .or_default()
            .push(ConnectionEntry {
                conn_id,
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                connected_at: Utc::now(),
                sender,
            });

        debug!("ws connect: list={list_id} user={user_id} conn={conn_id}");
        ConnectionHandle { conn_id, receiver }
    }

    /// Leave a list channel. Safe to call more than once for the same
    /// connection; repeated calls return None.
    pub fn disconnect(&self, list_id: &str, conn_id: u64) -> Option<DisconnectInfo> {
        let mut entry = self.channels.get_mut(list_id)?;
        let pos = entry.iter().position(|c| c.conn_id == conn_id)?;
        let removed = entry.remove(pos);
        let user_still_connected = entry.iter().any(|c| c.user_id == removed.user_id);
        let empty = entry.is_empty();
        drop(entry);

        if empty {
            // Only remove the slot if nobody raced a new connection in.
            self.channels
                .remove_if(list_id, |_, conns| conns.is_empty());
        }

        debug!("ws disconnect: list={list_id} conn={conn_id}");
        Some(DisconnectInfo {
            user_id: removed.user_id,
            user_name: removed.user_name,
            user_still_connected,
        })
    }

    /// Broadcast to every connection on the list.
    pub fn broadcast(&self, list_id: &str, event: &ListEvent) {
        self.broadcast_inner(list_id, None, event);
    }

    /// Broadcast to every connection on the list except one, typically
    /// the connection that caused the event.
    pub fn broadcast_except(&self, list_id: &str, skip_conn_id: u64, event: &ListEvent) {
        self.broadcast_inner(list_id, Some(skip_conn_id), event);
    }

    fn broadcast_inner(&self, list_id: &str, skip_conn_id: Option<u64>, event: &ListEvent) {
        let Some(mut entry) = self.channels.get_mut(list_id) else {
            return;
        };

        let mut pruned_users: Vec<String> = Vec::new();
        entry.retain(|conn| {
            if Some(conn.conn_id) == skip_conn_id {
                return true;
            }
            match conn.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("pruning closed connection {} on list {list_id}", conn.conn_id);
                    pruned_users.push(conn.user_id.clone());
                    false
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        "event channel full for connection {} on list {list_id}, dropping event",
                        conn.conn_id
                    );
                    true
                }
            }
        });

        // A pruned connection is an implicit disconnect, so users with no
        // surviving connection get the same user_left a clean disconnect
        // would have produced. The shard guard must be released before
        // broadcasting again.
        pruned_users.retain(|user_id| !entry.iter().any(|c| &c.user_id == user_id));
        pruned_users.sort();
        pruned_users.dedup();
        let empty = entry.is_empty();
        drop(entry);

        if empty {
            self.channels
                .remove_if(list_id, |_, conns| conns.is_empty());
        }

        for user_id in pruned_users {
            self.broadcast(
                list_id,
                &ListEvent::UserLeft {
                    list_id: list_id.to_string(),
                    user_id,
                },
            );
        }
    }

    /// Distinct users currently connected to the list, in join order.
    /// When a user holds several connections, the newest one supplies
    /// the presence metadata.
    pub fn active_users(&self, list_id: &str) -> Vec<PresenceUser> {
        let Some(entry) = self.channels.get(list_id) else {
            return Vec::new();
        };

        let mut users: Vec<PresenceUser> = Vec::new();
        for conn in entry.iter() {
            let presence = PresenceUser {
                user_id: conn.user_id.clone(),
                user_name: conn.user_name.clone(),
                connected_at: conn.connected_at,
            };
            match users.iter_mut().find(|u| u.user_id == conn.user_id) {
                Some(existing) => *existing = presence,
                None => users.push(presence),
            }
        }
        users
    }

    /// Open connection count for a list.
    pub fn connection_count(&self, list_id: &str) -> usize {
        self.channels.get(list_id).map_or(0, |e| e.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(list_id: &str) -> ListEvent {
        ListEvent::UserJoined {
            list_id: list_id.to_string(),
            user_id: "u-actor".to_string(),
            user_name: "Actor".to_string(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let hub = ListHub::new();
        let mut a = hub.connect("l1", "ua", "A");
        let mut b = hub.connect("l1", "ub", "B");

        hub.broadcast_except("l1", a.conn_id, &joined("l1"));

        assert!(matches!(
            b.receiver.try_recv(),
            Ok(ListEvent::UserJoined { .. })
        ));
        assert!(a.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_scoped_to_list() {
        let hub = ListHub::new();
        let mut a = hub.connect("l1", "ua", "A");
        let mut b = hub.connect("l2", "ub", "B");

        hub.broadcast("l1", &joined("l1"));

        assert!(a.receiver.try_recv().is_ok());
        assert!(b.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_presence_deduplicates_users() {
        let hub = ListHub::new();
        let _first = hub.connect("l1", "ua", "A");
        let _second_tab = hub.connect("l1", "ua", "A");
        let _other = hub.connect("l1", "ub", "B");

        let users = hub.active_users("l1");
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "ua");
        assert_eq!(users[1].user_id, "ub");
        assert_eq!(hub.connection_count("l1"), 3);
    }

    #[tokio::test]
    async fn test_dead_receiver_is_pruned() {
        let hub = ListHub::new();
        let a = hub.connect("l1", "ua", "A");
        let mut b = hub.connect("l1", "ub", "B");

        drop(a.receiver);
        hub.broadcast("l1", &joined("l1"));

        // The live connection still got the event and the dead one is gone.
        assert!(b.receiver.try_recv().is_ok());
        assert_eq!(hub.connection_count("l1"), 1);
        assert_eq!(hub.active_users("l1").len(), 1);
    }

    #[tokio::test]
    async fn test_full_channel_drops_event_but_keeps_connection() {
        let hub = ListHub::new();
        let mut a = hub.connect("l1", "ua", "A");

        for _ in 0..(EVENT_CHANNEL_CAPACITY + 10) {
            hub.broadcast("l1", &joined("l1"));
        }

        assert_eq!(hub.connection_count("l1"), 1);
        let mut received = 0;
        while a.receiver.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, EVENT_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn test_pruned_connection_announces_user_left() {
        let hub = ListHub::new();
        let a = hub.connect("l1", "ua", "A");
        let mut b = hub.connect("l1", "ub", "B");

        drop(a.receiver);
        hub.broadcast("l1", &joined("l1"));

        assert!(matches!(
            b.receiver.try_recv(),
            Ok(ListEvent::UserJoined { .. })
        ));
        match b.receiver.try_recv() {
            Ok(ListEvent::UserLeft { user_id, .. }) => assert_eq!(user_id, "ua"),
            other => panic!("expected user_left, got {other:?}"),
        }
        assert!(b.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_prune_with_surviving_tab_stays_quiet() {
        let hub = ListHub::new();
        let dead_tab = hub.connect("l1", "ua", "A");
        let mut live_tab = hub.connect("l1", "ua", "A");
        let mut b = hub.connect("l1", "ub", "B");

        drop(dead_tab.receiver);
        hub.broadcast("l1", &joined("l1"));

        // The user is still on the list through the other tab, so nobody
        // hears a user_left.
        assert!(matches!(
            b.receiver.try_recv(),
            Ok(ListEvent::UserJoined { .. })
        ));
        assert!(b.receiver.try_recv().is_err());
        assert!(live_tab.receiver.try_recv().is_ok());
        assert!(live_tab.receiver.try_recv().is_err());
        assert_eq!(hub.active_users("l1").len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let hub = ListHub::new();
        let a = hub.connect("l1", "ua", "A");
        let b = hub.connect("l1", "ua", "A");

        let info = hub.disconnect("l1", a.conn_id).unwrap();
        assert!(info.user_still_connected);

        assert!(hub.disconnect("l1", a.conn_id).is_none());

        let info = hub.disconnect("l1", b.conn_id).unwrap();
        assert!(!info.user_still_connected);
        assert_eq!(hub.connection_count("l1"), 0);
        assert!(hub.disconnect("l1", b.conn_id).is_none());
    }
}
