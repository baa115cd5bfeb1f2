//! WebSocket endpoint for list channels.

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::Deserialize;

use crate::api::AppState;

use super::hub::{ConnectionHandle, ListHub};
use super::types::{ClientMessage, ListEvent};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// GET /ws/lists/{list_id}?token=...
///
/// Auth happens after the upgrade so browser clients get a proper close
/// frame (policy violation, 1008) instead of a failed handshake.
pub async fn ws_list_handler(
    ws: WebSocketUpgrade,
    Path(list_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, list_id, query.token))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    list_id: String,
    token: Option<String>,
) {
    let Some(token) = token else {
        reject(socket, "missing token").await;
        return;
    };

    let (user_id, user_name) = match authorize(&state, &list_id, &token).await {
        Ok(identity) => identity,
        Err(reason) => {
            reject(socket, reason).await;
            return;
        }
    };

    let mut handle = join_list(&state.hub, &list_id, &user_id, &user_name);

    let (mut sink, mut stream) = socket.split();

    // Presence snapshot goes straight to the new connection.
    let snapshot = ListEvent::Presence {
        list_id: list_id.clone(),
        users: state.hub.active_users(&list_id),
    };
    if !send_event(&mut sink, &snapshot).await {
        finish(&state, &list_id, handle.conn_id).await;
        return;
    }

    loop {
        tokio::select! {
            event = handle.receiver.recv() => {
                match event {
                    Some(event) => {
                        if !send_event(&mut sink, &event).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let sender = Sender {
                            conn_id: handle.conn_id,
                            user_id: &user_id,
                            user_name: &user_name,
                        };
                        if !handle_client_message(&mut sink, &state.hub, &list_id, &sender, &text)
                            .await
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!("ws read error on list {list_id}: {err}");
                        break;
                    }
                }
            }
        }
    }

    finish(&state, &list_id, handle.conn_id).await;
    let _ = sink.close().await;
}

/// Resolve a connection token to an active member of the list.
///
/// Claims alone are not enough: the account may have been deactivated
/// since the token was issued, and the display name shown to other
/// members comes from the user row, not the token.
async fn authorize(
    state: &AppState,
    list_id: &str,
    token: &str,
) -> Result<(String, String), &'static str> {
    let claims = match state.auth.validate_access_token(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("ws auth failed for list {list_id}: {err}");
            return Err("invalid token");
        }
    };

    let user = match state.users.find_by_id(&claims.sub).await {
        Ok(user) => user,
        Err(err) => {
            warn!("ws user lookup failed for list {list_id}: {err:#}");
            return Err("authentication unavailable");
        }
    };
    let Some(user) = user.filter(|u| u.is_active) else {
        debug!(
            "ws rejected unknown or deactivated user {} on list {list_id}",
            claims.sub
        );
        return Err("unknown or inactive user");
    };

    if state.lists.require_role(&user.id, list_id).await.is_err() {
        return Err("not a member of this list");
    }

    Ok((user.id, user.name))
}

/// Register with the hub and announce the join to everyone already there.
fn join_list(hub: &ListHub, list_id: &str, user_id: &str, user_name: &str) -> ConnectionHandle {
    let handle = hub.connect(list_id, user_id, user_name);
    hub.broadcast_except(
        list_id,
        handle.conn_id,
        &ListEvent::UserJoined {
            list_id: list_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
        },
    );
    handle
}

struct Sender<'a> {
    conn_id: u64,
    user_id: &'a str,
    user_name: &'a str,
}

/// Handle one text frame from the client. Returns false when the socket
/// should be torn down.
async fn handle_client_message(
    sink: &mut SplitSink<WebSocket, Message>,
    hub: &ListHub,
    list_id: &str,
    sender: &Sender<'_>,
    text: &str,
) -> bool {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            debug!("ignoring malformed ws message on list {list_id}: {err}");
            return true;
        }
    };

    match respond_to_message(hub, list_id, sender, msg) {
        Some(event) => send_event(sink, &event).await,
        None => true,
    }
}

/// Apply one parsed client message against the hub. Returns the event to
/// echo back on the same socket, if any.
fn respond_to_message(
    hub: &ListHub,
    list_id: &str,
    sender: &Sender<'_>,
    msg: ClientMessage,
) -> Option<ListEvent> {
    match msg {
        ClientMessage::Typing => {
            // Everyone but the typist hears about it.
            hub.broadcast_except(
                list_id,
                sender.conn_id,
                &ListEvent::UserTyping {
                    list_id: list_id.to_string(),
                    user_id: sender.user_id.to_string(),
                    user_name: sender.user_name.to_string(),
                },
            );
            None
        }
        ClientMessage::Ping => Some(ListEvent::Pong),
        ClientMessage::Presence => Some(ListEvent::Presence {
            list_id: list_id.to_string(),
            users: hub.active_users(list_id),
        }),
        ClientMessage::SyncAck | ClientMessage::Unknown => None,
    }
}

async fn send_event(sink: &mut SplitSink<WebSocket, Message>, event: &ListEvent) -> bool {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("failed to serialize ws event: {err}");
            return true;
        }
    };
    sink.send(Message::Text(payload.into())).await.is_ok()
}

/// Unregister from the hub and tell the room when the user is fully gone.
async fn finish(state: &AppState, list_id: &str, conn_id: u64) {
    if let Some(info) = state.hub.disconnect(list_id, conn_id)
        && !info.user_still_connected
    {
        state.hub.broadcast(
            list_id,
            &ListEvent::UserLeft {
                list_id: list_id.to_string(),
                user_id: info.user_id,
            },
        );
    }
}

async fn reject(mut socket: WebSocket, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: reason.into(),
        })))
        .await;
}
