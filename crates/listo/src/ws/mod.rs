//! Real-time list channels.
//!
//! Every open WebSocket joins the hub under its list ID. Mutations from
//! HTTP handlers and the sync reconciler are fanned out to everyone
//! watching that list.

mod handler;
mod hub;
mod types;

pub use handler::ws_list_handler;
pub use hub::{ConnectionHandle, DisconnectInfo, ListHub};
pub use types::{ClientMessage, ListEvent, PresenceUser};
