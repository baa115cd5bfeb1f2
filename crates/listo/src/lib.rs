//! Listo backend: collaborative shopping lists with real-time updates
//! and offline batch sync.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod items;
pub mod lists;
pub mod sync;
pub mod users;
pub mod ws;
