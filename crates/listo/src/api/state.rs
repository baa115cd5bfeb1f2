//! Shared application state.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::db::Database;
use crate::items::ItemService;
use crate::lists::ListService;
use crate::sync::Reconciler;
use crate::users::UserService;
use crate::ws::ListHub;

/// Everything handlers need, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthState,
    pub hub: Arc<ListHub>,
    pub users: UserService,
    pub lists: ListService,
    pub items: ItemService,
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(db: Database, auth: AuthState) -> Self {
        let pool = db.pool().clone();
        let hub = Arc::new(ListHub::new());
        Self {
            auth,
            users: UserService::new(pool.clone()),
            lists: ListService::new(pool.clone()),
            items: ItemService::new(pool.clone()),
            reconciler: Reconciler::new(pool, hub.clone()),
            hub,
            db,
        }
    }
}
