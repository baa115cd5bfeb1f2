//! Router assembly.

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
};
use log::warn;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::ws::ws_list_handler;

use super::handlers::{auth, health, items, lists, sync};
use super::state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/lists/{list_id}",
            get(lists::get_list)
                .patch(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/lists/{list_id}/members",
            get(lists::list_members).post(lists::add_member),
        )
        .route(
            "/lists/{list_id}/members/{member_id}",
            patch(lists::update_member_role).delete(lists::remove_member),
        )
        .route("/lists/{list_id}/presence", get(lists::list_presence))
        .route(
            "/lists/{list_id}/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/lists/{list_id}/items/{item_id}",
            patch(items::update_item).delete(items::delete_item),
        )
        .route(
            "/lists/{list_id}/items/{item_id}/toggle",
            post(items::toggle_item),
        )
        .route("/sync/batch", post(sync::sync_batch))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(state.auth.allowed_origins());

    Router::new()
        .nest("/api/v1", public.merge(protected))
        // WebSocket auth happens after the upgrade, inside the handler.
        .route("/ws/lists/{list_id}", get(ws_list_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring unparseable CORS origin: {o}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
