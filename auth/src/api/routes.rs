use axum::{Router, routing::post};
use session_core::wire;

use crate::api::handlers::session::{login, logout, refresh};
use crate::state::AppState;

/// Session routes, mounted at the paths the client expects (`/api/...`).
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(wire::LOGIN_PATH, post(login))
        .route(wire::REFRESH_PATH, post(refresh))
        .route(wire::LOGOUT_PATH, post(logout))
        .with_state(state)
}
