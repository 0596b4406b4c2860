/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は public、それ以外は access guard の内側に置く
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, me::me};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/me", get(me));

    Router::new()
        .route("/health", get(health))
        .merge(access::apply(protected, state))
}
