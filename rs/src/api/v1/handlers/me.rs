/*
 * Responsibility
 * - GET /me: guard が検証した identity をそのまま返す
 * - cart / order など他の handler も同じ AuthCtxExtractor で subject を受け取る
 */
use axum::Json;
use serde::Serialize;

use crate::api::v1::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct SessionIdentity {
    pub sub: String,
    pub issued_at: i64,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<SessionIdentity> {
    Json(SessionIdentity {
        sub: ctx.subject,
        issued_at: ctx.issued_at,
        expires_at: ctx.expires_at,
        token_id: ctx.token_id,
    })
}
