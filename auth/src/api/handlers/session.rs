use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use session_core::{TokenGrant, wire};

use crate::api::cookie;
use crate::api::dto::login_request::LoginRequest;
use crate::error::AppError;
use crate::state::AppState;

/// `POST /api/login`: open a session, return the access token, set the refresh cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let sub = req.sub.trim();
    if sub.is_empty() {
        return Err(AppError::InvalidRequest("sub must not be empty".to_string()));
    }

    let out = state.tokens.issue_token_pair(sub).await?;
    let set_cookie = cookie::issue(
        wire::REFRESH_COOKIE_NAME,
        &out.refresh_token,
        &state.refresh_cookie,
    )?;

    tracing::info!(session_id = %out.session_id, "session opened");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, set_cookie)],
        Json(TokenGrant::bearer(out.access_token, out.expires_in)),
    )
        .into_response())
}

/// `POST /api/refresh-token`: mint a new access token from the refresh cookie.
///
/// The request body is ignored.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenGrant>, AppError> {
    let refresh_token = cookie::read(&headers, wire::REFRESH_COOKIE_NAME)
        .ok_or(AppError::Unauthorized("Refresh token not provided"))?;

    let out = state.tokens.refresh(refresh_token).await?;

    tracing::debug!(session_id = %out.session_id, "access token refreshed");

    Ok(Json(TokenGrant::bearer(out.access_token, out.expires_in)))
}

/// `POST /api/logout`: revoke the refresh cookie (if any) and clear it.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(refresh_token) = cookie::read(&headers, wire::REFRESH_COOKIE_NAME) {
        let revoked = state.tokens.revoke(refresh_token).await?;
        tracing::info!(revoked, "session closed");
    }

    let cleared = cookie::clear(wire::REFRESH_COOKIE_NAME, &state.refresh_cookie)?;
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cleared)]).into_response())
}
