use serde::Deserialize;

/// Request body for `POST /api/login`.
///
/// The caller has already authenticated the user; this route only opens the session.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Subject (user id) the session is opened for.
    pub sub: String,
}
