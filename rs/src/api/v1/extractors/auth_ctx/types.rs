/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - guard が検証して request extensions に格納し、handler はこの型だけを受け取る
 */
use session_core::Claims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// Derived from the verified claims of this one request; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub token_id: Option<String>,
}

impl From<Claims> for AuthCtx {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_id: claims.jti,
        }
    }
}
