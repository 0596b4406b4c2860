use serde::{Deserialize, Serialize};

pub const BEARER_PREFIX: &str = "Bearer ";

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

pub const LOGIN_PATH: &str = "/api/login";
pub const REFRESH_PATH: &str = "/api/refresh-token";
pub const LOGOUT_PATH: &str = "/api/logout";

/// Format an `Authorization` header value for `token`.
pub fn bearer(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Strip the bearer scheme prefix.
///
/// The match is exact and case-sensitive: `bearer x` or `Token x` are not accepted.
pub fn strip_bearer(value: &str) -> Option<&str> {
    value.strip_prefix(BEARER_PREFIX)
}

/// Body returned by the login and refresh routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenGrant {
    pub fn bearer(token: String, expires_in: u64) -> Self {
        Self {
            token,
            token_type: Some("Bearer".to_string()),
            expires_in: Some(expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_bearer_is_case_sensitive() {
        assert_eq!(strip_bearer("Bearer abc"), Some("abc"));
        assert_eq!(strip_bearer("Bearer "), Some(""));
        assert_eq!(strip_bearer("bearer abc"), None);
        assert_eq!(strip_bearer("Token abc"), None);
        assert_eq!(strip_bearer("Bearerabc"), None);
    }

    #[test]
    fn grant_accepts_bare_token_body() {
        let grant: TokenGrant = serde_json::from_str(r#"{"token":"T2"}"#).unwrap();
        assert_eq!(grant.token, "T2");
        assert_eq!(grant.expires_in, None);

        let json = serde_json::to_value(TokenGrant::bearer("T3".into(), 600)).unwrap();
        assert_eq!(json["token"], "T3");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 600);
    }
}
