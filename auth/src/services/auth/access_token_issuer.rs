use session_core::Claims;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::jwt::JwtIssuer;

#[derive(Clone, Debug)]
pub struct AccessTokenService {
    jwt: JwtIssuer,
}

impl AccessTokenService {
    pub fn new(jwt: JwtIssuer) -> Self {
        Self { jwt }
    }

    /// Issue an access token for `sub`.
    ///
    /// Every token gets a fresh `jti`, so two tokens minted in the same second still differ.
    pub fn issue_access_token(&self, sub: &str) -> Result<String, AppError> {
        if sub.trim().is_empty() {
            return Err(AppError::InvalidRequest("sub must not be empty".to_string()));
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            iat: now,
            exp: now + self.jwt.ttl_seconds() as i64,
            iss: self.jwt.issuer().map(str::to_string),
            jti: Some(Uuid::new_v4().to_string()),
        };

        self.jwt.sign(&claims)
    }

    pub fn access_token_ttl_seconds(&self) -> u64 {
        self.jwt.ttl_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_claims_carry_ttl_issuer_and_unique_jti() {
        let service = AccessTokenService::new(JwtIssuer::new(
            "secret",
            Some("https://auth.example".into()),
            600,
        ));

        let a = Claims::decode_unverified(&service.issue_access_token("user-1").unwrap()).unwrap();
        let b = Claims::decode_unverified(&service.issue_access_token("user-1").unwrap()).unwrap();

        assert_eq!(a.sub, "user-1");
        assert_eq!(a.exp - a.iat, 600);
        assert_eq!(a.iss.as_deref(), Some("https://auth.example"));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn empty_subject_is_rejected() {
        let service = AccessTokenService::new(JwtIssuer::new("secret", None, 600));
        assert!(matches!(
            service.issue_access_token(" "),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
