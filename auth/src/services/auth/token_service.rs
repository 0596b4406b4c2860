use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::{
    access_token_issuer::AccessTokenService, refresh_token_issuer::RefreshTokenService,
};

/// Orchestrates access-token issuance and refresh-token issuance/validation.
///
/// - AccessTokenService mints the short-lived JWT.
/// - RefreshTokenService owns the opaque, durable refresh credential.
///
/// Refresh tokens do not rotate: N concurrent refreshes with one cookie each get their own
/// valid access token.
#[derive(Clone, Debug)]
pub struct TokenService {
    access_issuer: AccessTokenService,
    refresh_issuer: RefreshTokenService,
}

impl TokenService {
    pub fn new(access_issuer: AccessTokenService, refresh_issuer: RefreshTokenService) -> Self {
        Self {
            access_issuer,
            refresh_issuer,
        }
    }

    /// Issue a new token pair for an authenticated subject.
    pub async fn issue_token_pair(&self, sub: &str) -> Result<IssuedTokenPair, AppError> {
        let access_token = self.access_issuer.issue_access_token(sub)?;
        let refresh = self.refresh_issuer.issue_refresh_token(sub).await?;

        Ok(IssuedTokenPair {
            access_token,
            refresh_token: refresh.token,
            expires_in: self.access_issuer.access_token_ttl_seconds(),
            session_id: refresh.session_id,
        })
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccessToken, AppError> {
        let v = self
            .refresh_issuer
            .validate_refresh_token(refresh_token, Utc::now())
            .await?
            .ok_or(AppError::Unauthorized("Refresh token invalid"))?;

        let access_token = self.access_issuer.issue_access_token(&v.subject)?;

        Ok(RefreshedAccessToken {
            access_token,
            expires_in: self.access_issuer.access_token_ttl_seconds(),
            session_id: v.session_id,
        })
    }

    pub async fn revoke(&self, refresh_token: &str) -> Result<u64, AppError> {
        self.refresh_issuer
            .revoke_by_token(refresh_token, Utc::now())
            .await
    }

    pub fn refresh_issuer(&self) -> &RefreshTokenService {
        &self.refresh_issuer
    }
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub session_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct RefreshedAccessToken {
    pub access_token: String,
    pub expires_in: u64,
    pub session_id: Uuid,
}
