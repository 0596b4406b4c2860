use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::refresh_token_repo::RefreshTokenRepo;

/// A refresh token that has been validated and resolved to its subject.
#[derive(Clone, Debug)]
pub struct ValidatedRefreshToken {
    pub subject: String,
    pub session_id: Uuid,
}

/// A freshly minted refresh token. `token` is the only copy of the raw value.
#[derive(Clone, Debug)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RefreshTokenService {
    repo: Arc<dyn RefreshTokenRepo>,
    ttl_seconds: u64,
}

impl std::fmt::Debug for RefreshTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl RefreshTokenService {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, ttl_seconds: u64) -> Self {
        Self { repo, ttl_seconds }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue a new refresh token for `subject` and store its hash.
    pub async fn issue_refresh_token(&self, subject: &str) -> Result<IssuedRefreshToken, AppError> {
        let token = generate_refresh_token()?;
        let token_hash = hash_refresh_token(&token);

        let expires_at = Utc::now() + ChronoDuration::seconds(self.ttl_seconds as i64);

        let session_id = self
            .repo
            .insert(subject.to_string(), token_hash, expires_at)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to insert refresh token");
                AppError::Internal
            })?;

        debug!(
            session_id = %session_id,
            ttl_seconds = self.ttl_seconds,
            expires_at = %expires_at,
            "Issued refresh token"
        );

        Ok(IssuedRefreshToken {
            token,
            session_id,
            expires_at,
        })
    }

    /// Validate the presented refresh token.
    ///
    /// Returns `Ok(None)` when the token is unknown, expired or revoked. The token is not
    /// consumed: concurrent refreshes with the same value all succeed.
    pub async fn validate_refresh_token(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ValidatedRefreshToken>, AppError> {
        let row = self
            .repo
            .find_active_by_hash(hash_refresh_token(refresh_token), now)
            .await
            .map_err(|e| {
                error!(error = %e, now = %now, "Failed to find refresh token");
                AppError::Internal
            })?;

        let Some(row) = row else {
            debug!("Refresh token not found or inactive");
            return Ok(None);
        };

        // Bookkeeping only; a failure here must not fail the refresh.
        if let Err(e) = self.repo.mark_used(row.id, now).await {
            error!(session_id = %row.id, error = %e, "Failed to record refresh token use");
        }

        Ok(Some(ValidatedRefreshToken {
            subject: row.subject,
            session_id: row.id,
        }))
    }

    /// Revoke a refresh token by the raw token.
    pub async fn revoke_by_token(
        &self,
        refresh_token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let row = self
            .repo
            .find_active_by_hash(hash_refresh_token(refresh_token), revoked_at)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to find refresh token");
                AppError::Internal
            })?;

        let Some(row) = row else {
            debug!("Refresh token not found or already inactive");
            return Ok(0);
        };

        debug!(session_id = %row.id, revoked_at = %revoked_at, "Revoking refresh token");

        self.repo.revoke(row.id, revoked_at).await.map_err(|e| {
            error!(error = %e, "Failed to revoke refresh token");
            AppError::Internal
        })
    }

    /// Remove expired and revoked records.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.repo.delete_inactive(now).await.map_err(|e| {
            error!(error = %e, "Failed to sweep refresh tokens");
            AppError::Internal
        })
    }
}

fn generate_refresh_token() -> Result<String, AppError> {
    // 32 bytes of entropy -> URL-safe base64 without padding (cookie-safe).
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|e| {
        error!(error = %e, "getrandom failed");
        AppError::Internal
    })?;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn hash_refresh_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}
