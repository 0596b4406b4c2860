use std::collections::HashMap;
use std::{future::Future, pin::Pin};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub subject: String,
    pub token_hash: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Storage for refresh-token records.
///
/// Only a hash of the refresh token is stored (opaque token design).
pub trait RefreshTokenRepo: Send + Sync {
    fn insert(
        &self,
        subject: String,
        token_hash: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> BoxFuture<'_, RepoResult<Uuid>>;

    /// Fetch a row by hash, only if it is not revoked and not expired.
    fn find_active_by_hash(
        &self,
        token_hash: Vec<u8>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, RepoResult<Option<RefreshTokenRow>>>;

    fn mark_used(&self, id: Uuid, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<()>>;

    /// Returns the number of rows revoked (0 if already revoked or unknown).
    fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<u64>>;

    /// Drop rows that expired or were revoked before `now`.
    fn delete_inactive(&self, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<u64>>;
}

/// Rows kept by `InMemoryRefreshTokenRepo::new` before inserts are refused.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Process-local refresh-token store. Sessions do not survive a restart.
///
/// Bounded: once `capacity` rows are held, `insert` reports `RepoError::Unavailable` until
/// a sweep frees space. Lookups never fail.
#[derive(Debug)]
pub struct InMemoryRefreshTokenRepo {
    rows: RwLock<HashMap<Uuid, RefreshTokenRow>>,
    capacity: usize,
}

impl Default for InMemoryRefreshTokenRepo {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryRefreshTokenRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl RefreshTokenRepo for InMemoryRefreshTokenRepo {
    fn insert(
        &self,
        subject: String,
        token_hash: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> BoxFuture<'_, RepoResult<Uuid>> {
        Box::pin(async move {
            let id = Uuid::new_v4();
            let row = RefreshTokenRow {
                id,
                subject,
                token_hash,
                issued_at: Utc::now(),
                expires_at,
                last_used_at: None,
                revoked_at: None,
            };
            let mut rows = self.rows.write().await;
            if rows.len() >= self.capacity {
                return Err(RepoError::Unavailable(format!(
                    "capacity of {} rows reached",
                    self.capacity
                )));
            }
            rows.insert(id, row);
            Ok(id)
        })
    }

    fn find_active_by_hash(
        &self,
        token_hash: Vec<u8>,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, RepoResult<Option<RefreshTokenRow>>> {
        Box::pin(async move {
            let rows = self.rows.read().await;
            Ok(rows
                .values()
                .find(|row| row.token_hash == token_hash && row.is_active(now))
                .cloned())
        })
    }

    fn mark_used(&self, id: Uuid, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<()>> {
        Box::pin(async move {
            if let Some(row) = self.rows.write().await.get_mut(&id) {
                row.last_used_at = Some(now);
            }
            Ok(())
        })
    }

    fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<u64>> {
        Box::pin(async move {
            let mut rows = self.rows.write().await;
            match rows.get_mut(&id) {
                Some(row) if row.revoked_at.is_none() => {
                    row.revoked_at = Some(now);
                    Ok(1)
                }
                _ => Ok(0),
            }
        })
    }

    fn delete_inactive(&self, now: DateTime<Utc>) -> BoxFuture<'_, RepoResult<u64>> {
        Box::pin(async move {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|_, row| row.is_active(now));
            Ok((before - rows.len()) as u64)
        })
    }
}
