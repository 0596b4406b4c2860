use std::sync::Arc;

use tokio::sync::RwLock;

use crate::storage::{LEGACY_TOKEN_KEY, StorageResult, TOKEN_KEY, TokenStorage};

/// The current token together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub token: Option<String>,
    pub version: u64,
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<String>,
    version: u64,
}

/// The single logical "current access token" shared by every in-flight request.
///
/// Each `replace` or `purge` bumps the version by one, so a request can tell whether the
/// token it was sent with is still current. Writes go through to `TokenStorage` while the
/// register is locked, so storage sees writes in version order. The in-memory value is
/// authoritative: a storage failure is returned to the caller but not rolled back.
#[derive(Debug)]
pub struct CredentialRegister {
    slot: RwLock<Slot>,
    storage: Arc<dyn TokenStorage>,
}

impl CredentialRegister {
    /// Load the stored token, migrating a value found only under the legacy key.
    pub async fn open(storage: Arc<dyn TokenStorage>) -> StorageResult<Self> {
        let token = match storage.get(TOKEN_KEY).await? {
            Some(token) => Some(token),
            None => match storage.get(LEGACY_TOKEN_KEY).await? {
                Some(legacy) => {
                    storage.set(TOKEN_KEY, &legacy).await?;
                    storage.remove(LEGACY_TOKEN_KEY).await?;
                    tracing::info!(
                        backend = storage.backend_name(),
                        "migrated access token from legacy storage key"
                    );
                    Some(legacy)
                }
                None => None,
            },
        }
        .filter(|t| !t.is_empty());

        Ok(Self {
            slot: RwLock::new(Slot { token, version: 0 }),
            storage,
        })
    }

    pub async fn snapshot(&self) -> Snapshot {
        let slot = self.slot.read().await;
        Snapshot {
            token: slot.token.clone(),
            version: slot.version,
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.slot.read().await.token.clone()
    }

    pub async fn version(&self) -> u64 {
        self.slot.read().await.version
    }

    /// Install a new token. Returns the new version.
    pub async fn replace(&self, token: String) -> StorageResult<u64> {
        let mut slot = self.slot.write().await;
        slot.version += 1;
        let version = slot.version;
        let persisted = self.storage.set(TOKEN_KEY, &token).await;
        slot.token = Some(token);
        persisted.inspect_err(|e| {
            tracing::warn!(error = %e, version, "access token not persisted");
        })?;
        Ok(version)
    }

    /// Drop the token from memory and from both storage keys. Returns the new version.
    pub async fn purge(&self) -> StorageResult<u64> {
        let mut slot = self.slot.write().await;
        slot.token = None;
        slot.version += 1;

        let removed = self.storage.remove(TOKEN_KEY).await;
        let removed_legacy = self.storage.remove(LEGACY_TOKEN_KEY).await;
        removed.and(removed_legacy).inspect_err(|e| {
            tracing::warn!(error = %e, "stored access token not removed");
        })?;
        Ok(slot.version)
    }
}
