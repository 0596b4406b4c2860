/*
 * Responsibility
 * - 送信時: 現在の access token を Authorization ヘッダに付与
 * - 受信時: 401/403 を検出し、refresh を一度だけ行って元のリクエストを一度だけ再送
 * - refresh 失敗時: 保存 token の削除と SessionEvent::Ended の通知
 */
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Response};
use serde::Serialize;
use session_core::rejection::is_auth_status;
use session_core::{Claims, ClaimsError, TokenGrant, wire};
use tokio::sync::{Mutex, broadcast};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{AuthRejection, RefreshError, SessionError};
use crate::events::{EVENT_CAPACITY, EndReason, SessionEvent};
use crate::refresh::{self, RefreshMode};
use crate::register::CredentialRegister;
use crate::request::{Attempt, SessionRequest};
use crate::storage::{FileStorage, MemoryStorage, TokenStorage};

/// Shared request pipeline. Cheap to clone; clones share the token, cookie jar and
/// refresh gate.
#[derive(Clone, Debug)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    config: ClientConfig,
    login_url: Url,
    refresh_url: Url,
    logout_url: Url,
    register: CredentialRegister,
    // Held for the duration of a refresh in `RefreshMode::SingleFlight`.
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionClient {
    /// Build a client with the storage named by `config.token_file` (memory if unset).
    pub async fn open(config: ClientConfig) -> Result<Self, SessionError> {
        let storage: Arc<dyn TokenStorage> = match &config.token_file {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage).await
    }

    pub async fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self, SessionError> {
        let issuer_url = |url: Result<Url, url::ParseError>| {
            url.map_err(|e| SessionError::InvalidRequest(format!("issuer url: {e}")))
        };
        let login_url = issuer_url(config.login_url())?;
        let refresh_url = issuer_url(config.refresh_url())?;
        let logout_url = issuer_url(config.logout_url())?;

        // The cookie jar carries the refresh credential between login and refresh.
        let http = Client::builder().cookie_store(true).build()?;
        let register = CredentialRegister::open(storage).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::debug!(
            api_base = %config.api_base,
            auth_base = %config.auth_base,
            refresh_mode = ?config.refresh_mode,
            refresh_trigger = ?config.refresh_trigger,
            "session client ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                login_url,
                refresh_url,
                logout_url,
                register,
                refresh_gate: Mutex::new(()),
                events,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn register(&self) -> &CredentialRegister {
        &self.inner.register
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Send `request` with the current token, refreshing and replaying it at most once.
    ///
    /// Responses other than 401/403 are returned untouched, errors included.
    pub async fn send(&self, request: SessionRequest) -> Result<Response, SessionError> {
        let sent_with = self.inner.register.snapshot().await;
        let response = self.dispatch(&request, sent_with.token.as_deref()).await?;
        let rejection = match into_rejection(response) {
            Ok(response) => return Ok(response),
            Err(rejection) => rejection,
        };

        if sent_with.token.is_none() {
            return Err(SessionError::Unauthenticated(rejection));
        }
        if request.attempt() == Attempt::Retried {
            return Err(SessionError::RetryExhausted(rejection));
        }
        if !self.inner.config.refresh_trigger.should_refresh(rejection.kind) {
            return Err(SessionError::Rejected(rejection));
        }

        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            rejection = %rejection,
            "access token rejected; refreshing"
        );

        let token = self
            .renew(sent_with.version)
            .await
            .map_err(SessionError::RefreshFailed)?;

        let request = request.retried();
        let response = self.dispatch(&request, Some(&token)).await?;
        into_rejection(response).map_err(SessionError::RetryExhausted)
    }

    /// Log in against the issuer. `credentials` is posted as JSON; the refresh cookie lands in
    /// the client's cookie jar and the access token in the register.
    pub async fn login<B: Serialize + ?Sized>(
        &self,
        credentials: &B,
    ) -> Result<TokenGrant, SessionError> {
        let response = self
            .inner
            .http
            .post(self.inner.login_url.clone())
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if is_auth_status(status.as_u16()) {
            return Err(SessionError::Rejected(AuthRejection::from_response(response)));
        }
        if !status.is_success() {
            return Err(SessionError::InvalidRequest(format!("login answered {status}")));
        }

        let grant: TokenGrant = response.json().await?;
        self.establish(grant.token.clone()).await?;
        Ok(grant)
    }

    /// Adopt a token obtained elsewhere.
    pub async fn establish(&self, token: String) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::InvalidRequest("empty access token".to_string()));
        }
        let persisted = self.inner.register.replace(token).await;
        self.emit(SessionEvent::Established);
        persisted?;
        Ok(())
    }

    /// Revoke the refresh credential (best effort) and forget the access token.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let revoked = self
            .inner
            .http
            .post(self.inner.logout_url.clone())
            .send()
            .await;
        if let Err(e) = revoked {
            tracing::warn!(error = %e, "logout request failed; clearing local session anyway");
        }

        let purged = self.inner.register.purge().await;
        self.emit(SessionEvent::Ended(EndReason::LoggedOut));
        purged?;
        Ok(())
    }

    /// Claims of the current token, decoded without verification. For display only.
    pub async fn claims(&self) -> Result<Option<Claims>, ClaimsError> {
        self.inner
            .register
            .token()
            .await
            .map(|token| Claims::decode_unverified(&token))
            .transpose()
    }

    async fn dispatch(
        &self,
        request: &SessionRequest,
        token: Option<&str>,
    ) -> Result<Response, SessionError> {
        let url = self
            .inner
            .config
            .api_base
            .join(request.path())
            .map_err(|e| SessionError::InvalidRequest(format!("path {:?}: {e}", request.path())))?;

        let mut headers = request.headers().clone();
        headers.remove(AUTHORIZATION);
        if let Some(token) = token {
            let value = HeaderValue::from_str(&wire::bearer(token)).map_err(|_| {
                SessionError::InvalidRequest("access token is not a valid header value".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .headers(headers);
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }
        Ok(builder.send().await?)
    }

    /// Obtain a token newer than the one at `seen_version`.
    async fn renew(&self, seen_version: u64) -> Result<String, RefreshError> {
        match self.inner.config.refresh_mode {
            RefreshMode::PerRequest => self.refresh_now().await,
            RefreshMode::SingleFlight => {
                let _gate = self.inner.refresh_gate.lock().await;

                let current = self.inner.register.snapshot().await;
                if current.version != seen_version {
                    // Someone else refreshed (or ended the session) while we waited.
                    let token = current.token.ok_or(RefreshError::SessionEnded)?;
                    tracing::debug!(version = current.version, "reusing renewed access token");
                    return Ok(token);
                }
                self.refresh_now().await
            }
        }
    }

    async fn refresh_now(&self) -> Result<String, RefreshError> {
        match refresh::request_grant(&self.inner.http, self.inner.refresh_url.clone()).await {
            Ok(token) => {
                // The refreshed token still serves this session if it cannot be persisted.
                if let Err(e) = self.inner.register.replace(token.clone()).await {
                    tracing::debug!(error = %e, "keeping refreshed token in memory only");
                }
                self.emit(SessionEvent::Refreshed);
                Ok(token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed; ending session");
                // The in-memory token is gone even if the stored copy could not be removed.
                if let Err(e) = self.inner.register.purge().await {
                    tracing::debug!(error = %e, "stored token survives ended session");
                }
                self.emit(SessionEvent::Ended(EndReason::RefreshFailed));
                Err(err)
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.inner.events.send(event);
    }
}

fn into_rejection(response: Response) -> Result<Response, AuthRejection> {
    if is_auth_status(response.status().as_u16()) {
        Err(AuthRejection::from_response(response))
    } else {
        Ok(response)
    }
}
