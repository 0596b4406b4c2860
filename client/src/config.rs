/*
 * Responsibility
 * - 環境変数からのクライアント設定読み込み (API/Auth の URL, refresh 方式, token 保存先)
 * - 設定値のバリデーション
 */
use std::path::PathBuf;

use session_core::wire;
use url::Url;

use crate::refresh::{RefreshMode, RefreshTrigger};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that `SessionRequest` paths are resolved against.
    pub api_base: Url,
    /// Base URL of the session issuer (login, refresh, logout routes).
    pub auth_base: Url,
    pub refresh_mode: RefreshMode,
    pub refresh_trigger: RefreshTrigger,
    /// `None` keeps the token in memory only.
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Issuer and API on the same origin, default refresh policy, memory storage.
    pub fn new(api_base: Url) -> Self {
        Self {
            auth_base: api_base.clone(),
            api_base,
            refresh_mode: RefreshMode::default(),
            refresh_trigger: RefreshTrigger::default(),
            token_file: None,
        }
    }

    pub fn with_auth_base(mut self, auth_base: Url) -> Self {
        self.auth_base = auth_base;
        self
    }

    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    pub fn with_refresh_trigger(mut self, trigger: RefreshTrigger) -> Self {
        self.refresh_trigger = trigger;
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_base = std::env::var("SESSION_API_URL")
            .map_err(|_| ConfigError::Missing("SESSION_API_URL"))?;
        let api_base = Url::parse(api_base.trim())
            .map_err(|_| ConfigError::Invalid("SESSION_API_URL"))?;

        let mut config = Self::new(api_base);

        if let Some(auth_base) = non_empty("SESSION_AUTH_URL") {
            config.auth_base =
                Url::parse(&auth_base).map_err(|_| ConfigError::Invalid("SESSION_AUTH_URL"))?;
        }
        if let Some(mode) = non_empty("SESSION_REFRESH_MODE") {
            config.refresh_mode =
                RefreshMode::parse(&mode).ok_or(ConfigError::Invalid("SESSION_REFRESH_MODE"))?;
        }
        if let Some(trigger) = non_empty("SESSION_REFRESH_TRIGGER") {
            config.refresh_trigger = RefreshTrigger::parse(&trigger)
                .ok_or(ConfigError::Invalid("SESSION_REFRESH_TRIGGER"))?;
        }
        config.token_file = non_empty("SESSION_TOKEN_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        self.auth_base.join(wire::LOGIN_PATH)
    }

    pub fn refresh_url(&self) -> Result<Url, url::ParseError> {
        self.auth_base.join(wire::REFRESH_PATH)
    }

    pub fn logout_url(&self) -> Result<Url, url::ParseError> {
        self.auth_base.join(wire::LOGOUT_PATH)
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_defaults_to_api_origin() {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:3000").unwrap());
        assert_eq!(
            config.refresh_url().unwrap().as_str(),
            "http://127.0.0.1:3000/api/refresh-token"
        );
        assert_eq!(config.refresh_mode, RefreshMode::SingleFlight);
        assert_eq!(config.refresh_trigger, RefreshTrigger::AnyAuthRejection);
        assert!(config.token_file.is_none());

        let split = config.with_auth_base(Url::parse("http://127.0.0.1:4000/").unwrap());
        assert_eq!(
            split.login_url().unwrap().as_str(),
            "http://127.0.0.1:4000/api/login"
        );
    }
}
