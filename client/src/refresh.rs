use reqwest::Client;
use session_core::{RejectionKind, TokenGrant};
use url::Url;

use crate::error::RefreshError;

/// How concurrent refreshes against the one shared credential are coordinated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// One refresh in flight at a time. A request that fails with a credential that has
    /// already been replaced reuses the replacement instead of refreshing again.
    #[default]
    SingleFlight,
    /// Every failing request refreshes on its own; the last completed refresh wins the
    /// stored credential.
    PerRequest,
}

impl RefreshMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "single-flight" | "singleflight" => Some(Self::SingleFlight),
            "per-request" | "perrequest" => Some(Self::PerRequest),
            _ => None,
        }
    }
}

/// Which rejections are worth a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Any 401 or 403, whatever the guard's reason.
    #[default]
    AnyAuthRejection,
    /// Only a rejection the guard classified as `Expired`.
    ExpiredOnly,
}

impl RefreshTrigger {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "any" | "any-auth-rejection" => Some(Self::AnyAuthRejection),
            "expired" | "expired-only" => Some(Self::ExpiredOnly),
            _ => None,
        }
    }

    /// `kind` is `None` when the 401/403 did not come with a recognizable challenge.
    pub fn should_refresh(self, kind: Option<RejectionKind>) -> bool {
        match self {
            Self::AnyAuthRejection => true,
            Self::ExpiredOnly => kind == Some(RejectionKind::Expired),
        }
    }
}

/// POST an empty JSON object to the refresh route and return the new access token.
///
/// The refresh credential itself is attached by the client's cookie jar.
pub(crate) async fn request_grant(http: &Client, url: Url) -> Result<String, RefreshError> {
    let res = http
        .post(url)
        .json(&serde_json::json!({}))
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        return Err(RefreshError::Rejected(status.as_u16()));
    }

    let grant: TokenGrant = res.json().await.map_err(|e| {
        if e.is_decode() {
            RefreshError::MalformedGrant
        } else {
            RefreshError::Transport(e)
        }
    })?;

    if grant.token.trim().is_empty() {
        return Err(RefreshError::MalformedGrant);
    }
    Ok(grant.token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modes_and_triggers() {
        assert_eq!(RefreshMode::parse("single_flight"), Some(RefreshMode::SingleFlight));
        assert_eq!(RefreshMode::parse(" Per-Request "), Some(RefreshMode::PerRequest));
        assert_eq!(RefreshMode::parse("sometimes"), None);

        assert_eq!(RefreshTrigger::parse("any"), Some(RefreshTrigger::AnyAuthRejection));
        assert_eq!(RefreshTrigger::parse("EXPIRED_ONLY"), Some(RefreshTrigger::ExpiredOnly));
        assert_eq!(RefreshTrigger::parse(""), None);
    }

    #[test]
    fn expired_only_ignores_other_rejections() {
        let trigger = RefreshTrigger::ExpiredOnly;
        assert!(trigger.should_refresh(Some(RejectionKind::Expired)));
        assert!(!trigger.should_refresh(Some(RejectionKind::Invalid)));
        assert!(!trigger.should_refresh(Some(RejectionKind::Malformed)));
        assert!(!trigger.should_refresh(None));

        let any = RefreshTrigger::AnyAuthRejection;
        assert!(RejectionKind::ALL
            .into_iter()
            .filter(|k| k.is_auth_rejection())
            .all(|k| any.should_refresh(Some(k))));
        assert!(any.should_refresh(None));
    }
}
