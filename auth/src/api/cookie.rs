//! Refresh-token cookie helpers.
//!
//! The browser (or a reqwest cookie jar) attaches the cookie to the refresh route on its
//! own; the client code never reads it.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::config::CookiePolicy;
use crate::error::AppError;

/// Find `name` among all `Cookie` headers.
pub fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

pub fn issue(name: &str, value: &str, policy: &CookiePolicy) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{name}={value}; {}; Max-Age={}",
        attributes(policy),
        policy.max_age_seconds
    ))
    .map_err(|e| {
        tracing::error!(error = %e, "refresh cookie is not a valid header value");
        AppError::Internal
    })
}

pub fn clear(name: &str, policy: &CookiePolicy) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!("{name}=; {}; Max-Age=0", attributes(policy))).map_err(|e| {
        tracing::error!(error = %e, "refresh cookie is not a valid header value");
        AppError::Internal
    })
}

fn attributes(policy: &CookiePolicy) -> String {
    let mut attrs = format!("HttpOnly; Path=/; SameSite={}", policy.same_site);
    if policy.secure {
        attrs.push_str("; Secure");
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSite;

    const POLICY: CookiePolicy = CookiePolicy {
        secure: true,
        same_site: SameSite::Strict,
        max_age_seconds: 60,
    };

    #[test]
    fn reads_named_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("refreshToken=abc-123; other=1"),
        );

        assert_eq!(read(&headers, "refreshToken"), Some("abc-123"));
        assert_eq!(read(&headers, "lang"), Some("en"));
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(read(&headers, "refreshToken"), None);
    }

    #[test]
    fn issued_and_cleared_attributes() {
        let set = issue("refreshToken", "abc", &POLICY).unwrap();
        assert_eq!(
            set.to_str().unwrap(),
            "refreshToken=abc; HttpOnly; Path=/; SameSite=Strict; Secure; Max-Age=60"
        );

        let cleared = clear("refreshToken", &POLICY).unwrap();
        assert!(cleared.to_str().unwrap().ends_with("Max-Age=0"));
    }
}
