//! access token 検証 → AuthCtx を extensions に入れる
//!
//! Every protected request goes through `classify`, which stops at the first rule that
//! applies:
//!
//! 1. no `Authorization` header          → `Missing`
//! 2. header without the `Bearer ` prefix → `Malformed`
//! 3. verifier says expired               → `Expired`
//!    any other verification failure      → `Invalid`
//! 4. verified                            → claims go to the handler as `AuthCtx`
//! 5. verifier failure or panic           → `InternalError`
//!
//! The guard never retries; refreshing is the client's job.

use std::panic::{self, AssertUnwindSafe};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};
use session_core::{Claims, RejectionKind, wire};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{TokenVerifier, VerifyError};
use crate::state::AppState;

/// 保護対象の Router に認証を掛ける。
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = classify(
        req.headers().get(header::AUTHORIZATION),
        state.verifier.as_ref(),
    )?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::from(claims));

    Ok(next.run(req).await)
}

/// Classify a raw `Authorization` header value.
pub fn classify(
    header: Option<&HeaderValue>,
    verifier: &dyn TokenVerifier,
) -> Result<Claims, RejectionKind> {
    let Some(value) = header else {
        return Err(RejectionKind::Missing);
    };

    // Non-ASCII header bytes cannot carry the scheme prefix.
    let token = value
        .to_str()
        .ok()
        .and_then(wire::strip_bearer)
        .ok_or(RejectionKind::Malformed)?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| verifier.verify(token)));

    match outcome {
        Ok(Ok(claims)) => Ok(claims),
        Ok(Err(VerifyError::Expired)) => {
            tracing::debug!("access token expired");
            Err(RejectionKind::Expired)
        }
        Ok(Err(VerifyError::Invalid(reason))) => {
            tracing::debug!(%reason, "access token verification failed");
            Err(RejectionKind::Invalid)
        }
        Ok(Err(VerifyError::Internal(reason))) => {
            tracing::error!(%reason, "access token verifier failure");
            Err(RejectionKind::InternalError)
        }
        Err(_) => {
            tracing::error!("access token verifier panicked");
            Err(RejectionKind::InternalError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifier scripted by the token text.
    #[derive(Debug)]
    struct ScriptedVerifier;

    impl TokenVerifier for ScriptedVerifier {
        fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
            match token {
                "good" => Ok(Claims {
                    sub: "user-1".into(),
                    iat: 1,
                    exp: i64::MAX,
                    iss: None,
                    jti: None,
                }),
                "expired" => Err(VerifyError::Expired),
                "broken-key" => Err(VerifyError::Internal("bad key".into())),
                "panic" => panic!("verifier crashed"),
                _ => Err(VerifyError::Invalid("bad signature".into())),
            }
        }
    }

    fn run(raw: Option<&str>) -> Result<Claims, RejectionKind> {
        let value = raw.map(|s| HeaderValue::from_str(s).unwrap());
        classify(value.as_ref(), &ScriptedVerifier)
    }

    #[test]
    fn absent_header_is_missing() {
        assert_eq!(run(None), Err(RejectionKind::Missing));
    }

    #[test]
    fn prefix_rule_wins_over_token_validity() {
        assert_eq!(run(Some("good")), Err(RejectionKind::Malformed));
        assert_eq!(run(Some("bearer good")), Err(RejectionKind::Malformed));
        assert_eq!(run(Some("Token good")), Err(RejectionKind::Malformed));
        assert_eq!(run(Some("")), Err(RejectionKind::Malformed));
    }

    #[test]
    fn non_ascii_header_is_malformed() {
        let value = HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap();
        assert_eq!(
            classify(Some(&value), &ScriptedVerifier),
            Err(RejectionKind::Malformed)
        );
    }

    #[test]
    fn verifier_outcomes() {
        assert_eq!(run(Some("Bearer good")).unwrap().sub, "user-1");
        assert_eq!(run(Some("Bearer expired")), Err(RejectionKind::Expired));
        assert_eq!(run(Some("Bearer forged")), Err(RejectionKind::Invalid));
        assert_eq!(run(Some("Bearer ")), Err(RejectionKind::Invalid));
        assert_eq!(
            run(Some("Bearer broken-key")),
            Err(RejectionKind::InternalError)
        );
    }

    #[test]
    fn verifier_panic_is_internal_error() {
        assert_eq!(run(Some("Bearer panic")), Err(RejectionKind::InternalError));
    }
}
