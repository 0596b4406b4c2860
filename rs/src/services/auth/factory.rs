/// Factory: build the access-token verifier from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtVerifier, TokenVerifier};

pub fn build_verifier(config: &Config) -> Arc<dyn TokenVerifier> {
    Arc::new(JwtVerifier::new(
        &config.access_jwt_secret,
        config.auth_issuer.as_deref(),
        config.access_token_leeway_seconds,
    ))
}
