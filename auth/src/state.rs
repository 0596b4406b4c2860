use std::sync::Arc;

use crate::config::CookiePolicy;
use crate::services::auth::TokenService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub refresh_cookie: CookiePolicy,
}

impl AppState {
    pub fn new(tokens: Arc<TokenService>, refresh_cookie: CookiePolicy) -> Self {
        Self {
            tokens,
            refresh_cookie,
        }
    }
}
