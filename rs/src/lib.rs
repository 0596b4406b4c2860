//! Storefront resource server: every `/api/v1` route except `/health` sits behind the
//! access-token guard in `middleware::auth::access`.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
