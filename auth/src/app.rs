use std::time::Duration;
use std::{panic, process, sync::Arc};

use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::{Router, routing::get};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::repos::refresh_token_repo::InMemoryRefreshTokenRepo;
use crate::services::auth::{AccessTokenService, JwtIssuer, RefreshTokenService, TokenService};
use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,auth=debug,tower_http=debug cargo run -p auth
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting auth server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    spawn_refresh_token_sweeper(state.tokens.clone(), SWEEP_INTERVAL);

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, addr = %config.addr, "failed to bind");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!(error = %e, "server error");
        AppError::Internal
    })?;

    Ok(())
}

pub fn build_state(config: &Config) -> AppState {
    let jwt = JwtIssuer::new(
        &config.access_jwt_secret,
        config.issuer.clone(),
        config.access_token_ttl_seconds,
    );
    let repo = Arc::new(InMemoryRefreshTokenRepo::new());

    let tokens = TokenService::new(
        AccessTokenService::new(jwt),
        RefreshTokenService::new(repo, config.refresh_token_ttl_seconds),
    );

    AppState::new(Arc::new(tokens), config.refresh_cookie)
}

/// Routes with the no-store policy applied; no CORS or tracing. Used directly by tests.
pub fn router(state: AppState) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    Router::new()
        .route("/health", get(health))
        .merge(api::routes(state.clone()))
        .with_state(state)
        // Token responses must never be cached.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    router(state)
        .layer(cors(config))
        .layer(TraceLayer::new_for_http())
}

/// The refresh cookie only travels on credentialed requests, so unlike the resource server
/// this policy allows credentials and therefore never uses a wildcard origin.
fn cors(config: &Config) -> CorsLayer {
    let allow_origin = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        })
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(60 * 10))
}

pub fn spawn_refresh_token_sweeper(
    tokens: Arc<TokenService>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match tokens.refresh_issuer().sweep(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "swept inactive refresh tokens"),
                Err(err) => tracing::warn!(error = %err, "refresh token sweep failed (will retry)"),
            }
        }
    })
}
