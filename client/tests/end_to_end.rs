//! The real issuer and resource server, driven through `SessionClient`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use resource_server::services::auth::JwtVerifier;
use resource_server::state::AppState as ApiState;
use session_client::{
    ClientConfig, EndReason, RefreshError, SessionClient, SessionError, SessionEvent,
    SessionRequest,
};
use session_core::{Claims, RejectionKind};
use url::Url;

const SECRET: &str = "end-to-end-secret";
const ISSUER: &str = "session-e2e";

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

async fn start_auth() -> SocketAddr {
    let config = auth::config::Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: auth::config::AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        issuer: Some(ISSUER.to_string()),
        access_jwt_secret: SECRET.to_string(),
        access_token_ttl_seconds: 300,
        refresh_token_ttl_seconds: 3600,
        refresh_cookie: auth::config::CookiePolicy {
            secure: false,
            same_site: auth::config::SameSite::Lax,
            max_age_seconds: 3600,
        },
    };
    serve(auth::app::router(auth::app::build_state(&config))).await
}

async fn start_api() -> SocketAddr {
    let verifier = Arc::new(JwtVerifier::new(SECRET, Some(ISSUER), 0));
    serve(resource_server::app::router(ApiState::new(verifier))).await
}

fn expired_token(sub: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        iat: now - 600,
        exp: now - 60,
        iss: Some(ISSUER.to_string()),
        jti: Some("expired".to_string()),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn me(client: &SessionClient) -> Result<serde_json::Value, SessionError> {
    let res = client.send(SessionRequest::get("/api/v1/me")).await?;
    assert_eq!(res.status(), 200);
    Ok(res.json().await?)
}

#[tokio::test]
async fn expired_session_is_renewed_through_the_refresh_cookie() {
    let (auth_addr, api_addr) = (start_auth().await, start_api().await);
    let config = ClientConfig::new(Url::parse(&format!("http://{api_addr}")).unwrap())
        .with_auth_base(Url::parse(&format!("http://{auth_addr}")).unwrap());
    let client = SessionClient::open(config).await.unwrap();
    let mut events = client.subscribe();

    let grant = client
        .login(&serde_json::json!({ "sub": "user-7" }))
        .await
        .unwrap();
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Established);
    assert_eq!(me(&client).await.unwrap()["sub"], "user-7");

    // Pretend the access token aged out; the refresh cookie is still in the jar.
    let stale = expired_token("user-7");
    client.establish(stale.clone()).await.unwrap();
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Established);

    assert_eq!(me(&client).await.unwrap()["sub"], "user-7");
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);

    let current = client.register().token().await.unwrap();
    assert_ne!(current, stale);
    assert_ne!(current, grant.token);
    let claims = client.claims().await.unwrap().unwrap();
    assert_eq!(claims.sub, "user-7");
    assert_eq!(claims.iss.as_deref(), Some(ISSUER));
    assert!(!claims.is_expired_at(chrono::Utc::now().timestamp()));
}

#[tokio::test]
async fn logout_ends_the_session_for_good() {
    let (auth_addr, api_addr) = (start_auth().await, start_api().await);
    let config = ClientConfig::new(Url::parse(&format!("http://{api_addr}")).unwrap())
        .with_auth_base(Url::parse(&format!("http://{auth_addr}")).unwrap());
    let client = SessionClient::open(config).await.unwrap();

    client
        .login(&serde_json::json!({ "sub": "user-8" }))
        .await
        .unwrap();
    let mut events = client.subscribe();

    client.logout().await.unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Ended(EndReason::LoggedOut)
    );
    assert_eq!(client.claims().await.unwrap(), None);

    match me(&client).await {
        Err(SessionError::Unauthenticated(rejection)) => {
            assert_eq!(rejection.kind, Some(RejectionKind::Missing));
        }
        other => panic!("expected Unauthenticated, got {other:?}"),
    }

    // An expired token can no longer be renewed: the refresh cookie is gone.
    client.establish(expired_token("user-8")).await.unwrap();
    match me(&client).await {
        Err(SessionError::RefreshFailed(RefreshError::Rejected(401))) => {}
        other => panic!("expected RefreshFailed, got {other:?}"),
    }
    assert_eq!(client.register().token().await, None);
}

#[tokio::test]
async fn public_routes_need_no_session() {
    let api_addr = start_api().await;
    let client = SessionClient::open(ClientConfig::new(
        Url::parse(&format!("http://{api_addr}")).unwrap(),
    ))
    .await
    .unwrap();

    let res = client
        .send(SessionRequest::get("/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
