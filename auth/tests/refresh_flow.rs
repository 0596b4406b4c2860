use auth::app::{build_state, router};
use auth::config::{AppEnv, Config, CookiePolicy, SameSite};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use session_core::{Claims, wire};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        issuer: Some("session-test".to_string()),
        access_jwt_secret: "refresh-flow-secret".to_string(),
        access_token_ttl_seconds: 120,
        refresh_token_ttl_seconds: 3600,
        refresh_cookie: CookiePolicy {
            secure: false,
            same_site: SameSite::Lax,
            max_age_seconds: 3600,
        },
    };
    router(build_state(&config))
}

fn post(path: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = cookie {
        req = req.header(header::COOKIE, format!("{}={value}", wire::REFRESH_COOKIE_NAME));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in and return (access token, refresh cookie value).
async fn login(app: &Router, sub: &str) -> (String, String) {
    let res = app
        .clone()
        .oneshot(post(wire::LOGIN_PATH, None, &format!(r#"{{"sub":"{sub}"}}"#)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, v)| v.to_string())
        .unwrap();

    let body = json(res).await;
    (body["token"].as_str().unwrap().to_string(), cookie)
}

#[tokio::test]
async fn login_sets_cookie_and_returns_bearer_grant() {
    let app = app();
    let (token, cookie) = login(&app, "user-42").await;

    assert_eq!(cookie.len(), 43);
    let claims = Claims::decode_unverified(&token).unwrap();
    assert_eq!(claims.sub, "user-42");
    assert_eq!(claims.iss.as_deref(), Some("session-test"));
}

#[tokio::test]
async fn login_rejects_empty_subject() {
    let res = app()
        .oneshot(post(wire::LOGIN_PATH, None, r#"{"sub":"  "}"#))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_with_cookie_returns_new_token() {
    let app = app();
    let (first, cookie) = login(&app, "user-1").await;

    let res = app
        .clone()
        .oneshot(post(wire::REFRESH_PATH, Some(&cookie), "{}"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");

    let body = json(res).await;
    let renewed = body["token"].as_str().unwrap();
    assert_ne!(renewed, first);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 120);
    assert_eq!(Claims::decode_unverified(renewed).unwrap().sub, "user-1");
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let res = app()
        .oneshot(post(wire::REFRESH_PATH, None, "{}"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(res).await["error"]["message"], "Refresh token not provided");
}

#[tokio::test]
async fn refresh_with_unknown_cookie_is_unauthorized() {
    let res = app()
        .oneshot(post(wire::REFRESH_PATH, Some("not-a-real-token"), "{}"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(res).await["error"]["message"], "Refresh token invalid");
}

#[tokio::test]
async fn logout_revokes_the_refresh_cookie() {
    let app = app();
    let (_, cookie) = login(&app, "user-1").await;

    let res = app
        .clone()
        .oneshot(post(wire::LOGOUT_PATH, Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let res = app
        .oneshot(post(wire::REFRESH_PATH, Some(&cookie), "{}"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_refreshes_with_one_cookie_all_succeed() {
    let app = app();
    let (_, cookie) = login(&app, "user-1").await;

    let calls = (0..4).map(|_| {
        let app = app.clone();
        let cookie = cookie.clone();
        tokio::spawn(async move {
            let res = app
                .oneshot(post(wire::REFRESH_PATH, Some(&cookie), "{}"))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            json(res).await["token"].as_str().unwrap().to_string()
        })
    });

    let mut tokens = Vec::new();
    for call in calls {
        tokens.push(call.await.unwrap());
    }
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 4);
}
