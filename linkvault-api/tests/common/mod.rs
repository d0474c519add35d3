//! Common test utilities for integration tests
//!
//! Builds the real router over the in-memory credential store, a manual
//! clock and a cheap Argon2 configuration, and offers request helpers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use linkvault_api::app::{build_router, AppState};
use linkvault_api::config::Config;
use linkvault_shared::auth::password::Argon2PasswordHasher;
use linkvault_shared::clock::ManualClock;
use linkvault_shared::store::memory::InMemoryCredentialStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const COOKIE_NAME: &str = "linkvault_refresh";

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "Passw0rd!";

/// Test context containing the router and the handles it was built from
pub struct TestContext {
    pub app: Router,
    pub clock: ManualClock,
    pub store: InMemoryCredentialStore,
    pub shutdown: CancellationToken,
}

impl TestContext {
    /// Development-mode server
    pub fn new() -> Self {
        Self::with_environment("development")
    }

    /// Production-mode server (secure cookies, HSTS)
    pub fn production() -> Self {
        Self::with_environment("production")
    }

    fn with_environment(app_env: &str) -> Self {
        let vars: HashMap<&str, String> = HashMap::from([
            ("APP_ENV", app_env.to_string()),
            ("DATABASE_URL", "postgresql://unused/linkvault".to_string()),
            ("JWT_SECRET", SECRET.to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let clock = ManualClock::default();
        let store = InMemoryCredentialStore::new();
        let shutdown = CancellationToken::new();

        let state = AppState::new(
            config,
            Arc::new(store.clone()),
            Arc::new(Argon2PasswordHasher::with_params(1024, 1, 1).unwrap()),
            Arc::new(clock.clone()),
        )
        .unwrap()
        .with_shutdown(shutdown.clone());

        Self {
            app: build_router(state),
            clock,
            store,
            shutdown,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST with an optional refresh cookie and no body
    pub async fn post_with_cookie(&self, uri: &str, refresh_token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(token) = refresh_token {
            builder = builder.header(header::COOKIE, format!("{}={}", COOKIE_NAME, token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn register_alice(&self) -> Response<Body> {
        self.post_json(
            "/auth/register",
            json!({ "name": "Alice", "email": ALICE_EMAIL, "password": ALICE_PASSWORD }),
        )
        .await
    }

    /// Registers and logs in Alice, returning the access token and the
    /// refresh token from the cookie
    pub async fn login_alice(&self) -> (String, String) {
        self.register_alice().await;

        let response = self
            .post_json(
                "/auth/login",
                json!({ "email": ALICE_EMAIL, "password": ALICE_PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), 200);

        let refresh = refresh_cookie(&response).expect("login sets the refresh cookie");
        let body = body_json(response).await;
        let access = body["accessToken"].as_str().unwrap().to_string();

        (access, refresh)
    }
}

/// Reads a JSON response body
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The raw `Set-Cookie` header for the refresh cookie
pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", COOKIE_NAME)))
        .map(str::to_string)
}

/// The refresh token value carried by the response's `Set-Cookie`, if
/// non-empty
pub fn refresh_cookie(response: &Response<Body>) -> Option<String> {
    let header = set_cookie_header(response)?;
    let (pair, _) = header.split_once(';')?;
    let (_, value) = pair.split_once('=')?;
    (!value.is_empty()).then(|| value.to_string())
}
