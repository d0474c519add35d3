/// Application state and router builder
///
/// [`AppState`] wires the session service, the access token gateway and the
/// refresh cookie policy together from one [`Config`]. The store, password
/// hasher and clock are passed in so the server runs on PostgreSQL while tests
/// run the same router on the in-memory store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use linkvault_api::{app::{build_router, AppState}, config::Config};
/// use linkvault_shared::auth::password::Argon2PasswordHasher;
/// use linkvault_shared::clock::SystemClock;
/// use linkvault_shared::db::pool::create_pool;
/// use linkvault_shared::store::postgres::PgCredentialStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(
///     config,
///     Arc::new(PgCredentialStore::new(pool)),
///     Arc::new(Argon2PasswordHasher::default()),
///     Arc::new(SystemClock),
/// )?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    cookie::RefreshCookie,
    middleware::{
        rate_limit::{login_rate_limit, LoginRateLimiter},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use linkvault_shared::auth::gateway::AuthenticationGateway;
use linkvault_shared::auth::jwt::JwtError;
use linkvault_shared::auth::middleware::bearer_auth;
use linkvault_shared::auth::password::PasswordHasher;
use linkvault_shared::clock::Clock;
use linkvault_shared::session::SessionService;
use linkvault_shared::store::CredentialStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Header carrying the per-request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,

    /// Access token verification for protected routes
    pub gateway: Arc<AuthenticationGateway>,

    pub refresh_cookie: Arc<RefreshCookie>,

    pub clock: Arc<dyn Clock>,

    /// Application configuration
    pub config: Arc<Config>,

    /// `None` when `REDIS_URL` is unset
    pub rate_limiter: Option<LoginRateLimiter>,

    /// Cancelled on graceful shutdown; handlers use child tokens
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates application state
    ///
    /// # Errors
    ///
    /// Fails if the configured JWT secret is missing or too short
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, JwtError> {
        let jwt = Arc::new(config.jwt.clone());

        Ok(Self {
            sessions: Arc::new(SessionService::new(jwt.clone(), store, passwords, clock.clone())?),
            gateway: Arc::new(AuthenticationGateway::new(jwt, clock.clone())?),
            refresh_cookie: Arc::new(RefreshCookie::new(&config.jwt, config.is_production())),
            clock,
            config: Arc::new(config),
            rate_limiter: None,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn with_rate_limiter(mut self, limiter: LoginRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Cancellation token for one request
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health              # Health check (public)
/// └── /auth/
///     ├── POST /register        # public
///     ├── POST /login           # public, rate limited
///     ├── POST /refresh         # refresh cookie
///     ├── POST /logout          # refresh cookie
///     └── GET  /me              # bearer token
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, correlation id, tracing,
/// request timeout.
pub fn build_router(state: AppState) -> Router {
    let login_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route_layer(from_fn_with_state(state.clone(), login_rate_limit));

    let protected_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(from_fn_with_state(state.gateway.clone(), bearer_auth));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .merge(login_routes)
        .merge(protected_routes);

    let correlation_id = HeaderName::from_static(CORRELATION_ID_HEADER);
    let request_timeout = Duration::from_secs(state.config.api.request_timeout_secs);

    let http_stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(correlation_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let correlation_id = request
                        .headers()
                        .get(CORRELATION_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        correlation_id = %correlation_id,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(correlation_id))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .layer(http_stack)
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.is_production()))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(CORRELATION_ID_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    match HeaderValue::from_str(&config.api.frontend_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(
                error = %e,
                origin = %config.api.frontend_origin,
                "FRONTEND_ORIGIN is not a valid header value, cross-origin requests disabled"
            );
            cors
        }
    }
}
