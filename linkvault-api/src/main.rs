//! # LinkVault API Server
//!
//! Serves registration, login, refresh token rotation and logout over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/linkvault JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p linkvault-api
//! ```

use anyhow::Context;
use linkvault_api::{
    app::{build_router, AppState},
    config::Config,
    middleware::rate_limit::LoginRateLimiter,
};
use linkvault_shared::auth::password::Argon2PasswordHasher;
use linkvault_shared::clock::SystemClock;
use linkvault_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool},
};
use linkvault_shared::store::postgres::PgCredentialStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the log filter reads RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("LinkVault API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!(environment = ?config.environment, "Configuration loaded");

    let pool = create_pool(config.database.clone())
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let shutdown = CancellationToken::new();
    let bind_address = config.bind_address();

    let rate_limiter = match config.rate_limit.redis_url.as_deref() {
        Some(url) => Some(
            LoginRateLimiter::connect(url, config.rate_limit.login_attempts_per_minute)
                .await
                .context("failed to connect to Redis")?,
        ),
        None => {
            tracing::warn!("REDIS_URL is not set, login rate limiting disabled");
            None
        }
    };

    let mut state = AppState::new(
        config,
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::default()),
        Arc::new(SystemClock),
    )?
    .with_shutdown(shutdown.clone());
    if let Some(limiter) = rate_limiter {
        state = state.with_rate_limiter(limiter);
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "linkvault_api=debug,linkvault_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, cancelling in-flight requests");
    shutdown.cancel();
}
