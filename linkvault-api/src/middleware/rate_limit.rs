/// Login rate limiting
///
/// Fixed-window limiter on `POST /auth/login`, keyed by client IP and stored
/// in Redis so every API instance shares the same counters.
///
/// # Algorithm
///
/// One Lua script increments the window counter, starts the window expiry on
/// the first hit, and returns the count and remaining TTL:
///
/// ```lua
/// local count = redis.call('INCR', KEYS[1])
/// if count == 1 then
///     redis.call('EXPIRE', KEYS[1], ARGV[1])
/// end
/// return {count, redis.call('TTL', KEYS[1])}
/// ```
///
/// # Storage
///
/// Keys: `ratelimit:login:{client_ip}`, expiring with the window.
///
/// # Failure Mode
///
/// If Redis is unreachable the attempt is allowed and the failure is logged.
/// Login stays available while Redis is down.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;
use std::net::SocketAddr;

/// Length of one rate limiting window
pub const WINDOW_SECONDS: u64 = 60;

const KEY_PREFIX: &str = "ratelimit:login";

const FIXED_WINDOW_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return {count, redis.call('TTL', KEYS[1])}
"#;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

/// Redis-backed login attempt counter
#[derive(Clone)]
pub struct LoginRateLimiter {
    redis: ConnectionManager,
    limit: u32,
}

impl LoginRateLimiter {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection fails
    pub async fn connect(redis_url: &str, limit: u32) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        tracing::info!(limit, window_seconds = WINDOW_SECONDS, "Login rate limiting enabled");
        Ok(Self { redis, limit })
    }

    /// Counts one attempt from `client` and decides whether it may proceed
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let key = format!("{}:{}", KEY_PREFIX, client);
        let mut conn = self.redis.clone();

        let result: Result<(u64, i64), redis::RedisError> = redis::Script::new(FIXED_WINDOW_SCRIPT)
            .key(&key)
            .arg(WINDOW_SECONDS)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok((count, ttl)) => decide(count, ttl, self.limit),
            Err(e) => {
                tracing::error!(error = %e, "Rate limit check failed, allowing request");
                RateLimitDecision::Allowed { remaining: self.limit }
            }
        }
    }
}

fn decide(count: u64, ttl: i64, limit: u32) -> RateLimitDecision {
    if count <= u64::from(limit) {
        RateLimitDecision::Allowed {
            remaining: limit - count as u32,
        }
    } else {
        // A negative TTL means the key lost its expiry; the next INCR restarts it.
        let retry_after = if ttl > 0 { ttl as u64 } else { WINDOW_SECONDS };
        RateLimitDecision::Limited { retry_after }
    }
}

/// Client address used as the rate limit key
///
/// Takes the first hop of `X-Forwarded-For`, then the socket peer address,
/// then `unknown`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects login attempts over the per-client limit with 429
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return Ok(next.run(request).await);
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer);

    match limiter.check(&client).await {
        RateLimitDecision::Allowed { .. } => Ok(next.run(request).await),
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, retry_after, "Login rate limit exceeded");
            Err(ApiError::RateLimitExceeded {
                retry_after,
                message: format!(
                    "Too many login attempts. Try again in {} seconds",
                    retry_after
                ),
            })
        }
    }
}
