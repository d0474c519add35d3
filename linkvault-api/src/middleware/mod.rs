/// Middleware modules for the API server
///
/// - `security`: Security response headers
/// - `rate_limit`: Redis-backed login rate limiting
///
/// Bearer token verification lives in `linkvault_shared::auth::middleware`.

pub mod rate_limit;
pub mod security;
