/// Authentication primitives
///
/// # Modules
///
/// - [`config`]: Token lifetimes, issuer/audience and cookie settings
/// - [`password`]: Argon2id password hashing behind the [`password::PasswordHasher`] trait
/// - [`token_hash`]: SHA-256 digests for refresh token storage
/// - [`jwt`]: Access token issuance
/// - [`refresh_token`]: Opaque refresh token generation
/// - [`gateway`]: Access token verification
/// - [`middleware`]: Axum bearer authentication layer
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Access Tokens**: HS256 JWTs, 15 minutes by default, verified without a database lookup
/// - **Refresh Tokens**: 512 random bits, stored only as SHA-256 digests, single use

pub mod config;
pub mod gateway;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_token;
pub mod token_hash;
