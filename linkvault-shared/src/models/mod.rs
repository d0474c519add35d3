/// Database models for LinkVault
///
/// # Models
///
/// - `user`: User accounts and their public profile view
/// - `refresh_token`: Hashed refresh tokens with revocation state

pub mod refresh_token;
pub mod user;
