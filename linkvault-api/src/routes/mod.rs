/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login, refresh, logout and profile endpoints

pub mod auth;
pub mod health;
