/// Session inputs and outcomes

use crate::auth::jwt::AccessToken;
use crate::auth::refresh_token::IssuedRefreshToken;
use crate::models::user::UserProfile;
use serde::Deserialize;
use std::fmt;
use validator::Validate;

/// Trims and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration request
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 200, message = "Name is required and must be at most 200 characters"))]
    pub name: String,

    #[validate(
        email(message = "Email must be a valid email address"),
        length(max = 320, message = "Email must be at most 320 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl RegisterInput {
    /// Trims the name and normalizes the email; the password is left as typed
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login request
#[derive(Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(
        email(message = "Email must be a valid email address"),
        length(max = 320, message = "Email must be at most 320 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl LoginInput {
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: AccessToken,

    /// Plaintext goes to the client once, via the refresh cookie
    pub refresh_token: IssuedRefreshToken,

    pub user: UserProfile,
}

/// Result of a successful refresh
///
/// The previously presented refresh token is dead once this is returned.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: AccessToken,
    pub refresh_token: IssuedRefreshToken,
}
