/// Refresh token cookie
///
/// The refresh token plaintext travels only in an `HttpOnly` cookie scoped to
/// the auth routes. The cookie path must cover both `/auth/refresh` and
/// `/auth/logout`, otherwise the browser never sends it to logout.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use linkvault_shared::auth::config::JwtConfig;
use linkvault_shared::auth::refresh_token::{IssuedRefreshToken, RefreshTokenSecret};

/// SameSite policy for the refresh cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
        }
    }
}

/// Whether `name` is a cookie-name token (RFC 6265 section 4.1.1)
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

/// Whether `path` is an absolute path usable as a `Path` attribute
pub fn is_valid_path(path: &str) -> bool {
    path.starts_with('/') && path.bytes().all(|b| (0x20..0x7f).contains(&b) && b != b';')
}

/// Builds, clears and reads the refresh cookie
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl RefreshCookie {
    /// Production cookies are `Secure; SameSite=Strict`, development cookies
    /// are `SameSite=Lax` so they work over plain HTTP
    pub fn new(jwt: &JwtConfig, production: bool) -> Self {
        Self {
            name: jwt.refresh_cookie_name.clone(),
            path: jwt.refresh_cookie_path.clone(),
            secure: production,
            same_site: if production { SameSite::Strict } else { SameSite::Lax },
        }
    }

    /// `Set-Cookie` value carrying `token`, expiring with it
    pub fn set(&self, token: &IssuedRefreshToken, now: DateTime<Utc>) -> HeaderValue {
        let max_age = (token.expires_at - now).num_seconds().max(0);
        self.header(token.plaintext.expose(), max_age)
    }

    /// `Set-Cookie` value that deletes the cookie
    pub fn clear(&self) -> HeaderValue {
        self.header("", 0)
    }

    /// Refresh token presented in the request's `Cookie` header, if any
    pub fn extract(&self, headers: &HeaderMap) -> Option<RefreshTokenSecret> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == self.name && !value.is_empty()).then(|| RefreshTokenSecret::new(value))
            })
    }

    fn header(&self, value: &str, max_age: i64) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; HttpOnly; Path={}; Max-Age={}; SameSite={}",
            self.name,
            value,
            self.path,
            max_age,
            self.same_site.as_str()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }

        // Name and path are checked at startup and tokens are base64url.
        HeaderValue::from_str(&cookie).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Refresh cookie is not a valid header value");
            HeaderValue::from_static("")
        })
    }
}
