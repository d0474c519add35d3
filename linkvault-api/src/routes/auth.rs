/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Create an account
/// - `POST /auth/login` - Exchange credentials for an access token and a refresh cookie
/// - `POST /auth/refresh` - Rotate the refresh cookie and get a new access token
/// - `POST /auth/logout` - Revoke the refresh cookie
/// - `GET /auth/me` - Profile of the bearer token's user
///
/// The refresh token never appears in a response body. It is set, replaced
/// and cleared only through the cookie described in [`crate::cookie`].

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use linkvault_shared::auth::middleware::AuthContext;
use linkvault_shared::clock::Clock;
use linkvault_shared::models::user::UserProfile;
use linkvault_shared::session::{FieldError, LoginInput, RegisterInput, SessionError};
use serde::Serialize;

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Refresh response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Register a new user
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// { "name": "Alice", "email": "alice@example.com", "password": "Passw0rd!" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "id", "name", "email" }`
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let Json(input) = payload.map_err(malformed_body)?;

    let profile = state.sessions.register(input, &state.request_token()).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Login with email and password
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "alice@example.com", "password": "Passw0rd!" }
/// ```
///
/// # Response
///
/// `200 OK` with `{ "accessToken", "user" }` and a `Set-Cookie` header
/// carrying the refresh token.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password, indistinguishably
/// - `429 Too Many Requests`: Login rate limit exceeded
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload.map_err(malformed_body)?;

    let outcome = state.sessions.login(input, &state.request_token()).await?;
    let cookie = state.refresh_cookie.set(&outcome.refresh_token, state.clock.now());

    let body = LoginResponse {
        access_token: outcome.access_token.token,
        user: outcome.user,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Rotate the refresh cookie
///
/// # Response
///
/// `200 OK` with `{ "accessToken" }` and a replacement `Set-Cookie`.
///
/// # Errors
///
/// - `401 Unauthorized`: Cookie missing, unknown, revoked, expired, or
///   already rotated by a concurrent request
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let presented = state.refresh_cookie.extract(&headers).ok_or_else(|| {
        tracing::debug!("Refresh rejected: no refresh cookie");
        ApiError::from(SessionError::Unauthorized)
    })?;

    let outcome = state
        .sessions
        .refresh(&presented, &state.request_token())
        .await?;
    let cookie = state.refresh_cookie.set(&outcome.refresh_token, state.clock.now());

    let body = RefreshResponse {
        access_token: outcome.access_token.token,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Revoke the refresh cookie
///
/// Always answers `204 No Content` and clears the cookie, whether or not a
/// live token was presented.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(presented) = state.refresh_cookie.extract(&headers) {
        if let Err(e) = state
            .sessions
            .logout(&presented, &state.request_token())
            .await
        {
            tracing::warn!(error = %e, code = e.code(), "Logout did not complete");
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.refresh_cookie.clear())],
    )
        .into_response()
}

/// Current user's profile
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid bearer token, or the user no
///   longer exists
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<UserProfile>> {
    let profile = state
        .sessions
        .profile(auth.user_id, &state.request_token())
        .await?;

    Ok(Json(profile))
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected malformed request body");
    ApiError::Validation(vec![FieldError {
        field: "body".to_string(),
        message: rejection.body_text(),
    }])
}
