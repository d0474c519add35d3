/// Bearer authentication middleware for Axum
///
/// [`bearer_auth`] reads `Authorization: Bearer <token>`, asks the
/// [`AuthenticationGateway`] who the caller is and stores an [`AuthContext`] in
/// the request extensions. Handlers take `AuthContext` as an extractor.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use linkvault_shared::auth::gateway::AuthenticationGateway;
/// use linkvault_shared::auth::middleware::{bearer_auth, AuthContext};
///
/// async fn me(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// fn routes(gateway: Arc<AuthenticationGateway>) -> Router {
///     Router::new()
///         .route("/auth/me", get(me))
///         .layer(middleware::from_fn_with_state(gateway, bearer_auth))
/// }
/// ```

use crate::auth::gateway::AuthenticationGateway;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated caller, added to request extensions by [`bearer_auth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Caller's user id from the token subject
    pub user_id: Uuid,
}

/// Authentication failure
///
/// Every variant renders the same 401 body so callers cannot tell a missing
/// header from a forged or expired token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization` header
    MissingCredentials,

    /// Token failed verification
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": "Authentication required",
        }));

        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            body,
        )
            .into_response()
    }
}

/// Verifies the bearer token and attaches [`AuthContext`]
pub async fn bearer_auth(
    State(gateway): State<Arc<AuthenticationGateway>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let user_id = gateway
        .identify_header(header_value)
        .map_err(|_| AuthError::InvalidToken)?;

    req.extensions_mut().insert(AuthContext { user_id });

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}
