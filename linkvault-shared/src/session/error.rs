/// Session operation outcomes
///
/// Every [`SessionService`](super::SessionService) operation returns
/// `Result<T, SessionError>`. The variants are deliberately coarse: store and
/// crypto failures are logged where they happen and surface only as
/// [`SessionError::Internal`], and every credential or token problem is the
/// same [`SessionError::Unauthorized`].

use serde::Serialize;
use validator::ValidationErrors;

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error type for session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Malformed input
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Bad credentials, or a missing, unknown, revoked or expired token
    #[error("Invalid credentials")]
    Unauthorized,

    /// Uniqueness violation, such as a duplicate email
    #[error("{0}")]
    Conflict(String),

    /// Referenced resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// The caller gave up before the operation completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Unexpected failure; details are in the server log only
    #[error("An internal error occurred")]
    Internal,
}

impl SessionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "validation_error",
            SessionError::Unauthorized => "unauthorized",
            SessionError::Conflict(_) => "conflict",
            SessionError::NotFound(_) => "not_found",
            SessionError::Cancelled => "cancelled",
            SessionError::Internal => "internal_error",
        }
    }
}

impl From<ValidationErrors> for SessionError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));

        SessionError::Validation(fields)
    }
}
