//! Error types for catalog API operations.

use cineframe_api_models::{ErrorBody, FieldErrors};
use thiserror::Error;

/// Primary error type for requests against the catalog API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected the request payload (400, 409, 422).
    #[error("request validation failed")]
    Validation {
        /// Collapsed display message.
        message: String,
        /// Field-level messages, when the backend supplied them.
        fields: FieldErrors,
    },
    /// Missing, expired, or insufficient credentials (401, 403).
    #[error("request unauthorized")]
    Unauthorized {
        /// HTTP status reported by the backend.
        status: u16,
        /// Backend message when present.
        message: Option<String>,
    },
    /// The requested resource does not exist (404).
    #[error("resource not found")]
    NotFound {
        /// Backend message when present.
        message: Option<String>,
    },
    /// Any other non-success status.
    #[error("server returned status {status}")]
    Server {
        /// HTTP status reported by the backend.
        status: u16,
        /// Backend message when present.
        message: Option<String>,
    },
    /// The request never produced a response.
    #[error("network request failed")]
    Network {
        /// Transport-level failure detail.
        detail: String,
    },
    /// The response body could not be decoded.
    #[error("malformed response body")]
    Decode {
        /// Decoder failure detail.
        detail: String,
    },
    /// Login succeeded but the backend issued no token.
    #[error("login response carried no token")]
    MissingToken,
}

/// Convenience alias for API results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Classify a non-success response from its status and raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
        let message = parsed.display_message();
        match status {
            400 | 409 | 422 => Self::Validation {
                message: message.unwrap_or_else(|| format!("request rejected (status {status})")),
                fields: parsed.errors.unwrap_or_default(),
            },
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound { message },
            _ => Self::Server { status, message },
        }
    }

    /// User-facing text: the backend's own message when it sent one, else `fallback`.
    #[must_use]
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Unauthorized { message, .. }
            | Self::NotFound { message }
            | Self::Server { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            Self::Network { .. } | Self::Decode { .. } => fallback.to_string(),
            Self::MissingToken => "Login succeeded but no token was received".to_string(),
        }
    }

    /// Whether the page layer should send the user back to the login screen.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub(crate) fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            detail: err.to_string(),
        }
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            detail: err.to_string(),
        }
    }
}

/// Failed list load as shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ListError {
    /// Display text, e.g. `Failed to fetch movies`.
    pub message: String,
    /// Underlying request failure.
    #[source]
    pub source: ApiError,
}

impl ListError {
    /// Wrap `source` with the fixed message for collection `label`.
    #[must_use]
    pub fn fetch_failed(label: &str, source: ApiError) -> Self {
        Self {
            message: format!("Failed to fetch {label}"),
            source,
        }
    }
}

/// Caller-side form validation failures, raised before any request is sent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FormError {
    /// A required field was blank.
    #[error("{field} is required")]
    Required {
        /// Field label.
        field: &'static str,
    },
    /// A numeric field did not parse.
    #[error("{field} must be a number")]
    NotANumber {
        /// Field label.
        field: &'static str,
    },
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// Password shorter than the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_status_collapses_field_messages() {
        let err = ApiError::from_response(
            422,
            r#"{"message":"invalid","errors":{"email":["The email field is required."],"password":["Too short."]}}"#,
        );
        assert_eq!(
            err.display_message("Login failed"),
            "The email field is required.. Too short."
        );
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn auth_statuses_keep_backend_message() {
        let err = ApiError::from_response(401, r#"{"message":"Unauthenticated."}"#);
        assert_eq!(
            err,
            ApiError::Unauthorized {
                status: 401,
                message: Some("Unauthenticated.".into())
            }
        );
        assert!(err.is_auth_failure());
        assert!(ApiError::from_response(403, "").is_auth_failure());
    }

    #[test]
    fn unparseable_bodies_fall_back_to_static_text() {
        let err = ApiError::from_response(500, "<html>oops</html>");
        assert_eq!(
            err,
            ApiError::Server {
                status: 500,
                message: None
            }
        );
        assert_eq!(err.display_message("Failed to fetch movies"), "Failed to fetch movies");
        assert_eq!(
            ApiError::network("connection refused").display_message("Failed to fetch genres"),
            "Failed to fetch genres"
        );
    }

    #[test]
    fn not_found_is_distinct() {
        assert_eq!(
            ApiError::from_response(404, r#"{"message":"Movie not found"}"#),
            ApiError::NotFound {
                message: Some("Movie not found".into())
            }
        );
    }

    #[test]
    fn list_error_names_the_collection() {
        let err = ListError::fetch_failed("genres", ApiError::network("offline"));
        assert_eq!(err.to_string(), "Failed to fetch genres");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_without_body_still_has_a_message() {
        let err = ApiError::from_response(400, "");
        assert_eq!(err.display_message("fallback"), "request rejected (status 400)");
    }
}
