//! Tracker error types with HTTP status code mapping.
//!
//! [`TrackerError`] is the central error type for the HTTP surface. Each
//! variant maps to a status code and is rendered as an HTML error page
//! carrying the error message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::broker::BrokerError;
use crate::views;

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request             |
/// | 2000–2999 | Not Found       | 404 Not Found               |
/// | 3000–3999 | Server          | 500 / 503                   |
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Region identifier is non-numeric or outside `1..=4`.
    #[error("invalid region {0:?}: expected an integer between 1 and 4")]
    InvalidRegion(String),

    /// Malformed request other than a bad region.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No route matched the request path.
    #[error("Error 404: Page Not Found '{0}'")]
    RouteNotFound(String),

    /// The embedded broker rejected an operation.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRegion(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::Broker(BrokerError::InvalidTopic(_)) => 1003,
            Self::RouteNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Broker(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRegion(_)
            | Self::InvalidRequest(_)
            | Self::Broker(BrokerError::InvalidTopic(_)) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }
        (status, views::error_page(&self.to_string())).into_response()
    }
}
