//! HTTP mapping of core errors.
//!
//! Maps to HTTP status codes:
//! - Validation, UnauthorizedSender: 422 Unprocessable Entity
//! - Conflict: 409 Conflict
//! - NotFound: 404 Not Found
//! - Store: 500 Internal Server Error
//!
//! Store failures are logged server-side and reported to clients with a
//! generic message.

use crate::metrics;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parlor_core::ChatError;
use parlor_protocol::api::ErrorBody;

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChatError::Validation(_) | ChatError::UnauthorizedSender(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ChatError::Conflict(_) => StatusCode::CONFLICT,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        metrics::record_error(kind);

        let message = match &self.0 {
            ChatError::Store(err) => {
                tracing::error!(error = %err, "Store operation failed");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody::new(kind.to_uppercase(), message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_store::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ChatError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ChatError::UnauthorizedSender("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ChatError::Conflict("x".into()), StatusCode::CONFLICT),
            (ChatError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ChatError::Store(StoreError::Unavailable("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_store_error_response_status() {
        let response =
            ApiError(ChatError::Store(StoreError::Unavailable("secret detail".into()))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
