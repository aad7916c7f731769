use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Stock item 550e8400-e29b-41d4-a716-446655440000 not found")]
    pub message: String,
    /// Additional detail (e.g., which writes survived a partial dispatch failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// A dispatch write failed after earlier writes had already been
    /// persisted and at least one compensating delete also failed, so the
    /// record store is left inconsistent. `dangling` names the records an
    /// operator must reconcile by hand.
    #[error("Partial dispatch failure: {message}; dangling records: {}", .dangling.join(", "))]
    PartialWriteFailure {
        message: String,
        /// Writes that completed before the failure, in order.
        completed: Vec<String>,
        /// Completed writes that were successfully rolled back.
        compensated: Vec<String>,
        /// Completed writes whose rollback failed and which still exist.
        dangling: Vec<String>,
    },

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// The HTTP status code for this error. Single source of truth for the
    /// error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            Self::AuthError(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::PartialWriteFailure { .. }
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message suitable for HTTP responses. Internal errors return a
    /// generic message so implementation details never leak to callers;
    /// partial write failures deliberately stay verbose so the caller knows
    /// reconciliation is needed.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Extra detail for the response body, present only where the caller can
    /// act on it.
    fn response_details(&self) -> Option<String> {
        match self {
            Self::PartialWriteFailure {
                completed,
                compensated,
                dangling,
                ..
            } => Some(format!(
                "completed: [{}]; compensated: [{}]; dangling: [{}]",
                completed.join(", "),
                compensated.join(", "),
                dangling.join(", ")
            )),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.response_details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientStock("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = ServiceError::InternalError("connection string leaked".into());
        assert_eq!(err.response_message(), "Internal server error");

        let err = ServiceError::NotFound("Courier abc not found".into());
        assert_eq!(err.response_message(), "Not found: Courier abc not found");
    }

    #[test]
    fn partial_write_failure_names_surviving_records() {
        let err = ServiceError::PartialWriteFailure {
            message: "stock decrement failed".into(),
            completed: vec!["shipment".into(), "dispatch_record".into()],
            compensated: vec!["dispatch_record".into()],
            dangling: vec!["shipment".into()],
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.response_message().contains("shipment"));
        let details = err.response_details().expect("details expected");
        assert!(details.contains("dangling: [shipment]"));
    }

    #[tokio::test]
    async fn error_response_body_shape() {
        let response =
            ServiceError::InsufficientStock("requested 15 but only 10 available".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(payload.message.contains("requested 15"));
        assert!(payload.details.is_none());
    }
}
