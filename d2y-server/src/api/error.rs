//! Error responses.
//!
//! Every failure leaves the server as an [`ErrorBody`] carrying a stable
//! [`ErrorCode`]. Storage details are logged, never returned.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use d2y_core::lifecycle::OrderError;
use d2y_sdk::objects::{ErrorBody, ErrorCode};

/// Errors that can occur in API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or unknown bearer credential")]
    Unauthorized,
    /// The request could not be parsed (body, query or path).
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Order(#[from] OrderError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for an error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::InvalidInput | ErrorCode::InvalidRefundAmount => StatusCode::BAD_REQUEST,
        ErrorCode::SlotFull | ErrorCode::InvalidTransition | ErrorCode::Conflict => {
            StatusCode::CONFLICT
        }
        ErrorCode::StorageTimeout => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Unauthorized => ErrorBody::new(ErrorCode::Unauthorized, self.to_string()),
            ApiError::BadRequest(message) => ErrorBody::new(ErrorCode::InvalidInput, message),
            ApiError::Order(OrderError::InvalidTransition { from, to }) => ErrorBody {
                error: ErrorCode::InvalidTransition,
                message: self.to_string(),
                from: Some((*from).into()),
                to: Some((*to).into()),
            },
            ApiError::Order(err @ OrderError::Storage(_)) => {
                ErrorBody::new(err.code(), "internal server error")
            }
            ApiError::Order(err) => ErrorBody::new(err.code(), err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Order(OrderError::Storage(e)) => {
                tracing::error!(error = %e, "API storage error");
            }
            ApiError::Order(OrderError::StorageTimeout) => {
                tracing::warn!("API storage timeout");
            }
            _ => {}
        }
        let body = self.body();
        (status_for(body.error), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2y_core::entities::OrderStatus;
    use d2y_core::lifecycle::Resource;
    use d2y_sdk::objects::OrderStatus as SdkOrderStatus;

    #[test]
    fn test_transition_error_carries_states() {
        let err = ApiError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Placed,
            to: OrderStatus::Packing,
        });
        let body = err.body();
        assert_eq!(body.error, ErrorCode::InvalidTransition);
        assert_eq!(body.from, Some(SdkOrderStatus::Placed));
        assert_eq!(body.to, Some(SdkOrderStatus::Packing));
        assert_eq!(status_for(body.error), StatusCode::CONFLICT);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrderError::NotFound(Resource::Slot), StatusCode::NOT_FOUND),
            (OrderError::Forbidden, StatusCode::FORBIDDEN),
            (OrderError::SlotFull, StatusCode::CONFLICT),
            (OrderError::InvalidRefundAmount, StatusCode::BAD_REQUEST),
            (OrderError::StorageTimeout, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(err.code()), status);
        }
        assert_eq!(
            status_for(ApiError::Unauthorized.body().error),
            StatusCode::UNAUTHORIZED
        );
    }
}
