use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::{ErrorBody, ErrorCode};
use crate::service::ServiceError;

/// Failure of a route handler, rendered without exposing internal details.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Unauthorized { source: &'static str },
    Internal { source: &'static str, detail: String },
}

impl ApiError {
    pub fn internal(source: &'static str, detail: impl ToString) -> Self {
        ApiError::Internal {
            source,
            detail: detail.to_string(),
        }
    }

    /// Map a service failure raised while serving `source`. A missing id is
    /// reported like an absent record.
    pub fn from_service(source: &'static str, e: ServiceError) -> Self {
        match e {
            ServiceError::MissingId => ApiError::NotFound,
            ServiceError::Store(e) => ApiError::internal(source, e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Unauthorized { source } => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::new(ErrorCode::Exception, "Unauthorized", source)),
            )
                .into_response(),
            ApiError::Internal { source, detail } => {
                tracing::error!("Exception occurred in {source}: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::internal(source)),
                )
                    .into_response()
            }
        }
    }
}

/// Response for a handler that panicked.
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::internal("panic", detail).into_response()
}
