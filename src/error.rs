use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::geo::CoordinateError;
use crate::store::StoreError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Inactive(String),
    #[error("missing or invalid credential")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::InvalidArgument(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Inactive(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::PermissionDenied(_) => error_codes::PERMISSION_DENIED,
            AppError::InvalidArgument(_) => error_codes::VALIDATION_ERROR,
            AppError::Inactive(_) => error_codes::VENDOR_INACTIVE,
            AppError::Unauthorized => error_codes::AUTH_FAILED,
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 内部错误只记录日志，不把细节返回给客户端
        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), error_to_api_response::<()>(self.code(), msg)).into_response()
    }
}
