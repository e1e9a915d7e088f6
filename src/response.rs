use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::StoreError;
use crate::services::ai_gateway::GatewayError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::FORBIDDEN, "QUOTA_EXCEEDED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    /// The distinguished setup error: the backing table does not exist, the
    /// operator has to run the schema. Clients render a dedicated setup
    /// screen off this code.
    pub fn table_missing() -> Self {
        Self::with_code(
            StatusCode::SERVICE_UNAVAILABLE,
            "TABLE_MISSING",
            "Database tables are missing. Run the setup schema and reload.",
        )
    }

    fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TableMissing => AppError::table_missing(),
            StoreError::PermissionDenied => Self::with_code(
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "The store rejected this operation.",
            ),
            StoreError::NotFound => AppError::not_found("Record not found."),
            StoreError::Unknown(e) => {
                tracing::error!(error = %e, "store error");
                AppError::internal("Internal server error.")
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SafetyBlocked => Self::with_code(
                StatusCode::UNPROCESSABLE_ENTITY,
                "SAFETY_BLOCKED",
                "The image was blocked by safety filters.",
            ),
            GatewayError::EmptyResponse => Self::with_code(
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
                "The AI returned an empty response. Try again.",
            ),
            GatewayError::NotConfigured(_) => {
                AppError::service_unavailable("AI analysis is not configured on this server.")
            }
            other => {
                tracing::warn!(error = %other, "gateway call failed");
                Self::with_code(
                    StatusCode::BAD_GATEWAY,
                    "GATEWAY_ERROR",
                    "Could not reach the AI service. Try again.",
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
    }
}
