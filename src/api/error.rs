use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::errors::{DriverError, DriverFailure, FleetError, ValidationError};

#[derive(Debug)]
pub enum ApiError {
    Fleet(FleetError),
    BadRequest(String),
    NotFound(String),
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        ApiError::Fleet(err)
    }
}

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        ApiError::Fleet(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Fleet(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fleet(FleetError::DriverError(e)) => match e.reason {
                DriverFailure::Timeout => StatusCode::GATEWAY_TIMEOUT,
                DriverFailure::Unreachable
                | DriverFailure::Auth
                | DriverFailure::MalformedResponse => StatusCode::BAD_GATEWAY,
            },
            ApiError::Fleet(FleetError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::Fleet(FleetError::ConfigError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> String {
        match self {
            ApiError::Fleet(FleetError::DriverError(e)) => format!("driver.{}", e.reason),
            ApiError::Fleet(FleetError::ValidationError(_)) => "validation".to_string(),
            ApiError::Fleet(FleetError::ConfigError(_)) => "config".to_string(),
            ApiError::BadRequest(_) => "bad_request".to_string(),
            ApiError::NotFound(_) => "not_found".to_string(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Fleet(e) => e.to_string(),
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.message(), "Request failed");
        }
        (
            status,
            Json(json!({
                "error": self.kind(),
                "message": self.message(),
            })),
        )
            .into_response()
    }
}
