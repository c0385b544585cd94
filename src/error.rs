use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::database::StoreError;
use crate::models::ValidationErrors;
use crate::service::RouteError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid JSON")]
    InvalidJson(String),
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Invalid lat/lng")]
    InvalidCoordinate,
    #[error("Location not found")]
    NotFound,
    #[error("{0}")]
    StoreUnavailable(&'static str, #[source] StoreError),
    #[error("Route computation timed out")]
    Timeout,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_)
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidCoordinate => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(..) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// 把存储层错误映射为接口错误，`message` 为返回给客户端的描述
    pub fn from_store(message: &'static str, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::NotFound,
            e => AppError::StoreUnavailable(message, e),
        }
    }
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::InvalidCoordinate { .. } => AppError::InvalidCoordinate,
            RouteError::StoreUnavailable(e) => AppError::StoreUnavailable("Could not fetch route", e),
            RouteError::DeadlineExceeded => AppError::Timeout,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            AppError::InvalidJson(details) => Some(details.clone()),
            AppError::Validation(errors) => Some(errors.to_string()),
            _ => None,
        };

        match &self {
            AppError::StoreUnavailable(_, source) => {
                tracing::error!("{}: {}", self, source)
            }
            _ => tracing::warn!("Request rejected: {}", self),
        }

        let body = Json(ErrorResponse {
            message: self.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
