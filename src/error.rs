use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Where unauthenticated requests for owner-only actions are sent.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Username or email already exists")]
    Conflict,

    /// Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    Authentication,

    /// Missing recipe and recipe owned by someone else look identical.
    #[error("Recipe not found")]
    NotFoundOrForbidden,

    #[error("Login required")]
    Unauthenticated,

    #[error("Internal server error")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Authentication => StatusCode::UNAUTHORIZED,
            AppError::NotFoundOrForbidden => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            AppError::Validation { field, message } => (
                status,
                Json(json!({ "error": message, "field": field })),
            )
                .into_response(),
            AppError::Storage(e) => {
                error!(error = ?e, "storage error");
                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
            _ => (status, Json(json!({ "error": self.to_string() }))).into_response(),
        }
    }
}
