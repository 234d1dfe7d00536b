use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use crate::views::redirect;

/// Request failures and how each one is answered.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No user in the session; sent to the login page.
    #[error("authentication required")]
    AuthenticationRequired { next: String },
    /// Logged in with the wrong role; sent home without a message.
    #[error("not allowed")]
    AuthorizationDenied,
    /// Form rejected; the form context is returned with its field errors.
    #[error("validation failed")]
    Validation {
        title: &'static str,
        errors: ValidationErrors,
    },
    /// Referenced row is absent; sent to a listing page.
    #[error("not found")]
    NotFound { redirect_to: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(redirect_to: impl Into<String>) -> Self {
        Self::NotFound {
            redirect_to: redirect_to.into(),
        }
    }

    pub fn validation(title: &'static str, errors: ValidationErrors) -> Self {
        Self::Validation { title, errors }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::AuthenticationRequired { next } => {
                redirect(&format!("/login?next={next}"))
            }
            AppError::AuthorizationDenied => redirect("/"),
            AppError::NotFound { redirect_to } => redirect(&redirect_to),
            AppError::Validation { title, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "title": title, "errors": errors })),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
