use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::ActionState;
use crate::error::AppError;
use crate::forms::{parse_uuid, FieldErrors};
use crate::mailer::MailError;

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError(AppError::Validation(errors))
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError(AppError::Mail(err))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Mail(MailError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Mail(MailError::Address(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Migrate(_) | AppError::Mail(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self.0 {
            AppError::Validation(errors) => {
                ActionState::invalid("Missing or invalid fields.", errors)
            }
            AppError::InvalidId => ActionState::failure("Invalid ID."),
            AppError::NotFound(what) => ActionState::failure(format!("{what} not found.")),
            AppError::Mail(MailError::NotConfigured) => {
                ActionState::failure("Email delivery is not configured.")
            }
            AppError::Mail(MailError::Address(err)) => {
                ActionState::invalid("Missing or invalid fields.", FieldErrors::single("receiver", err.to_string()))
            }
            AppError::Mail(err) => {
                tracing::error!("mail error: {}", err);
                ActionState::failure("Failed to send email.")
            }
            err @ (AppError::Database(_) | AppError::Migrate(_)) => {
                tracing::error!("database error: {}", err);
                ActionState::failure("Database error. Please try again.")
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Parses a path id, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_uuid(raw).ok_or(ApiError(AppError::InvalidId))
}
