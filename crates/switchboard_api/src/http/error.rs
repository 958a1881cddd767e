use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::domain::DomainError;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP envelope for domain errors
#[derive(Debug)]
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self(error)
    }
}

/// Map a domain error onto its response status
fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::ValidationError(_)
        | DomainError::InvalidDeviceId(_)
        | DomainError::InvalidTimeFormat(_)
        | DomainError::InvalidDateFormat(_)
        | DomainError::InvalidEmail(_)
        | DomainError::InvalidPassword(_) => StatusCode::BAD_REQUEST,

        DomainError::DeviceNotFound(_)
        | DomainError::UserNotFound(_)
        | DomainError::ChannelNotFound(_) => StatusCode::NOT_FOUND,

        DomainError::InvalidCredentials
        | DomainError::InvalidToken(_)
        | DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

        DomainError::DeviceNotOwned(_, _) => StatusCode::FORBIDDEN,

        DomainError::DeviceAlreadyRegistered(_)
        | DomainError::DeviceNameTaken(_)
        | DomainError::ChannelNameTaken(_)
        | DomainError::ChannelActive(_)
        | DomainError::UserAlreadyExists => StatusCode::CONFLICT,

        DomainError::PasswordHashingError(_) | DomainError::RepositoryError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // internals go to the log, never to the caller
            error!(error = %self.0, "internal server error");
            "Internal Server Error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
