use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use resq_core::{IncidentError, TransitionRejection, UnknownSeverity};

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by handlers.
///
/// Rendered as `{"error": {"code", "message", "status"}}`. `code` is stable
/// for clients to branch on; `message` is for humans.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<IncidentError> for AppError {
    fn from(err: IncidentError) -> Self {
        let (status, code) = match &err {
            IncidentError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "incident_not_found")
            }
            IncidentError::AlreadyExists(_) => {
                (StatusCode::CONFLICT, "incident_exists")
            }
            IncidentError::InvalidTransition { rejection, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                match rejection {
                    TransitionRejection::Backward { .. } => "backward_transition",
                    TransitionRejection::UnknownStatus(_) => "unknown_status",
                },
            ),
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<UnknownSeverity> for AppError {
    fn from(err: UnknownSeverity) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "unknown_severity", err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "invalid_form", err.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "request failed");
        Self::internal("internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_core::{IncidentId, IncidentStatus};

    #[test]
    fn incident_errors_map_to_status_and_code() {
        let id = IncidentId::from("I-1");

        let not_found = AppError::from(IncidentError::NotFound(id.clone()));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let backward = AppError::from(IncidentError::invalid_transition(
            &id,
            TransitionRejection::Backward {
                from: IncidentStatus::Dispatched,
                to: IncidentStatus::Preparing,
            },
        ));
        assert_eq!(backward.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(backward.code, "backward_transition");
    }
}
