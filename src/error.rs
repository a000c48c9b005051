use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::TransitionError;
use crate::models::ErrorResponse;
use crate::store::StoreError;

/// Errors surfaced by the matching services
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type MatchResult<T> = Result<T, MatchError>;

impl MatchError {
    pub fn profile_not_found(id: impl std::fmt::Display) -> Self {
        MatchError::NotFound(format!("Profile {} not found", id))
    }

    fn kind(&self) -> &'static str {
        match self {
            MatchError::NotFound(_) => "not_found",
            MatchError::InvalidInput(_) => "invalid_input",
            MatchError::Unauthorized(_) => "unauthorized",
            MatchError::Store(_) => "internal_error",
        }
    }
}

impl From<TransitionError> for MatchError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotRecipient | TransitionError::NotParticipant => {
                MatchError::Unauthorized(err.to_string())
            }
            TransitionError::Illegal { .. } => MatchError::InvalidInput(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::InvalidInput(errors.to_string())
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MatchError::Unauthorized(_) => StatusCode::FORBIDDEN,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Store details stay in the logs for release builds
        let message = match self {
            MatchError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                if cfg!(debug_assertions) {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(MatchError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MatchError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(MatchError::Unauthorized("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            MatchError::Store(StoreError::Corrupt("bad row".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transition_errors_map_to_taxonomy() {
        assert!(matches!(
            MatchError::from(TransitionError::NotRecipient),
            MatchError::Unauthorized(_)
        ));
        assert!(matches!(
            MatchError::from(TransitionError::Illegal {
                from: MatchStatus::Rejected,
                to: MatchStatus::Matched,
            }),
            MatchError::InvalidInput(_)
        ));
    }
}
