use thiserror::Error;
use crate::actor_framework::FrameworkError;

/// Errors that can occur during review operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReviewError {
    #[error("Please rate at least one of taste or quality")]
    NoRating,
    #[error("Review validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ReviewError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::Rejected(reason) => ReviewError::ValidationError(reason),
            other => ReviewError::ActorCommunicationError(other.to_string()),
        }
    }
}
