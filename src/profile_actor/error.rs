use thiserror::Error;
use crate::actor_framework::FrameworkError;

/// Errors that can occur during profile operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),
    #[error("Profile validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ProfileError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => ProfileError::NotFound(id),
            FrameworkError::Rejected(reason) => ProfileError::ValidationError(reason),
            other => ProfileError::ActorCommunicationError(other.to_string()),
        }
    }
}
