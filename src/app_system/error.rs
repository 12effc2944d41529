use thiserror::Error;

/// Errors raised while running the system as a whole.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Actor task failed: {0}")]
    ActorFailed(String),
}
