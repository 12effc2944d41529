use thiserror::Error;
use crate::actor_framework::FrameworkError;
use crate::domain::OrderCode;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order code already in use: {0}")]
    DuplicateCode(String),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please enter a delivery address")]
    MissingAddress,
    #[error("Invalid user: {0}")]
    InvalidUser(String),
    #[error("Cannot redeem {requested} points, at most {max} can be used on this order")]
    RedemptionExceedsLimit { requested: u64, max: u64 },
    #[error("Could not update points balance: {0}")]
    PointsUpdateFailed(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    pub fn not_found(code: &OrderCode) -> Self {
        OrderError::NotFound(code.to_string())
    }
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::Rejected(reason) => OrderError::ValidationError(reason),
            FrameworkError::Conflict(row_id) => OrderError::DuplicateCode(row_id),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
