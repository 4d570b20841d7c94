//! Use-case layer: free functions generic over the repository and boundary
//! traits.

use thiserror::Error;

use crate::boundaries::BoundaryError;
use crate::domain::types::TypeConstraintError;
use crate::repository::errors::RepositoryError;

pub mod admin;
pub mod intake;
pub mod orchestrator;
pub mod uploads;

/// Error taxonomy of the intake flow.
///
/// The variants carry their recovery semantics: validation errors are fixed
/// by user input and never reach a boundary, payment errors leave the
/// submission `Saved` and retryable, upload errors never block completion,
/// and finalization errors keep the record `Paid` until a retry succeeds.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("payment error: {0}")]
    Payment(String),

    #[error("upload error: {0}")]
    Upload(String),

    #[error("finalization error: {0}")]
    Finalization(String),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ValidationError(e) => ServiceError::Validation(e),
            other => ServiceError::Persistence(other.to_string()),
        }
    }
}

impl From<BoundaryError> for ServiceError {
    fn from(err: BoundaryError) -> Self {
        match err {
            BoundaryError::Payment(e) => ServiceError::Payment(e),
            BoundaryError::Storage(e) => ServiceError::Upload(e),
            BoundaryError::Notification(e) => ServiceError::Finalization(e),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
