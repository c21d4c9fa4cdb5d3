use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            // Never says which half of the credential was wrong.
            ServiceError::InvalidCredentials => {
                AppError::BadRequest(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("Username or email already registered"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::InvalidReference(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::ValidationError(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}
