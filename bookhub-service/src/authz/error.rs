use service_core::error::AppError;
use thiserror::Error;

use super::identity::{Identity, Role};

/// Why an authorization stage refused a request.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("No bearer credential presented")]
    MissingCredential,

    #[error("Credential is malformed, unsigned or expired")]
    InvalidCredential,

    #[error("Route requires role {required}, caller has {actual}")]
    RoleMismatch { required: Role, actual: Role },

    #[error("Subject {subject_id} does not own {resource} {resource_id}")]
    OwnershipDenied {
        resource: &'static str,
        subject_id: i64,
        resource_id: i64,
    },

    #[error("{resource} {resource_id:?} not found")]
    ResourceNotFound {
        resource: &'static str,
        resource_id: Option<i64>,
    },

    #[error("Authorization lookup failed: {0}")]
    InternalFault(#[source] anyhow::Error),
}

/// Final result of running a route's authorization stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzOutcome {
    Proceed(Identity),
    Unauthenticated,
    Forbidden,
    NotFound,
    InternalFault,
}

impl AuthzOutcome {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AuthzOutcome::Proceed(_) => "proceed",
            AuthzOutcome::Unauthenticated => "unauthenticated",
            AuthzOutcome::Forbidden => "forbidden",
            AuthzOutcome::NotFound => "not_found",
            AuthzOutcome::InternalFault => "internal_fault",
        }
    }
}

impl From<&AuthzError> for AuthzOutcome {
    fn from(err: &AuthzError) -> Self {
        match err {
            AuthzError::MissingCredential => AuthzOutcome::Unauthenticated,
            AuthzError::InvalidCredential
            | AuthzError::RoleMismatch { .. }
            | AuthzError::OwnershipDenied { .. } => AuthzOutcome::Forbidden,
            AuthzError::ResourceNotFound { .. } => AuthzOutcome::NotFound,
            AuthzError::InternalFault(_) => AuthzOutcome::InternalFault,
        }
    }
}

impl<T> From<&Result<T, AuthzError>> for AuthzOutcome
where
    T: AsRef<Identity>,
{
    fn from(result: &Result<T, AuthzError>) -> Self {
        match result {
            Ok(ctx) => AuthzOutcome::Proceed(*ctx.as_ref()),
            Err(err) => AuthzOutcome::from(err),
        }
    }
}

impl AsRef<Identity> for Identity {
    fn as_ref(&self) -> &Identity {
        self
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MissingCredential => {
                AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
            }
            AuthzError::InvalidCredential => {
                AppError::Forbidden(anyhow::anyhow!("Invalid or expired token"))
            }
            AuthzError::RoleMismatch { .. } => AppError::Forbidden(anyhow::anyhow!("Forbidden")),
            AuthzError::OwnershipDenied { .. } => AppError::Forbidden(anyhow::anyhow!(
                "You do not have permission to perform this action"
            )),
            AuthzError::ResourceNotFound { resource, .. } => {
                AppError::NotFound(anyhow::anyhow!("{} not found", resource))
            }
            AuthzError::InternalFault(e) => AppError::InternalError(e.context(
                "An error occurred while checking ownership",
            )),
        }
    }
}
