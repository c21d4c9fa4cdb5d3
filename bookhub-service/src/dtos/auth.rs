use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::authz::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "reader42")]
    pub username: String,

    #[validate(email(message = "Valid email is required"))]
    #[schema(example = "reader@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,

    /// Only honored when admin self-registration is enabled.
    #[schema(example = "user")]
    pub role: Option<Role>,
}

/// `identifier` may be an email or a username; `email` is accepted as an
/// alias for older clients.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[serde(alias = "email")]
    #[validate(length(min = 1, message = "Email or username is required"))]
    #[schema(example = "reader@example.com")]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}
