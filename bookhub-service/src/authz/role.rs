use super::error::AuthzError;
use super::identity::{Identity, Role};

/// Admits callers holding exactly one role. There is no hierarchy: an
/// `admin`-only route rejects `user` and a `user`-only route rejects `admin`.
#[derive(Debug, Clone, Copy)]
pub struct RoleAuthorizer {
    required: Role,
}

impl RoleAuthorizer {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    pub fn authorize(&self, identity: &Identity) -> Result<(), AuthzError> {
        if identity.role == self.required {
            Ok(())
        } else {
            Err(AuthzError::RoleMismatch {
                required: self.required,
                actual: identity.role,
            })
        }
    }
}
