use super::error::AuthzError;
use super::identity::Identity;
use crate::services::JwtService;

const BEARER_SCHEME: &str = "bearer";

/// Establishes caller identity from a bearer token, without touching storage.
#[derive(Clone)]
pub struct TokenAuthenticator {
    jwt: JwtService,
}

impl TokenAuthenticator {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }

    /// Verify the raw `Authorization` header value.
    ///
    /// No header, a non-bearer scheme or an empty token is a missing
    /// credential; anything that fails verification is an invalid one.
    pub fn authenticate(&self, raw_header: Option<&str>) -> Result<Identity, AuthzError> {
        let token = bearer_token(raw_header).ok_or(AuthzError::MissingCredential)?;

        let claims = self.jwt.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            AuthzError::InvalidCredential
        })?;

        claims.identity().ok_or_else(|| {
            tracing::debug!(sub = %claims.sub, "Session token subject is not an account id");
            AuthzError::InvalidCredential
        })
    }
}

fn bearer_token(raw_header: Option<&str>) -> Option<&str> {
    let (scheme, token) = raw_header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Role;
    use crate::config::JwtConfig;
    use chrono::{Duration, Utc};
    use secrecy::Secret;

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new("authenticator-test-secret-0123456789".to_string()),
            token_expiry_minutes: 60,
        })
        .unwrap()
    }

    #[test]
    fn valid_token_yields_embedded_identity() {
        let jwt = jwt();
        let token = jwt.issue(&Identity::new(7, Role::User)).unwrap().token;
        let auth = TokenAuthenticator::new(jwt);

        let identity = auth
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(identity, Identity::new(7, Role::User));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let jwt = jwt();
        let token = jwt.issue(&Identity::new(7, Role::User)).unwrap().token;
        let auth = TokenAuthenticator::new(jwt);

        assert!(auth.authenticate(Some(&format!("bearer {}", token))).is_ok());
    }

    #[test]
    fn absent_header_is_missing_credential() {
        let auth = TokenAuthenticator::new(jwt());
        assert!(matches!(
            auth.authenticate(None),
            Err(AuthzError::MissingCredential)
        ));
    }

    #[test]
    fn empty_or_foreign_scheme_is_missing_credential() {
        let auth = TokenAuthenticator::new(jwt());
        for raw in ["", "Bearer", "Bearer    ", "Basic dXNlcjpwYXNz", "token"] {
            assert!(
                matches!(auth.authenticate(Some(raw)), Err(AuthzError::MissingCredential)),
                "expected missing credential for {:?}",
                raw
            );
        }
    }

    #[test]
    fn malformed_token_is_invalid_credential() {
        let auth = TokenAuthenticator::new(jwt());
        assert!(matches!(
            auth.authenticate(Some("Bearer invalid_token")),
            Err(AuthzError::InvalidCredential)
        ));
    }

    #[test]
    fn expired_token_is_invalid_credential() {
        let jwt = jwt();
        let token = jwt
            .issue_at(&Identity::new(7, Role::Admin), Utc::now() - Duration::minutes(61))
            .unwrap()
            .token;
        let auth = TokenAuthenticator::new(jwt);

        assert!(matches!(
            auth.authenticate(Some(&format!("Bearer {}", token))),
            Err(AuthzError::InvalidCredential)
        ));
    }
}
