use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::{Identity, Role};
use crate::config::JwtConfig;

/// Longest session a token may be issued for (30 days).
pub const MAX_TOKEN_EXPIRY_MINUTES: i64 = 43_200;

/// Signs and verifies session tokens with a process-wide HMAC secret.
///
/// The key material is taken from configuration once at construction and is
/// never mutated afterwards.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry_minutes: i64,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account id)
    pub sub: String,
    /// Role at the time of sign-in
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// The identity these claims vouch for, if the subject is well formed.
    pub fn identity(&self) -> Option<Identity> {
        let subject_id = self.sub.parse::<i64>().ok()?;
        Some(Identity::new(subject_id, self.role))
    }
}

/// Token returned to the client after a successful sign-in.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }
        if config.token_expiry_minutes <= 0 {
            return Err(anyhow::anyhow!("JWT token expiry must be positive"));
        }
        if config.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
            return Err(anyhow::anyhow!(
                "JWT token expiry must not exceed {} minutes",
                MAX_TOKEN_EXPIRY_MINUTES
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        tracing::info!(
            expiry_minutes = config.token_expiry_minutes,
            "JWT service initialized with HS256 key"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_expiry_minutes: config.token_expiry_minutes,
        })
    }

    /// Issue a session token for `identity`, valid from now.
    pub fn issue(&self, identity: &Identity) -> Result<TokenResponse, anyhow::Error> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a session token as if it had been minted at `issued_at`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenResponse, anyhow::Error> {
        let exp = Duration::try_minutes(self.token_expiry_minutes)
            .and_then(|window| issued_at.checked_add_signed(window))
            .ok_or_else(|| anyhow::anyhow!("Session token expiry is out of range"))?;

        let claims = SessionClaims {
            sub: identity.subject_id.to_string(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;

        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry_seconds(),
        })
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }

    pub fn token_expiry_seconds(&self) -> i64 {
        self.token_expiry_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new(secret.to_string()),
            token_expiry_minutes: 60,
        })
        .expect("Failed to create JWT service")
    }

    #[test]
    fn issued_token_verifies_with_embedded_identity() {
        let jwt = service("test-secret-key-that-is-long-enough");
        let identity = Identity::new(42, Role::Admin);

        let issued = jwt.issue(&identity).unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);

        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.identity(), Some(identity));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service("test-secret-key-that-is-long-enough");
        let issued = jwt
            .issue_at(&Identity::new(1, Role::User), Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(jwt.verify(&issued.token).is_err());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let issuer = service("first-secret-key-that-is-long-enough");
        let verifier = service("second-secret-key-that-is-long-enough");
        let issued = issuer.issue(&Identity::new(1, Role::User)).unwrap();

        assert!(verifier.verify(&issued.token).is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let jwt = service("test-secret-key-that-is-long-enough");
        let issued = jwt.issue(&Identity::new(1, Role::User)).unwrap();
        let forged = jwt.issue(&Identity::new(1, Role::Admin)).unwrap();

        // Graft the admin payload onto the user token's signature.
        let original: Vec<&str> = issued.token.split('.').collect();
        let upgraded: Vec<&str> = forged.token.split('.').collect();
        let tampered = format!("{}.{}.{}", original[0], upgraded[1], original[2]);

        assert!(jwt.verify(&tampered).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = service("test-secret-key-that-is-long-enough");
        assert!(jwt.verify("not-a-token").is_err());
        assert!(jwt.verify("").is_err());
    }

    #[test]
    fn oversized_expiry_is_refused() {
        let result = JwtService::new(&JwtConfig {
            secret: Secret::new("test-secret-key-that-is-long-enough".to_string()),
            token_expiry_minutes: 1_000_000_000_000,
        });
        assert!(result.is_err());
    }

    #[test]
    fn longest_allowed_expiry_still_issues() {
        let jwt = JwtService::new(&JwtConfig {
            secret: Secret::new("test-secret-key-that-is-long-enough".to_string()),
            token_expiry_minutes: MAX_TOKEN_EXPIRY_MINUTES,
        })
        .unwrap();

        let issued = jwt.issue(&Identity::new(1, Role::User)).unwrap();
        assert_eq!(issued.expires_in, MAX_TOKEN_EXPIRY_MINUTES * 60);
    }

    #[test]
    fn issuing_past_the_calendar_limit_is_an_error() {
        let jwt = service("test-secret-key-that-is-long-enough");
        let result = jwt.issue_at(&Identity::new(1, Role::User), DateTime::<Utc>::MAX_UTC);
        assert!(result.is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let result = JwtService::new(&JwtConfig {
            secret: Secret::new(String::new()),
            token_expiry_minutes: 60,
        });
        assert!(result.is_err());
    }

    #[test]
    fn non_numeric_subject_has_no_identity() {
        let claims = SessionClaims {
            sub: "alice".to_string(),
            role: Role::User,
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.identity(), None);
    }
}
