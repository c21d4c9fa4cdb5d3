use std::sync::Arc;

use crate::{
    authz::{Identity, Role},
    models::{Account, NewAccount},
    services::{store::AccountStore, JwtService, ServiceError, TokenResponse},
    utils::{
        hash_password, verify_against_dummy, verify_password, warm_dummy_hash, Password,
        PasswordHashString,
    },
};

/// Credential verifier: checks a password and mints a session token.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    jwt: JwtService,
    allow_admin_signup: bool,
}

impl AuthService {
    /// Also precomputes the dummy hash used for unknown-account sign-ins.
    pub fn new(accounts: Arc<dyn AccountStore>, jwt: JwtService, allow_admin_signup: bool) -> Self {
        if !warm_dummy_hash() {
            tracing::error!("Could not precompute the sign-in dummy hash");
        }
        Self {
            accounts,
            jwt,
            allow_admin_signup,
        }
    }

    /// Exchange an email or username plus password for a session token.
    ///
    /// Unknown account, wrong password, unreadable stored role and lookup
    /// faults all come back as the same `InvalidCredentials`.
    pub async fn sign_in(
        &self,
        identifier: &str,
        password: &Password,
    ) -> Result<TokenResponse, ServiceError> {
        let account = match self.accounts.find_account_by_identifier(identifier).await {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(error = ?e, "Account lookup failed during sign-in");
                None
            }
        };

        let Some(account) = account else {
            verify_against_dummy(password);
            tracing::warn!("Sign-in rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        let stored = PasswordHashString::new(account.password_hash.clone());
        if verify_password(password, &stored).is_err() {
            tracing::warn!(account_id = account.id, "Sign-in rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        let role = account.role().map_err(|e| {
            tracing::error!(account_id = account.id, error = %e, "Stored role is not recognized");
            ServiceError::InvalidCredentials
        })?;

        let token = self.jwt.issue(&Identity::new(account.id, role))?;
        tracing::info!(account_id = account.id, role = %role, "Session token issued");
        Ok(token)
    }

    /// Register a new account. A requested `admin` role is downgraded to
    /// `user` unless admin self-registration is enabled.
    pub async fn sign_up(
        &self,
        username: String,
        email: String,
        password: &Password,
        requested_role: Option<Role>,
    ) -> Result<Account, ServiceError> {
        let role = match requested_role {
            Some(Role::Admin) if self.allow_admin_signup => Role::Admin,
            Some(Role::Admin) => {
                tracing::warn!("Admin role requested at sign-up while disabled; granting user");
                Role::User
            }
            _ => Role::User,
        };

        let password_hash = hash_password(password)
            .map_err(|e| ServiceError::Internal(e.context("Password hashing error")))?;

        let account = self
            .accounts
            .insert_account(&NewAccount {
                username,
                email,
                password_hash: password_hash.into_string(),
                role,
            })
            .await?;

        tracing::info!(account_id = account.id, role = %role, "Account registered");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::store::MemoryStore;
    use secrecy::Secret;

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new("auth-service-test-secret-0123456789".to_string()),
            token_expiry_minutes: 60,
        })
        .unwrap()
    }

    fn service(allow_admin_signup: bool) -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthService::new(store.clone(), jwt(), allow_admin_signup), store)
    }

    #[tokio::test]
    async fn signed_up_account_can_sign_in_by_email_or_username() {
        let (auth, _) = service(false);
        let password = Password::new("secret123");
        let account = auth
            .sign_up("reader".into(), "reader@example.com".into(), &password, None)
            .await
            .unwrap();

        for identifier in ["reader@example.com", "reader"] {
            let token = auth.sign_in(identifier, &password).await.unwrap();
            let claims = jwt().verify(&token.token).unwrap();
            assert_eq!(claims.identity(), Some(Identity::new(account.id, Role::User)));
            assert_eq!(token.token_type, "Bearer");
            assert_eq!(token.expires_in, 3600);
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_account_are_indistinguishable() {
        let (auth, _) = service(false);
        auth.sign_up(
            "reader".into(),
            "reader@example.com".into(),
            &Password::new("secret123"),
            None,
        )
        .await
        .unwrap();

        let wrong = auth
            .sign_in("reader@example.com", &Password::new("nope"))
            .await
            .unwrap_err();
        let unknown = auth
            .sign_in("ghost@example.com", &Password::new("secret123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, ServiceError::InvalidCredentials));
        assert!(matches!(unknown, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn store_fault_during_sign_in_is_an_invalid_credential() {
        let (auth, store) = service(false);
        store.set_failing(true);
        let err = auth
            .sign_in("reader@example.com", &Password::new("secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn admin_role_needs_explicit_opt_in() {
        let (closed, _) = service(false);
        let account = closed
            .sign_up(
                "a".into(),
                "a@example.com".into(),
                &Password::new("secret123"),
                Some(Role::Admin),
            )
            .await
            .unwrap();
        assert_eq!(account.role().unwrap(), Role::User);

        let (open, _) = service(true);
        let account = open
            .sign_up(
                "b".into(),
                "b@example.com".into(),
                &Password::new("secret123"),
                Some(Role::Admin),
            )
            .await
            .unwrap();
        assert_eq!(account.role().unwrap(), Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_accounts_are_rejected() {
        let (auth, _) = service(false);
        let password = Password::new("secret123");
        auth.sign_up("reader".into(), "reader@example.com".into(), &password, None)
            .await
            .unwrap();

        let err = auth
            .sign_up("reader".into(), "other@example.com".into(), &password, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountAlreadyExists));
    }

    #[test]
    fn construction_warms_the_dummy_hash() {
        let _ = service(false);
        assert!(crate::utils::password::dummy_hash_ready());
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let (auth, _) = service(false);
        let account = auth
            .sign_up(
                "reader".into(),
                "reader@example.com".into(),
                &Password::new("secret123"),
                None,
            )
            .await
            .unwrap();
        assert_ne!(account.password_hash, "secret123");
        assert!(account.password_hash.starts_with("$argon2"));
    }
}
