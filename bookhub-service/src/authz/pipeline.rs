use super::authenticator::TokenAuthenticator;
use super::error::{AuthzError, AuthzOutcome};
use super::identity::{Identity, Role};
use super::ownership::OwnershipAuthorizer;
use super::role::RoleAuthorizer;
use crate::services::metrics::AUTHZ_DECISIONS_TOTAL;

/// What a route demands of its caller, fixed when the router is assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub required_role: Option<Role>,
    pub ownership_gated: bool,
}

impl RoutePolicy {
    /// Any caller with a valid token.
    pub const fn authenticated() -> Self {
        Self {
            required_role: None,
            ownership_gated: false,
        }
    }

    /// Callers holding exactly `role`.
    pub const fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ownership_gated: false,
        }
    }

    /// The owner of the addressed resource, or an admin.
    pub const fn owner() -> Self {
        Self {
            required_role: None,
            ownership_gated: true,
        }
    }
}

/// Request facts the pipeline decides on. Built once by the transport layer
/// and never mutated.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub authorization: Option<String>,
    pub resource_id: Option<i64>,
}

impl RequestContext {
    pub fn new(authorization: Option<String>, resource_id: Option<i64>) -> Self {
        Self {
            authorization,
            resource_id,
        }
    }
}

/// A request context after authentication succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedContext {
    pub identity: Identity,
    pub resource_id: Option<i64>,
}

impl AsRef<Identity> for AuthenticatedContext {
    fn as_ref(&self) -> &Identity {
        &self.identity
    }
}

/// Ordered authorization stages: token, then role, then ownership.
#[derive(Clone)]
pub struct AuthzPipeline {
    authenticator: TokenAuthenticator,
    ownership: OwnershipAuthorizer,
}

impl AuthzPipeline {
    pub fn new(authenticator: TokenAuthenticator, ownership: OwnershipAuthorizer) -> Self {
        Self {
            authenticator,
            ownership,
        }
    }

    /// Run every stage `policy` declares, stopping at the first refusal.
    pub async fn evaluate(
        &self,
        request: RequestContext,
        policy: &RoutePolicy,
    ) -> Result<AuthenticatedContext, AuthzError> {
        let result = self.run_stages(request, policy).await;
        record_decision(&result, policy);
        result
    }

    async fn run_stages(
        &self,
        request: RequestContext,
        policy: &RoutePolicy,
    ) -> Result<AuthenticatedContext, AuthzError> {
        let ctx = self.authenticate(request)?;
        let ctx = authorize_role(ctx, policy.required_role)?;
        if policy.ownership_gated {
            self.authorize_ownership(ctx).await
        } else {
            Ok(ctx)
        }
    }

    fn authenticate(&self, request: RequestContext) -> Result<AuthenticatedContext, AuthzError> {
        let identity = self
            .authenticator
            .authenticate(request.authorization.as_deref())?;
        Ok(AuthenticatedContext {
            identity,
            resource_id: request.resource_id,
        })
    }

    async fn authorize_ownership(
        &self,
        ctx: AuthenticatedContext,
    ) -> Result<AuthenticatedContext, AuthzError> {
        // A path id that is absent or not an integer cannot name a resource.
        let resource_id = ctx.resource_id.ok_or(AuthzError::ResourceNotFound {
            resource: self.ownership.resource(),
            resource_id: None,
        })?;
        self.ownership.authorize(&ctx.identity, resource_id).await?;
        Ok(ctx)
    }
}

fn authorize_role(
    ctx: AuthenticatedContext,
    required: Option<Role>,
) -> Result<AuthenticatedContext, AuthzError> {
    if let Some(role) = required {
        RoleAuthorizer::new(role).authorize(&ctx.identity)?;
    }
    Ok(ctx)
}

fn record_decision(result: &Result<AuthenticatedContext, AuthzError>, policy: &RoutePolicy) {
    let outcome = AuthzOutcome::from(result);

    match result {
        Ok(ctx) => tracing::debug!(
            subject_id = ctx.identity.subject_id,
            role = %ctx.identity.role,
            "Authorization granted"
        ),
        Err(AuthzError::InternalFault(e)) => tracing::error!(
            error = ?e,
            outcome = outcome.label(),
            "Authorization aborted by a storage fault"
        ),
        Err(e) => tracing::warn!(
            reason = %e,
            outcome = outcome.label(),
            required_role = ?policy.required_role,
            ownership_gated = policy.ownership_gated,
            "Authorization denied"
        ),
    }

    if let Some(counter) = AUTHZ_DECISIONS_TOTAL.get() {
        counter.with_label_values(&[outcome.label()]).inc();
    }
}
