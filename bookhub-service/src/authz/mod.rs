//! Authorization core: token authentication, role checks and resource
//! ownership checks, composed into a per-route pipeline.

mod authenticator;
mod error;
mod identity;
mod ownership;
mod pipeline;
mod role;

pub use authenticator::TokenAuthenticator;
pub use error::{AuthzError, AuthzOutcome};
pub use identity::{Identity, Role};
pub use ownership::OwnershipAuthorizer;
pub use pipeline::{AuthenticatedContext, AuthzPipeline, RequestContext, RoutePolicy};
pub use role::RoleAuthorizer;
