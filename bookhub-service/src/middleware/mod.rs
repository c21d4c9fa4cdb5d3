pub mod auth;
pub mod metrics;

pub use auth::{authorize, CurrentIdentity, RouteGate};
pub use metrics::metrics_middleware;
