//! Collaborators behind the HTTP layer: credential verification, token
//! signing, persistence and metrics.

mod auth;
mod database;
pub mod error;
mod jwt;
pub mod metrics;
pub mod store;

pub use auth::AuthService;
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{JwtService, SessionClaims, TokenResponse, MAX_TOKEN_EXPIRY_MINUTES};
pub use store::{AccountStore, MemoryStore, OwnershipRecord, OwnershipStore};
