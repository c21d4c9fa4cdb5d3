//! HTTP handlers for bookhub-service.

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod metrics;
pub mod reviews;

pub use auth::*;
pub use authors::*;
pub use books::*;
pub use categories::*;
pub use metrics::*;
pub use reviews::*;
