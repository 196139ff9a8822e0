//! HTTP surface of the service
pub mod auth;
pub mod router;
pub mod state;

pub use auth::{AuthProvider, CallerIdentity, StaticTokenAuth};
pub use router::build_router;
pub use state::AppState;
