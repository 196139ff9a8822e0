// Shared Kernel
// Cross-cutting concerns used by every module

pub mod config; // Environment configuration
pub mod errors; // Shared error types
pub mod infrastructure; // Shared infrastructure (database)
pub mod utils; // Logging and validation

pub use config::{AppConfig, CollectionMode};
#[cfg(feature = "postgres")]
pub use infrastructure::Database;
