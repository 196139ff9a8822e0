/// Shared infrastructure concerns
///
/// Infrastructure implementations that are shared across modules.
#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "postgres")]
pub use database::{Database, DbPool};
