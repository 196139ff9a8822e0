pub mod memory;
#[cfg(feature = "postgres")]
pub mod models;
#[cfg(feature = "postgres")]
pub mod repository;

pub use memory::InMemoryJobRepository;
#[cfg(feature = "postgres")]
pub use repository::JobRepositoryImpl;
