pub mod collector;
pub mod mapper;
pub mod models;

pub use collector::ApiCollector;
