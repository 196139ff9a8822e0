pub mod collector;
pub mod parser;

pub use collector::ScrapeCollector;
pub use parser::{ParsedPage, ResultPageParser};
