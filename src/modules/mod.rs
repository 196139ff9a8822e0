pub mod catalog;
pub mod jobs;
