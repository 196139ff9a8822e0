//! Shared integration test utilities
#![allow(dead_code)]

#[cfg(feature = "postgres")]
pub mod db;
pub mod factories;
pub mod helpers;
pub mod marketplace;
