//! Carebook harness library
//!
//! Exposes modules for integration testing

pub mod cli;
pub mod config;
pub mod data;
pub mod scenarios;

// Re-export commonly used types for external use
pub use config::HarnessConfig;
pub use data::{DataProfile, SeedData};
