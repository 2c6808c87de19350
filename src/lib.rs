pub mod api;
pub mod cli;
pub mod config;
pub mod conversion;
pub mod data;
pub mod error;
pub mod feeds;
pub mod formatters;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod validation;

pub use error::{Error, Result};

// Declare tests module only when testing
#[cfg(test)]
pub mod tests;
