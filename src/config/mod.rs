//! Configuration loading and types for signal-pages.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files (`load`)

mod load;
mod types;

// Re-export all types for convenient access
pub use types::{
    ChartConfig, CorrelationStrategy, FieldDefaults, SelectorConfig, SignalsConfig, Variant,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}
