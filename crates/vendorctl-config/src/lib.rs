//! Provider configuration for vendorctl.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. built-in defaults
//! 2. legacy `REPLICATED_API_ORIGIN` / `REPLICATED_API_TOKEN` variables
//! 3. a TOML file (`vendorctl.toml` unless another path is given)
//! 4. `VENDORCTL__*` environment variables, e.g. `VENDORCTL__LOGGING__LEVEL=debug`
//!
//! The merged result is validated before it is handed out.

pub mod loader;
pub mod provider;

pub use loader::{ConfigLoader, load_config};
pub use provider::{DEFAULT_ENDPOINT, LoggingConfig, ProviderConfig};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Load error: {0}")]
    Load(String),

    #[error(
        "Missing API Token Configuration: While configuring the provider, the API token was not \
         found in the REPLICATED_API_TOKEN environment variable or provider configuration block \
         api_token attribute."
    )]
    MissingApiToken,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load(err.to_string())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
