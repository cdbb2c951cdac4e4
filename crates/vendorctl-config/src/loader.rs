use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};

use crate::provider::{DEFAULT_ENDPOINT, ProviderConfig};
use crate::Result;

pub const DEFAULT_CONFIG_FILE: &str = "vendorctl.toml";
pub const ENV_PREFIX: &str = "VENDORCTL";
pub const LEGACY_ORIGIN_VAR: &str = "REPLICATED_API_ORIGIN";
pub const LEGACY_TOKEN_VAR: &str = "REPLICATED_API_TOKEN";

/// Builds a [`ProviderConfig`] from the layered sources.
///
/// By default the process environment is read. Tests inject a fixed map with
/// [`ConfigLoader::with_env`] so they never touch global state.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `path` instead of `vendorctl.toml`. An explicit path must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replaces the process environment with `vars`.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        let value = match &self.env {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    pub fn load(&self) -> Result<ProviderConfig> {
        let mut builder = Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("request_timeout", "30s")?
            .set_default("logging.level", "info")?;

        // Legacy variables sit just above the defaults.
        if let Some(origin) = self.var(LEGACY_ORIGIN_VAR) {
            builder = builder.set_default("endpoint", origin)?;
        }
        if let Some(token) = self.var(LEGACY_TOKEN_VAR) {
            builder = builder.set_default("api_token", token)?;
        }

        builder = match &self.path {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };

        // Environment variable overrides, e.g., VENDORCTL__API_TOKEN=...
        let mut environment = Environment::with_prefix(ENV_PREFIX).separator("__");
        if let Some(vars) = &self.env {
            environment = environment.source(Some(vars.clone().into_iter().collect()));
        }
        builder = builder.add_source(environment);

        let merged: ProviderConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;

        tracing::debug!(
            endpoint = %merged.endpoint,
            request_timeout = ?merged.request_timeout,
            "provider configuration loaded"
        );
        Ok(merged)
    }
}

/// Loads configuration from the process environment and an optional file.
pub fn load_config(path: Option<&str>) -> Result<ProviderConfig> {
    let loader = ConfigLoader::new();
    match path {
        Some(p) => loader.with_file(p).load(),
        None => loader.load(),
    }
}
