//! Configuration loading from files.
//!
//! This module handles reading and parsing configuration files.

use std::path::{Path, PathBuf};

use config::{File, FileFormat};

use super::{ConfigError, SignalsConfig};

/// Config file name used when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "signals.yaml";

impl SignalsConfig {
    /// Load the config from the command line argument, defaulting to `signals.yaml`.
    ///
    /// A missing default config file is not an error: every setting has a
    /// default. An explicitly named file must exist.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let required = config_file.is_some();
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = absolute(config_file)?;

        Self::load_from_file(&config_file, required)
    }

    /// Load the config from a file path, resolving relative paths against its directory.
    pub(crate) fn load_from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::Validation(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let mut config: SignalsConfig = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(false))
            .build()?
            .try_deserialize()?;

        config.resolve_paths(&base_path_from_config(path));
        Ok(config)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_relative() {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CwdFailure)?
            .join(path))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
