//! Configuration loader
//!
//! Locates the configuration file from a directory, a base name and an
//! extension, then parses it according to the extension. Loading is a
//! one-shot operation: a caller that wants fresh values calls `load` again.

use super::Configuration;
use crate::PtmError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default configuration directory
pub const CONFIG_PATH: &str = "/etc/ptm";

/// Default configuration file name (without extension)
pub const CONFIG_NAME: &str = "config";

/// Default configuration file extension
pub const CONFIG_EXTENSION: &str = "yaml";

/// Configuration loader builder
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    name: String,
    extension: String,
    required: bool,
}

impl ConfigLoader {
    /// Create a new loader pointing at `/etc/ptm/config.yaml`
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(CONFIG_PATH),
            name: CONFIG_NAME.to_string(),
            extension: CONFIG_EXTENSION.to_string(),
            required: false,
        }
    }

    /// Use a custom directory
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Use a custom file name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use a custom extension (`yaml`, `yml` or `json`)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Fail instead of falling back to defaults when the file is missing
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Full path of the configuration file
    pub fn location(&self) -> PathBuf {
        self.path.join(format!("{}.{}", self.name, self.extension))
    }

    /// Read and parse the configuration file
    pub async fn load(&self) -> Result<Configuration, PtmError> {
        let location = self.location();

        if !location.exists() {
            if self.required {
                return Err(PtmError::Config(format!(
                    "configuration file {} does not exist",
                    location.display()
                )));
            }
            warn!(
                "Configuration file {} not found, using defaults",
                location.display()
            );
            let mut config = Configuration::default();
            config.apply_package_defaults();
            return Ok(config);
        }

        debug!("Reading configuration from {}", location.display());
        let content = fs::read_to_string(&location).await?;

        let config = match self.extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Configuration::from_yaml(&content)?,
            "json" => Configuration::from_json(&content)?,
            other => {
                return Err(PtmError::Config(format!(
                    "unsupported configuration format `{}`",
                    other
                )));
            }
        };

        info!("Loaded configuration from {}", location.display());
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
