//! Configuration for the console environments
//!
//! Named environments (base URL + API token) live in the platform config
//! directory as TOML. `PADRON_API_URL` / `PADRON_API_TOKEN` override the
//! file entirely, which is how CI and one-off runs are pointed at a
//! backend without touching the config file.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

const URL_VAR: &str = "PADRON_API_URL";
const TOKEN_VAR: &str = "PADRON_API_TOKEN";

/// One console backend the tool can talk to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
}

/// The on-disk configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, Environment>,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the config directory")?;
        Ok(dir.join("padron-cli").join("config.toml"))
    }

    /// Load the config file; a missing file is an empty config
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Pick the environment for this run
    ///
    /// Priority: environment variables, then the `--env` flag, then the
    /// configured current environment.
    pub fn select_environment(&self, name: Option<&str>) -> Result<Environment> {
        if let Ok(base_url) = std::env::var(URL_VAR) {
            log::debug!("Using environment from {}", URL_VAR);
            return Ok(Environment {
                base_url,
                api_token: std::env::var(TOKEN_VAR).unwrap_or_default(),
            });
        }

        let name = match name.or(self.current_environment.as_deref()) {
            Some(name) => name,
            None => bail!(
                "No environment selected. Add one to {} or set {}.",
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string()),
                URL_VAR
            ),
        };

        match self.environments.get(name) {
            Some(environment) => Ok(environment.clone()),
            None => {
                let mut known: Vec<&str> =
                    self.environments.keys().map(String::as_str).collect();
                known.sort_unstable();
                bail!(
                    "Unknown environment '{}' (known: {})",
                    name,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            }
        }
    }
}
