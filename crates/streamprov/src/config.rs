//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use streamprov_core::EngineConfig;
use streamprov_exec::{ExecutionMode, Timeouts};
use streamprov_inventory::{HostRecord, TenantRecord};

/// Top-level configuration for streamprov
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    /// Media server layout and tenant defaults
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    /// Media hosts
    #[serde(default)]
    pub host: Vec<HostRecord>,
    /// Tenants the platform considers valid
    #[serde(default)]
    pub tenant: Vec<TenantRecord>,
}

/// Process-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            mode: ExecutionMode::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SSH bounds
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_exec_timeout")]
    pub exec_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            exec_timeout_secs: default_exec_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_exec_timeout() -> u64 {
    60
}

impl SshConfig {
    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            exec: Duration::from_secs(self.exec_timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("cannot read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from an explicit path, or search the default locations
    ///
    /// Also returns the file the config came from; `None` means built-in
    /// defaults. Runs before logging is set up, so the caller reports it.
    ///
    /// # Errors
    /// Returns error if a located file cannot be read or parsed
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        // Check environment variable
        if let Ok(path) = std::env::var("STREAMPROV_CONFIG") {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, Some(path)));
        }

        let mut paths = vec![
            PathBuf::from("streamprov.toml"),
            PathBuf::from("/etc/streamprov/streamprov.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("streamprov/streamprov.toml"));
        }

        for path in paths {
            if path.exists() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }

        Ok((Config::default(), None))
    }
}
