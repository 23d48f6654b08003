//! Engine configuration: where things live on a media host

use std::time::Duration;

use serde::Deserialize;
use streamprov_exec::Secret;

use crate::error::ReconcileError;

/// Mode applied to the tenant's config directory tree
pub const CONFIG_DIR_MODE: u32 = 0o777;
/// Mode applied to the tenant's storage directory tree
pub const STORAGE_DIR_MODE: u32 = 0o755;

/// Layout and defaults of the managed media server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parent of every application config directory
    pub config_root: String,
    /// Parent of every tenant storage (FTP home) directory
    pub storage_root: String,
    /// systemd unit of the media server
    pub service_unit: String,
    /// Account owning the config tree
    pub service_user: String,
    /// Wait between restart and the is-active poll
    pub restart_grace_secs: u64,
    /// Entries under `config_root` that are never tenants
    pub system_entries: Vec<String>,
    pub default_bandwidth_kbps: u32,
    /// Stream secret for tenants that carry none
    pub default_password: Secret,
    /// Prints the server version on its first line
    pub version_command: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_root: "/usr/local/WowzaStreamingEngine-4.8.0/conf".to_string(),
            storage_root: "/home/streaming".to_string(),
            service_unit: "WowzaStreamingEngine".to_string(),
            service_user: "wowza".to_string(),
            restart_grace_secs: 5,
            system_entries: vec!["VHost.xml".to_string(), "Server.xml".to_string()],
            default_bandwidth_kbps: 4500,
            default_password: Secret::new("senha_padrao"),
            version_command:
                "/usr/local/WowzaStreamingEngine-4.8.0/bin/startup.sh -version 2>/dev/null | head -1"
                    .to_string(),
        }
    }
}

impl EngineConfig {
    /// Config directory of one tenant
    #[must_use]
    pub fn tenant_dir(&self, name: &str) -> String {
        format!("{}/{name}", self.config_root.trim_end_matches('/'))
    }

    /// Storage directory of one tenant
    #[must_use]
    pub fn storage_dir(&self, name: &str) -> String {
        format!("{}/{name}", self.storage_root.trim_end_matches('/'))
    }

    #[must_use]
    pub fn restart_grace(&self) -> Duration {
        Duration::from_secs(self.restart_grace_secs)
    }

    /// Reject defaults that could not be provisioned safely
    ///
    /// `default_password` is both a stream secret and, without an explicit
    /// account password, the OS account password.
    ///
    /// # Errors
    /// `Config` if `default_password` is empty, contains whitespace or `:`
    pub fn validate(&self) -> Result<(), ReconcileError> {
        let raw = self.default_password.expose();
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ReconcileError::Config(
                "default_password must be one token without ':'".to_string(),
            ));
        }
        Ok(())
    }

    /// `user:group` owning the config tree
    #[must_use]
    pub fn service_owner(&self) -> String {
        format!("{0}:{0}", self.service_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_paths() {
        let config = EngineConfig::default();
        assert_eq!(
            config.tenant_dir("acct1"),
            "/usr/local/WowzaStreamingEngine-4.8.0/conf/acct1"
        );
        assert_eq!(config.storage_dir("acct1"), "/home/streaming/acct1");
        assert_eq!(config.restart_grace(), Duration::from_secs(5));
        assert_eq!(config.service_owner(), "wowza:wowza");
    }

    #[test]
    fn test_validate_default_password() {
        assert!(EngineConfig::default().validate().is_ok());

        for bad in ["", "pw\nroot:owned", "a:b", "two words"] {
            let config = EngineConfig {
                default_password: Secret::new(bad),
                ..EngineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ReconcileError::Config(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_partial_override() {
        let config: EngineConfig = toml::from_str(
            r#"
            config_root = "/opt/media/conf/"
            restart_grace_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.tenant_dir("u1"), "/opt/media/conf/u1");
        assert_eq!(config.service_unit, "WowzaStreamingEngine");
        assert!(config.restart_grace().is_zero());
    }
}
