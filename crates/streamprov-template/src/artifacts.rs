//! Per-tenant config artifacts

use serde::{Deserialize, Serialize};

use crate::descriptor::render_descriptor;

/// Application descriptor file name
pub const DESCRIPTOR_FILE: &str = "Application.xml";
/// Publish credential file name
pub const CREDENTIAL_FILE: &str = "publish.password";
/// Playback alias map file name
pub const PLAY_ALIAS_FILE: &str = "aliasmap.play.txt";
/// Publish alias map file name
pub const STREAM_ALIAS_FILE: &str = "aliasmap.stream.txt";
/// Per-user FTP config, written into the storage directory
pub const FTP_USER_CONFIG_FILE: &str = ".vsftpd_user_conf";

/// Inputs for rendering one tenant's application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationParams {
    pub name: String,
    /// Address advertised to WebRTC clients
    pub host_address: String,
    pub bandwidth_kbps: u32,
    pub max_viewers: u32,
    pub publish_secret: String,
    pub storage_dir: String,
}

/// How an artifact reached the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStrategy {
    /// Encoded transfer, decoded on the host
    Primary,
    /// Literal quoted write
    Fallback,
}

/// A file to place in the tenant's config directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArtifact {
    pub relative_path: String,
    pub content: Vec<u8>,
    /// Strategy to try first
    pub strategy: TransferStrategy,
}

impl ConfigArtifact {
    fn new(relative_path: &str, content: impl Into<Vec<u8>>, strategy: TransferStrategy) -> Self {
        Self {
            relative_path: relative_path.to_string(),
            content: content.into(),
            strategy,
        }
    }
}

/// `<name> <secret>`, no trailing newline
#[must_use]
pub fn render_credential(name: &str, secret: &str) -> String {
    format!("{name} {secret}")
}

/// Alias map routing the tenant's own name to the incoming stream
#[must_use]
pub fn render_play_alias(name: &str) -> String {
    format!("{name}=${{Stream.Name}}")
}

/// Alias map accepting any published stream name
#[must_use]
pub fn render_stream_alias() -> String {
    "*=${Stream.Name}".to_string()
}

/// FTP account config confining the user to its storage directory
#[must_use]
pub fn render_ftp_user_config(storage_dir: &str) -> String {
    format!(
        "local_root={storage_dir}\n\
         write_enable=YES\n\
         anon_world_readable_only=NO\n\
         anon_upload_enable=YES\n\
         anon_mkdir_write_enable=YES\n\
         anon_other_write_enable=YES\n"
    )
}

/// Render the four config directory artifacts for one tenant
///
/// The descriptor goes encoded first; the small text files go literally.
#[must_use]
pub fn render_artifacts(params: &ApplicationParams) -> Vec<ConfigArtifact> {
    vec![
        ConfigArtifact::new(
            DESCRIPTOR_FILE,
            render_descriptor(params),
            TransferStrategy::Primary,
        ),
        ConfigArtifact::new(
            CREDENTIAL_FILE,
            render_credential(&params.name, &params.publish_secret),
            TransferStrategy::Fallback,
        ),
        ConfigArtifact::new(
            PLAY_ALIAS_FILE,
            render_play_alias(&params.name),
            TransferStrategy::Fallback,
        ),
        ConfigArtifact::new(
            STREAM_ALIAS_FILE,
            render_stream_alias(),
            TransferStrategy::Fallback,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ApplicationParams {
        ApplicationParams {
            name: "acct1".to_string(),
            host_address: "10.0.0.5".to_string(),
            bandwidth_kbps: 4500,
            max_viewers: 999_999,
            publish_secret: "s3cret".to_string(),
            storage_dir: "/home/streaming/acct1".to_string(),
        }
    }

    #[test]
    fn test_render_artifacts() {
        let artifacts = render_artifacts(&params());
        let names: Vec<&str> = artifacts.iter().map(|a| a.relative_path.as_str()).collect();

        assert_eq!(
            names,
            [DESCRIPTOR_FILE, CREDENTIAL_FILE, PLAY_ALIAS_FILE, STREAM_ALIAS_FILE]
        );
        assert_eq!(artifacts[0].strategy, TransferStrategy::Primary);
        assert_eq!(artifacts[1].content, b"acct1 s3cret");
        assert_eq!(artifacts[2].content, b"acct1=${Stream.Name}");
        assert_eq!(artifacts[3].content, b"*=${Stream.Name}");
    }

    #[test]
    fn test_ftp_user_config() {
        let conf = render_ftp_user_config("/home/streaming/acct1");
        assert!(conf.starts_with("local_root=/home/streaming/acct1\n"));
        assert!(conf.contains("anon_other_write_enable=YES\n"));
        assert_eq!(conf.lines().count(), 6);
    }
}
