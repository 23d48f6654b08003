//! Tenant model

use std::fmt;

use serde::Serialize;
use streamprov_exec::Secret;
use streamprov_inventory::{TenantRecord, ViewerCap};

use crate::config::EngineConfig;
use crate::error::ReconcileError;

const MAX_NAME_LEN: usize = 32;

/// Tenant name, doubling as OS login and remote directory name
///
/// Lowercase login-safe: `[a-z_][a-z0-9_-]*`, at most 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TenantName(String);

impl TenantName {
    /// Validate a name
    ///
    /// # Errors
    /// `InvalidTenant` if the name is empty, too long, or uses other characters
    pub fn parse(name: &str) -> Result<Self, ReconcileError> {
        let mut chars = name.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let tail_ok =
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if head_ok && tail_ok && name.len() <= MAX_NAME_LEN {
            Ok(Self(name.to_string()))
        } else {
            Err(ReconcileError::InvalidTenant(format!(
                "{name:?} is not a valid account name"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The credential file holds `<name> <secret>`, so the secret is one token
///
/// # Errors
/// `InvalidTenant` if the secret is empty or contains whitespace
pub fn check_secret(name: &TenantName, secret: &Secret) -> Result<(), ReconcileError> {
    let raw = secret.expose();
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return Err(ReconcileError::InvalidTenant(format!(
            "stream secret for {name} must be a single non-empty token"
        )));
    }
    Ok(())
}

/// The account password is fed to `chpasswd` as one `login:password` line
///
/// # Errors
/// `InvalidTenant` if the password is empty or contains a line break or `:`
pub fn check_account_password(name: &TenantName, password: &Secret) -> Result<(), ReconcileError> {
    let raw = password.expose();
    if raw.is_empty() || raw.contains(['\n', '\r', ':']) {
        return Err(ReconcileError::InvalidTenant(format!(
            "account password for {name} must be non-empty without line breaks or ':'"
        )));
    }
    Ok(())
}

/// Everything needed to provision one tenant
#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub name: TenantName,
    pub bandwidth_kbps: u32,
    pub viewer_cap: ViewerCap,
    /// Publish credential secret, one token
    pub stream_secret: Secret,
    /// OS account password, falls back to `stream_secret`
    pub account_password: Option<Secret>,
}

impl TenantConfig {
    /// Build a tenant with validated name and secret
    ///
    /// # Errors
    /// `InvalidTenant` for a bad name or a secret that is empty or contains
    /// whitespace
    pub fn new(
        name: &str,
        bandwidth_kbps: u32,
        viewer_cap: ViewerCap,
        stream_secret: Secret,
    ) -> Result<Self, ReconcileError> {
        let name = TenantName::parse(name)?;
        check_secret(&name, &stream_secret)?;

        Ok(Self {
            name,
            bandwidth_kbps,
            viewer_cap,
            stream_secret,
            account_password: None,
        })
    }

    /// Build from an inventory record, filling gaps from engine defaults
    ///
    /// # Errors
    /// See [`TenantConfig::new`]; also `InvalidTenant` when the password the
    /// OS account would get fails [`check_account_password`]
    pub fn from_record(record: TenantRecord, defaults: &EngineConfig) -> Result<Self, ReconcileError> {
        let tenant = Self::new(
            &record.name,
            record.bandwidth_kbps.unwrap_or(defaults.default_bandwidth_kbps),
            record.viewers,
            record
                .stream_secret
                .unwrap_or_else(|| defaults.default_password.clone()),
        )?;
        match record.account_password {
            Some(password) => tenant.with_account_password(password),
            None => {
                check_account_password(&tenant.name, tenant.account_secret())?;
                Ok(tenant)
            }
        }
    }

    /// Use a dedicated OS account password instead of the stream secret
    ///
    /// # Errors
    /// `InvalidTenant` if the password fails [`check_account_password`]
    pub fn with_account_password(mut self, password: Secret) -> Result<Self, ReconcileError> {
        check_account_password(&self.name, &password)?;
        self.account_password = Some(password);
        Ok(self)
    }

    /// Password set on the OS account
    #[must_use]
    pub fn account_secret(&self) -> &Secret {
        self.account_password.as_ref().unwrap_or(&self.stream_secret)
    }

    /// Copy with the given changes applied
    #[must_use]
    pub fn with_changes(&self, changes: &FieldChanges) -> Self {
        let mut tenant = self.clone();
        if let Some(bandwidth) = changes.bandwidth_kbps {
            tenant.bandwidth_kbps = bandwidth;
        }
        if let Some(cap) = changes.viewer_cap {
            tenant.viewer_cap = cap;
        }
        tenant
    }
}

/// Fields an update should touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldChanges {
    pub bandwidth_kbps: Option<u32>,
    pub viewer_cap: Option<ViewerCap>,
}

impl FieldChanges {
    /// Every tunable field of `tenant`
    #[must_use]
    pub fn all_of(tenant: &TenantConfig) -> Self {
        Self {
            bandwidth_kbps: Some(tenant.bandwidth_kbps),
            viewer_cap: Some(tenant.viewer_cap),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bandwidth_kbps.is_none() && self.viewer_cap.is_none()
    }
}

/// Serialization key: one writer per tenant per host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantKey {
    pub tenant: TenantName,
    pub host: String,
}

impl TenantKey {
    pub fn new(tenant: TenantName, host: impl Into<String>) -> Self {
        Self {
            tenant,
            host: host.into(),
        }
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tenant, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        for ok in ["acct1", "_svc", "a-b_c", "u"] {
            assert!(TenantName::parse(ok).is_ok(), "{ok}");
        }
        let long = "a".repeat(33);
        for bad in ["", "1abc", "Acct", "a b", "../x", "a;rm", "x$y", long.as_str()] {
            assert!(TenantName::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_secret_must_be_one_token() {
        let err = TenantConfig::new("acct1", 4500, ViewerCap::Unlimited, Secret::new("two words"))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidTenant(_)));
        assert!(TenantConfig::new("acct1", 4500, ViewerCap::Unlimited, Secret::new("")).is_err());
    }

    #[test]
    fn test_from_record_uses_defaults() {
        let record = TenantRecord {
            name: "acct2".to_string(),
            bandwidth_kbps: None,
            viewers: ViewerCap::Limited(10),
            stream_secret: None,
            account_password: None,
        };

        let tenant = TenantConfig::from_record(record, &EngineConfig::default()).unwrap();
        assert_eq!(tenant.bandwidth_kbps, 4500);
        assert_eq!(tenant.stream_secret.expose(), "senha_padrao");
        assert_eq!(tenant.account_secret().expose(), "senha_padrao");
    }

    #[test]
    fn test_account_password_cannot_add_chpasswd_lines() {
        let record = TenantRecord {
            name: "acct2".to_string(),
            bandwidth_kbps: None,
            viewers: ViewerCap::Unlimited,
            stream_secret: Some(Secret::new("pw")),
            account_password: Some(Secret::new("ftp\nroot:owned")),
        };
        let err = TenantConfig::from_record(record, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidTenant(_)));

        let tenant =
            TenantConfig::new("acct1", 4500, ViewerCap::Unlimited, Secret::new("pw")).unwrap();
        for bad in ["a:b", "a\rb", "a\nb", ""] {
            assert!(tenant.clone().with_account_password(Secret::new(bad)).is_err(), "{bad:?}");
        }
        let tenant = tenant.with_account_password(Secret::new("ftp-pw")).unwrap();
        assert_eq!(tenant.account_secret().expose(), "ftp-pw");
    }

    #[test]
    fn test_stream_secret_fallback_is_checked_as_account_password() {
        let record = TenantRecord {
            name: "acct3".to_string(),
            bandwidth_kbps: None,
            viewers: ViewerCap::Unlimited,
            stream_secret: Some(Secret::new("x:y")),
            account_password: None,
        };
        assert!(TenantConfig::from_record(record, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_with_changes() {
        let tenant =
            TenantConfig::new("acct1", 4500, ViewerCap::Unlimited, Secret::new("pw")).unwrap();
        let changed = tenant.with_changes(&FieldChanges {
            bandwidth_kbps: Some(2000),
            viewer_cap: None,
        });

        assert_eq!(changed.bandwidth_kbps, 2000);
        assert_eq!(changed.viewer_cap, ViewerCap::Unlimited);
        assert!(FieldChanges::default().is_empty());
        assert!(!FieldChanges::all_of(&tenant).is_empty());
    }
}
