//! Inventory record types

use std::fmt;
use std::path::PathBuf;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use streamprov_exec::{Credential, Secret};

use crate::error::InventoryError;

fn default_ssh_port() -> u16 {
    22
}

fn default_user() -> String {
    "root".to_string()
}

fn default_active() -> bool {
    true
}

/// A media host as stored in the inventory
#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    /// IP or DNS name, also the lookup key
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<Secret>,
    /// Private key file
    #[serde(default)]
    pub ssh_key: Option<PathBuf>,
    /// Environment variable holding a base64 private key
    #[serde(default)]
    pub ssh_key_env: Option<String>,
    /// Inactive hosts never resolve
    #[serde(default = "default_active")]
    pub active: bool,
}

impl HostRecord {
    /// Create an active record authenticated by password
    pub fn with_password(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ssh_port: default_ssh_port(),
            user: default_user(),
            password: Some(Secret::new(password)),
            ssh_key: None,
            ssh_key_env: None,
            active: true,
        }
    }

    /// Mark the host inactive
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Credential to log in with; key file wins over key env over password
    ///
    /// # Errors
    /// Returns `MissingCredential` when none is configured
    pub fn credential(&self) -> Result<Credential, InventoryError> {
        if let Some(path) = &self.ssh_key {
            Ok(Credential::KeyPath(path.clone()))
        } else if let Some(var) = &self.ssh_key_env {
            Ok(Credential::KeyEnv(var.clone()))
        } else if let Some(password) = &self.password {
            Ok(Credential::Password(password.clone()))
        } else {
            Err(InventoryError::MissingCredential(self.address.clone()))
        }
    }
}

/// Maximum concurrent viewers for a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerCap {
    Limited(u32),
    #[default]
    Unlimited,
}

impl ViewerCap {
    /// Value the media server treats as unlimited
    pub const UNLIMITED_VALUE: u32 = 999_999;

    /// Number written into the descriptor
    #[must_use]
    pub fn effective(self) -> u32 {
        match self {
            ViewerCap::Limited(n) => n,
            ViewerCap::Unlimited => Self::UNLIMITED_VALUE,
        }
    }
}

impl fmt::Display for ViewerCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerCap::Limited(n) => write!(f, "{n}"),
            ViewerCap::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for ViewerCap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ViewerCap::Limited(n) => serializer.serialize_u32(*n),
            ViewerCap::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

struct ViewerCapVisitor;

impl Visitor<'_> for ViewerCapVisitor {
    type Value = ViewerCap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a viewer count or \"unlimited\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ViewerCap, E> {
        u32::try_from(v)
            .map(ViewerCap::Limited)
            .map_err(|_| E::custom(format!("viewer cap {v} out of range")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ViewerCap, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(format!("viewer cap {v} is negative")))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ViewerCap, E> {
        if v.eq_ignore_ascii_case("unlimited") {
            Ok(ViewerCap::Unlimited)
        } else {
            v.parse::<u32>()
                .map(ViewerCap::Limited)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for ViewerCap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ViewerCapVisitor)
    }
}

/// A tenant as stored in the inventory
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRecord {
    /// Also the OS login and remote directory name
    pub name: String,
    #[serde(default)]
    pub bandwidth_kbps: Option<u32>,
    #[serde(default)]
    pub viewers: ViewerCap,
    /// Publish credential secret; the engine default applies when absent
    #[serde(default)]
    pub stream_secret: Option<Secret>,
    /// OS account password, defaults to the stream secret
    #[serde(default)]
    pub account_password: Option<Secret>,
}
