//! Library configuration.
//!
//! Process-wide defaults are stored at `~/.config/p4link/config.json`.
//! `ConnectionConfig` is the per-connection subset handed to the transport
//! when opening a connection.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::CredentialConfig;

/// Application name used for the config directory path
const APP_NAME: &str = "p4link";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Connect retries after the initial attempt when nothing is configured.
pub(crate) const DEFAULT_RETRIES: u32 = 2;

/// Prefix marking a TLS server address.
const SSL_PREFIX: &str = "ssl:";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connect retries after the initial attempt.
    pub retry: u32,
    /// Unit backoff delay in seconds; retry `n` waits `n*n` times this.
    pub backoff_base_secs: u64,
    /// Treat a blank login-status line as an authenticated session. Brokers
    /// sometimes swallow the status message body; enable only when such an
    /// intermediary sits between client and server.
    pub accept_blank_login_status: bool,
    /// Overrides the platform default ignore-file name.
    pub ignore_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: DEFAULT_RETRIES,
            backoff_base_secs: 1,
            accept_blank_login_status: false,
            ignore_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

/// Per-connection settings handed to the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server address, `host:port` or `ssl:host:port`.
    pub p4port: String,
    /// Expected server fingerprint for TLS addresses.
    pub trust_fingerprint: Option<String>,
}

impl ConnectionConfig {
    pub fn new(p4port: impl Into<String>) -> Self {
        Self {
            p4port: p4port.into(),
            trust_fingerprint: None,
        }
    }

    pub fn from_credential(credential: &CredentialConfig) -> Self {
        Self {
            p4port: credential.p4port.clone(),
            trust_fingerprint: credential.trust_fingerprint.clone(),
        }
    }

    /// Whether the address requests a TLS connection.
    pub fn is_ssl(&self) -> bool {
        self.p4port.starts_with(SSL_PREFIX)
    }
}
