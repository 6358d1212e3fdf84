use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_RETRIES;

/// Keychain service name for stored passwords
const SERVICE_NAME: &str = "p4link";

/// Keychain service name for stored ticket values
const TICKET_SERVICE_NAME: &str = "p4link-ticket";

/// Safety margin subtracted from a cached session expiry, so a session is
/// treated as stale slightly before the server would expire it.
const DEFAULT_SESSION_LIFE: Duration = Duration::from_secs(60);

/// How a session proves identity once the connection is up.
///
/// Exactly one variant is active per session; dispatch over the variants is
/// exhaustive, so there is no unknown-credential failure path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Interactive-style login with a password.
    Password {
        password: String,
        /// Request a ticket valid on all client hosts.
        all_hosts: bool,
    },
    /// A pre-obtained ticket value installed directly on the connection.
    Ticket { value: String },
    /// A tickets file already holding a valid ticket. `None` falls back to
    /// the connection's default tickets file.
    TicketPath { path: Option<PathBuf> },
}

/// One session's credential plus the session policy that goes with it.
///
/// This is what the credential store hands the core: who is logging in,
/// where, how, and how aggressively login state may be cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub username: String,
    /// Server address, `host:port` or `ssl:host:port`.
    pub p4port: String,
    /// Expected server fingerprint for TLS addresses.
    pub trust_fingerprint: Option<String>,
    pub credential: Credential,
    /// Safety margin subtracted from a cached session expiry.
    pub session_life: Duration,
    /// Whether login state may be cached for this credential.
    pub session_enabled: bool,
    /// Connect retries after the initial attempt.
    pub retry: u32,
}

impl CredentialConfig {
    pub fn new(
        username: impl Into<String>,
        p4port: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            username: username.into(),
            p4port: p4port.into(),
            trust_fingerprint: None,
            credential,
            session_life: DEFAULT_SESSION_LIFE,
            session_enabled: true,
            retry: DEFAULT_RETRIES,
        }
    }

    pub fn with_session(mut self, session_life: Duration, session_enabled: bool) -> Self {
        self.session_life = session_life;
        self.session_enabled = session_enabled;
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_trust(mut self, fingerprint: impl Into<String>) -> Self {
        self.trust_fingerprint = Some(fingerprint.into());
        self
    }

    /// Session margin as a chrono duration for expiry arithmetic.
    pub(crate) fn session_margin(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_life).unwrap_or(chrono::Duration::MAX)
    }
}

/// Secure storage for passwords and ticket values in the OS keychain.
pub struct CredentialStore;

impl CredentialStore {
    /// Store a password for a username in the OS keychain
    pub fn store_password(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the password for a username from the OS keychain
    pub fn get_password(username: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Store a ticket value for a username in the OS keychain
    pub fn store_ticket(username: &str, ticket: &str) -> Result<()> {
        let entry = Entry::new(TICKET_SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(ticket)
            .context("Failed to store ticket in keychain")?;
        Ok(())
    }

    /// Retrieve the ticket value for a username from the OS keychain
    pub fn get_ticket(username: &str) -> Result<String> {
        let entry = Entry::new(TICKET_SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve ticket from keychain")
    }

    /// Delete stored secrets for a username
    pub fn delete(username: &str) -> Result<()> {
        for service in [SERVICE_NAME, TICKET_SERVICE_NAME] {
            if let Ok(entry) = Entry::new(service, username) {
                // Missing entries are fine; only report real keychain faults.
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => {}
                    Err(e) => {
                        return Err(e).context("Failed to delete credential from keychain")
                    }
                }
            }
        }
        Ok(())
    }

    /// Check if a password exists for a username
    pub fn has_password(username: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, username) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
