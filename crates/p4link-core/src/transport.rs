//! Trait seam over the remote-procedure transport.
//!
//! The core never speaks the wire protocol itself. A [`Transport`] opens
//! connections; the core drives each established [`Connection`] through this
//! interface and leaves command execution and teardown mechanics to the
//! implementor. Connections are exclusively owned, never pooled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConnectionConfig;

/// Failure reported by the underlying transport.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receives per-command progress lines from a running server command.
///
/// Returning `false` asks the transport to cancel the command.
pub trait ProgressCallback: Send + Sync {
    fn tick(&self, line: &str) -> bool;
}

/// Observes commands issued on a connection.
pub trait CommandCallback: Send + Sync {
    fn issuing(&self, command: &str);
    fn completed(&self, command: &str);
}

/// Factory for server connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a single connection attempt. Retry policy is the caller's
    /// concern; a hung attempt is bounded by the transport's own timeout.
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

/// An established server connection.
#[async_trait]
pub trait Connection: Send {
    fn set_username(&mut self, user: &str);
    fn username(&self) -> String;

    /// Whether the server runs in Unicode mode. Clients must select a
    /// UTF-8 charset before issuing commands against such servers.
    async fn supports_unicode(&mut self) -> Result<bool, TransportError>;
    fn set_charset_name(&mut self, charset: &str);

    /// Runs a status-style command and returns the reported result lines.
    async fn exec_status_command(
        &mut self,
        command: &str,
        args: &[&str],
    ) -> Result<Vec<String>, TransportError>;

    async fn login(&mut self, password: &str, all_hosts: bool) -> Result<(), TransportError>;
    async fn logout(&mut self) -> Result<(), TransportError>;

    /// One-line human-readable login state, used for diagnostics when an
    /// authentication attempt is rejected.
    async fn login_status(&mut self) -> Result<String, TransportError>;

    fn set_auth_ticket(&mut self, ticket: &str);
    fn auth_ticket(&self) -> Option<String>;
    fn set_tickets_file_path(&mut self, path: &Path);
    fn tickets_file_path(&self) -> Option<PathBuf>;

    /// Fingerprint the server presented for trust establishment.
    async fn trust_fingerprint(&mut self) -> Result<String, TransportError>;

    /// Server release in `YYYYR` form, e.g. 20092 for the 2009.2 release.
    fn server_version(&self) -> u32;

    fn is_connected(&self) -> bool;
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    fn register_progress_callback(&mut self, callback: Arc<dyn ProgressCallback>);
    fn register_command_callback(&mut self, callback: Arc<dyn CommandCallback>);

    /// Name of the per-client ignore file, when one is configured.
    fn ignore_file_name(&self) -> Option<String>;
    fn set_ignore_file_name(&mut self, name: &str);
}
