use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::{Config, ConnectionConfig};
use crate::connection::retry::RetryPolicy;
use crate::console::{CommandLogger, ProgressReporter, SessionListener};
use crate::error::SessionError;
use crate::session::AbortFlag;
use crate::transport::{Connection, Transport, TransportError};

/// Charset selected on connections to Unicode-mode servers.
pub(crate) const UNICODE_CHARSET: &str = "utf8";

/// Owns an established connection.
///
/// Construction is the connect-with-retry loop; once a `ConnectionManager`
/// exists, its connection is up and fully set up. The connection is owned
/// exclusively and never shared between helpers.
pub struct ConnectionManager {
    connection: Box<dyn Connection>,
    listener: Arc<dyn SessionListener>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager").finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Establishes a connection, retrying failed attempts with quadratic
    /// backoff. Without a connection nothing else can proceed, so running
    /// out of attempts is a terminal failure carrying the last underlying
    /// error.
    pub async fn connect(
        transport: &dyn Transport,
        config: &ConnectionConfig,
        policy: &RetryPolicy,
        settings: &Config,
        listener: Arc<dyn SessionListener>,
        abort: AbortFlag,
    ) -> Result<Self, SessionError> {
        let mut last_error = String::from("no connection attempt made");
        let mut attempt = 0u32;

        loop {
            if abort.is_set() {
                listener.log("connection attempt aborted");
                return Err(SessionError::Aborted);
            }

            match Self::attempt(transport, config, settings, &listener, &abort).await {
                Ok(connection) => {
                    debug!(p4port = %config.p4port, "opened connection");
                    return Ok(Self {
                        connection,
                        listener,
                    });
                }
                Err(e) => last_error = e.to_string(),
            }

            attempt += 1;
            if attempt > policy.retries {
                break;
            }

            let message = format!("connection retry {attempt} of {}", policy.retries);
            warn!(p4port = %config.p4port, "{message}");
            listener.log(&message);
            tokio::time::sleep(policy.backoff(attempt)).await;
        }

        error!(
            p4port = %config.p4port,
            attempts = policy.retries + 1,
            last_error = %last_error,
            "giving up on connection"
        );
        listener.log(&last_error);
        Err(SessionError::ConnectionExhausted {
            attempts: policy.retries + 1,
            last_error,
        })
    }

    /// One connect attempt plus post-connect setup. A setup fault counts as
    /// a failed attempt and is retried with the rest.
    async fn attempt(
        transport: &dyn Transport,
        config: &ConnectionConfig,
        settings: &Config,
        listener: &Arc<dyn SessionListener>,
        abort: &AbortFlag,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let mut conn = transport.connect(config).await?;

        // Charset is only valid against a Unicode-mode server.
        if conn.supports_unicode().await? {
            conn.set_charset_name(UNICODE_CHARSET);
        }

        conn.register_progress_callback(Arc::new(ProgressReporter::new(
            Arc::clone(listener),
            abort.clone(),
        )));
        conn.register_command_callback(Arc::new(CommandLogger));

        if conn.ignore_file_name().is_none() {
            let ignore = settings
                .ignore_file
                .clone()
                .unwrap_or_else(|| default_ignore_file().to_string());
            conn.set_ignore_file_name(&ignore);
        }

        Ok(conn)
    }

    pub fn conn(&mut self) -> &mut dyn Connection {
        &mut *self.connection
    }

    pub fn conn_ref(&self) -> &dyn Connection {
        &*self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Best-effort disconnect. The session is ending regardless, so
    /// failures are logged and swallowed.
    pub async fn disconnect(&mut self) {
        match self.connection.disconnect().await {
            Ok(()) => debug!("closed connection"),
            Err(e) => {
                let message = format!("unable to close server connection: {e}");
                error!("{message}");
                self.listener.log(&message);
            }
        }
    }
}

/// Platform default name for the ignore file listing excluded paths.
fn default_ignore_file() -> &'static str {
    if cfg!(windows) {
        "p4ignore.txt"
    } else {
        ".p4ignore"
    }
}
