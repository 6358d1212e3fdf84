//! The session facade.
//!
//! `SessionHelper` ties the pieces together: it opens a connection through
//! the `ConnectionManager`, consults the shared `LoginCache` before asking
//! the server about login state, and dispatches the credential strategy
//! when a fresh login is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{self, CredentialConfig};
use crate::cache::{CacheGuard, LoginCache, SessionEntry};
use crate::config::{Config, ConnectionConfig};
use crate::connection::manager::UNICODE_CHARSET;
use crate::connection::{ConnectionManager, RetryPolicy};
use crate::console::SessionListener;
use crate::error::SessionError;
use crate::status::{self, StatusLine};
use crate::transport::Transport;

/// Login-status command with its silent flag: reports state without
/// forcing a fresh login.
const LOGIN_CMD: &str = "login";
const LOGIN_STATUS_ARGS: &[&str] = &["-s"];

/// Cooperative cancellation flag shared between a helper, its connect loop,
/// and the progress callback. Setting it does not interrupt an in-flight
/// server command; holders poll at safe points.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SessionHelper {
    manager: ConnectionManager,
    credential: CredentialConfig,
    cache: Arc<LoginCache>,
    settings: Config,
    listener: Arc<dyn SessionListener>,
    abort: AbortFlag,
}

impl SessionHelper {
    /// Opens a connection for `credential`, retrying with backoff, and
    /// wraps it in a helper that shares `cache` with the rest of the
    /// process.
    pub async fn connect(
        transport: &dyn Transport,
        credential: CredentialConfig,
        cache: Arc<LoginCache>,
        listener: Arc<dyn SessionListener>,
        settings: Config,
    ) -> Result<Self, SessionError> {
        let abort = AbortFlag::new();
        let config = ConnectionConfig::from_credential(&credential);
        let policy = RetryPolicy::new(credential.retry)
            .with_base_delay(Duration::from_secs(settings.backoff_base_secs));

        let manager = ConnectionManager::connect(
            transport,
            &config,
            &policy,
            &settings,
            Arc::clone(&listener),
            abort.clone(),
        )
        .await?;

        Ok(Self {
            manager,
            credential,
            cache,
            settings,
            listener,
            abort,
        })
    }

    /// Ensures the session is authenticated.
    ///
    /// Returns `Ok(false)` when the server rejected the credential; only
    /// transport faults surface as errors. A rejected credential is never
    /// retried here, since presenting it again cannot succeed.
    pub async fn login(&mut self) -> Result<bool, SessionError> {
        let conn = self.manager.conn();
        conn.set_username(&self.credential.username);

        // Charset is only valid against a Unicode-mode server.
        if conn.supports_unicode().await? {
            conn.set_charset_name(UNICODE_CHARSET);
        }

        if self.is_logged_in().await? {
            return Ok(true);
        }

        auth::authenticate(self.manager.conn(), &self.credential).await?;

        if self.is_logged_in().await? {
            Ok(true)
        } else {
            let status = self.manager.conn().login_status().await?;
            warn!(user = %self.credential.username, status = %status, "login failed");
            self.listener.log(&format!("login failed: {status}"));
            Ok(false)
        }
    }

    /// Reports whether the current user is authenticated, consulting the
    /// shared cache before contacting the server.
    pub async fn is_logged_in(&mut self) -> Result<bool, SessionError> {
        let user = self.manager.conn_ref().username();

        let cache = Arc::clone(&self.cache);
        let mut guard = cache.lock().await;

        if self.credential.session_enabled
            && guard.is_fresh(&user, self.credential.session_margin())
        {
            return Ok(true);
        }

        self.query_login_status(&user, &mut guard).await
    }

    /// Queries the server for login state and records what it learns. The
    /// caller holds the cache guard, so the query and the cache write are
    /// one atomic step against concurrent checks for the same user.
    async fn query_login_status(
        &mut self,
        user: &str,
        guard: &mut CacheGuard<'_>,
    ) -> Result<bool, SessionError> {
        let lines = self
            .manager
            .conn()
            .exec_status_command(LOGIN_CMD, LOGIN_STATUS_ARGS)
            .await?;

        for line in &lines {
            match status::classify_line(line)? {
                StatusLine::NotNecessary => {
                    guard.insert(SessionEntry::never_expiring(user));
                    return Ok(true);
                }
                StatusLine::ExpiresAt(expires_at) => {
                    guard.insert(SessionEntry::new(user, expires_at));
                    return Ok(true);
                }
                StatusLine::Blank if self.settings.accept_blank_login_status => {
                    // An intermediary swallowed the message body. No expiry
                    // is known, so nothing is cached and the next check
                    // asks the server again.
                    info!(user, "blank login status accepted");
                    return Ok(true);
                }
                StatusLine::Blank | StatusLine::Other => continue,
            }
        }
        Ok(false)
    }

    /// Logs out and drops the user's cache entry.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if self.is_logged_in().await? {
            self.manager.conn().logout().await?;
            self.cache.invalidate(&self.credential.username).await;
        }
        Ok(())
    }

    /// Current auth ticket, logging in first when needed.
    ///
    /// Best effort: any failure is logged and yields `None`, unlike
    /// [`login`](Self::login), which surfaces transport faults.
    pub async fn get_ticket(&mut self) -> Option<String> {
        match self.login().await {
            Ok(true) => self.manager.conn_ref().auth_ticket(),
            Ok(false) => None,
            Err(e) => {
                warn!(error = %e, "could not obtain auth ticket");
                self.listener.log(&e.to_string());
                None
            }
        }
    }

    /// Fingerprint the server presented for trust establishment.
    pub async fn get_trust(&mut self) -> Result<String, SessionError> {
        Ok(self.manager.conn().trust_fingerprint().await?)
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    pub async fn is_unicode(&mut self) -> Result<bool, SessionError> {
        Ok(self.manager.conn().supports_unicode().await?)
    }

    /// Whether the server is at least `min`, with versions in `YYYYR`
    /// form, e.g. 20092 for the 2009.2 release. No server round-trip.
    pub fn check_version(&self, min: u32) -> bool {
        self.manager.conn_ref().server_version() >= min
    }

    /// Requests cooperative cancellation.
    pub fn abort(&self) {
        self.abort.set();
    }

    pub fn has_aborted(&self) -> bool {
        self.abort.is_set()
    }

    /// Token for wiring the abort flag into other machinery.
    pub fn abort_flag(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Closes the connection. Failures are logged, never propagated; the
    /// session is ending regardless.
    pub async fn disconnect(&mut self) {
        self.manager.disconnect().await;
    }

    /// Shared login cache backing this helper.
    pub fn cache(&self) -> &Arc<LoginCache> {
        &self.cache
    }
}
