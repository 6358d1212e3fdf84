//! Scripted doubles for the transport seam, shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::transport::{CommandCallback, Connection, ProgressCallback, Transport, TransportError};

/// Observations recorded by a [`MockConnection`], shared with the test body
/// so they stay reachable after the connection is boxed away.
#[derive(Default)]
pub(crate) struct MockState {
    exec_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    charset: Mutex<Option<String>>,
    ignore_file: Mutex<Option<String>>,
    progress_registered: AtomicBool,
    command_registered: AtomicBool,
}

impl MockState {
    pub fn exec_calls(&self) -> usize {
        self.exec_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn charset(&self) -> Option<String> {
        self.charset.lock().unwrap().clone()
    }

    pub fn ignore_file(&self) -> Option<String> {
        self.ignore_file.lock().unwrap().clone()
    }

    pub fn progress_registered(&self) -> bool {
        self.progress_registered.load(Ordering::SeqCst)
    }

    pub fn command_registered(&self) -> bool {
        self.command_registered.load(Ordering::SeqCst)
    }
}

/// Connection double whose answers are scripted per test.
pub(crate) struct MockConnection {
    pub username: String,
    pub unicode: bool,
    pub connected: bool,
    pub version: u32,

    /// Lines answered to the login-status command.
    pub status_lines: Vec<String>,
    /// Installed as `status_lines` once any credential is presented.
    pub granted_lines: Option<Vec<String>>,
    /// Simulated server latency for the login-status command.
    pub status_delay: Option<Duration>,
    pub login_status: String,

    pub ticket: Option<String>,
    pub tickets_path: Option<PathBuf>,
    pub tickets_path_sets: usize,
    pub login_args: Option<(String, bool)>,
    pub ignore_file: Option<String>,

    pub fail_exec: bool,
    pub fail_disconnect: bool,

    pub state: Arc<MockState>,
}

impl MockConnection {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            unicode: false,
            connected: true,
            version: 20221,
            status_lines: Vec::new(),
            granted_lines: None,
            status_delay: None,
            login_status: "Perforce password (P4PASSWD) invalid or unset.".to_string(),
            ticket: None,
            tickets_path: None,
            tickets_path_sets: 0,
            login_args: None,
            ignore_file: None,
            fail_exec: false,
            fail_disconnect: false,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn with_state(mut self, state: Arc<MockState>) -> Self {
        self.state = state;
        self
    }

    fn grant(&mut self) {
        if let Some(lines) = self.granted_lines.clone() {
            self.status_lines = lines;
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn set_username(&mut self, user: &str) {
        self.username = user.to_string();
    }

    fn username(&self) -> String {
        self.username.clone()
    }

    async fn supports_unicode(&mut self) -> Result<bool, TransportError> {
        Ok(self.unicode)
    }

    fn set_charset_name(&mut self, charset: &str) {
        *self.state.charset.lock().unwrap() = Some(charset.to_string());
    }

    async fn exec_status_command(
        &mut self,
        _command: &str,
        _args: &[&str],
    ) -> Result<Vec<String>, TransportError> {
        self.state.exec_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exec {
            return Err(TransportError::new("connection reset"));
        }
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.status_lines.clone())
    }

    async fn login(&mut self, password: &str, all_hosts: bool) -> Result<(), TransportError> {
        self.login_args = Some((password.to_string(), all_hosts));
        self.grant();
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), TransportError> {
        self.state.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.status_lines.clear();
        Ok(())
    }

    async fn login_status(&mut self) -> Result<String, TransportError> {
        Ok(self.login_status.clone())
    }

    fn set_auth_ticket(&mut self, ticket: &str) {
        self.ticket = Some(ticket.to_string());
        self.grant();
    }

    fn auth_ticket(&self) -> Option<String> {
        self.ticket.clone()
    }

    fn set_tickets_file_path(&mut self, path: &Path) {
        self.tickets_path = Some(path.to_path_buf());
        self.tickets_path_sets += 1;
        self.grant();
    }

    fn tickets_file_path(&self) -> Option<PathBuf> {
        self.tickets_path.clone()
    }

    async fn trust_fingerprint(&mut self) -> Result<String, TransportError> {
        Ok("AB:CD:EF:01:23:45".to_string())
    }

    fn server_version(&self) -> u32 {
        self.version
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if self.fail_disconnect {
            return Err(TransportError::new("socket already closed"));
        }
        self.connected = false;
        Ok(())
    }

    fn register_progress_callback(&mut self, _callback: Arc<dyn ProgressCallback>) {
        self.state.progress_registered.store(true, Ordering::SeqCst);
    }

    fn register_command_callback(&mut self, _callback: Arc<dyn CommandCallback>) {
        self.state.command_registered.store(true, Ordering::SeqCst);
    }

    fn ignore_file_name(&self) -> Option<String> {
        self.ignore_file.clone()
    }

    fn set_ignore_file_name(&mut self, name: &str) {
        self.ignore_file = Some(name.to_string());
        *self.state.ignore_file.lock().unwrap() = Some(name.to_string());
    }
}

/// Transport double: fails the first `fail_attempts` connects, then hands
/// out connections built by the factory.
pub(crate) struct MockTransport {
    fail_attempts: usize,
    attempts: AtomicUsize,
    factory: Box<dyn Fn() -> MockConnection + Send + Sync>,
}

impl MockTransport {
    pub fn new(factory: impl Fn() -> MockConnection + Send + Sync + 'static) -> Self {
        Self {
            fail_attempts: 0,
            attempts: AtomicUsize::new(0),
            factory: Box::new(factory),
        }
    }

    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_attempts = attempts;
        self
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_attempts {
            return Err(TransportError::new(format!(
                "connection refused (attempt {attempt})"
            )));
        }
        Ok(Box::new((self.factory)()))
    }
}
