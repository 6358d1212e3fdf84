//! Session management for Perforce-style version-control servers.
//!
//! This crate owns the lifecycle of an authenticated server session:
//! - `ConnectionManager`: connection establishment with bounded retry/backoff
//! - `auth`: credential variants, dispatch, and secure keychain storage
//! - `LoginCache`: process-shared record of users believed authenticated
//! - `SessionHelper`: the facade callers use for login, logout, and tickets
//!
//! The wire protocol itself is not implemented here. Callers supply a
//! [`Transport`] implementation; everything above the transport seam lives
//! in this crate.

pub mod auth;
pub mod cache;
pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use auth::{Credential, CredentialConfig, CredentialStore};
pub use cache::{LoginCache, SessionEntry};
pub use config::{Config, ConnectionConfig};
pub use connection::{ConnectionManager, RetryPolicy};
pub use console::{SessionListener, TracingListener};
pub use error::SessionError;
pub use session::{AbortFlag, SessionHelper};
pub use transport::{Connection, Transport, TransportError};
