//! Authentication module for credentials and login dispatch.
//!
//! This module provides:
//! - `Credential`: the supported ways of proving identity to the server
//! - `CredentialConfig`: one session's credential plus its session policy
//! - `CredentialStore`: secure OS-level secret storage via keyring
//! - `strategy`: presenting a credential to an established connection

pub mod credentials;
pub mod strategy;

pub use credentials::{Credential, CredentialConfig, CredentialStore};
pub use strategy::authenticate;
