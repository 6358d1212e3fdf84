//! Process-shared login cache.
//!
//! This module provides the `LoginCache`, the record of users believed
//! currently authenticated and when their tickets expire. One instance is
//! constructed at startup and shared across every session helper in the
//! process.

pub mod login;

pub use login::{CacheGuard, LoginCache, SessionEntry};
