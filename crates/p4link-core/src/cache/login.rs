use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// A user believed authenticated until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(user: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            expires_at,
        }
    }

    /// Entry for a session the server reported as never needing a fresh
    /// login for the lifetime of this process.
    pub fn never_expiring(user: impl Into<String>) -> Self {
        Self::new(user, DateTime::<Utc>::MAX_UTC)
    }
}

/// Shared login cache keyed by username.
///
/// Handed out as an `Arc` to every session helper. The mutex is held across
/// the whole check-then-act sequence of a login check, so two concurrent
/// callers for the same user cannot both query the server, and a fresher
/// entry cannot be overwritten by a stale one. Entries for different users
/// have no ordering relationship.
#[derive(Debug, Default)]
pub struct LoginCache {
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl LoginCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the cache for one check-then-act sequence.
    pub async fn lock(&self) -> CacheGuard<'_> {
        CacheGuard {
            entries: self.entries.lock().await,
        }
    }

    /// Drops any entry for `user`. The next login check will query the
    /// server regardless of prior cache state. Called when an external
    /// party knows the session went stale, e.g. on credential rotation.
    pub async fn invalidate(&self, user: &str) {
        if self.entries.lock().await.remove(user).is_some() {
            debug!(user, "invalidated session entry");
        }
    }

    /// Current entry for `user`, if any.
    pub async fn entry(&self, user: &str) -> Option<SessionEntry> {
        self.entries.lock().await.get(user).cloned()
    }
}

/// Exclusive view over the cache for one check-then-act sequence.
pub struct CacheGuard<'a> {
    entries: MutexGuard<'a, HashMap<String, SessionEntry>>,
}

impl CacheGuard<'_> {
    /// Reports whether `user` holds an entry still comfortably inside its
    /// lifetime. `margin` is subtracted so a session is discarded slightly
    /// before the server would expire it. A stale entry is evicted.
    pub fn is_fresh(&mut self, user: &str, margin: Duration) -> bool {
        let Some(entry) = self.entries.get(user) else {
            debug!(user, "no session entry");
            return false;
        };
        // Checked subtraction: an extreme margin must read as stale, not
        // overflow the duration arithmetic.
        let remain = (entry.expires_at - Utc::now()).checked_sub(&margin);
        match remain {
            Some(remain) if remain > Duration::zero() => {
                debug!(user, "found session entry");
                true
            }
            _ => {
                debug!(user, "removing stale session entry");
                self.entries.remove(user);
                false
            }
        }
    }

    /// Records a user as authenticated until the entry's expiry.
    pub fn insert(&mut self, entry: SessionEntry) {
        self.entries.insert(entry.user.clone(), entry);
    }

    pub fn remove(&mut self, user: &str) {
        self.entries.remove(user);
    }

    pub fn contains(&self, user: &str) -> bool {
        self.entries.contains_key(user)
    }
}
