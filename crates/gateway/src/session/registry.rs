//! In-memory credential registry.
//!
//! Maps an issued credential to the instant its session ends. The expiry
//! here is owned by the gateway and may diverge from the credential's own
//! `exp` claim (renewal moves it, logout removes it).
//!
//! Backed by a sharded `DashMap`; no operation takes a global lock.

use chrono::{DateTime, Utc};
use common::clock::Clock;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of live credentials.
pub struct CredentialRegistry {
    entries: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are bearer credentials; never print them
        f.debug_struct("CredentialRegistry")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl CredentialRegistry {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Insert or overwrite the entry for `token`.
    pub fn store(&self, token: &str, expiry: DateTime<Utc>) {
        self.entries.insert(token.to_string(), expiry);
    }

    /// Whether `token` has an entry that has not yet expired.
    ///
    /// Absent and expired tokens are indistinguishable to the caller.
    #[must_use]
    pub fn is_valid(&self, token: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(token)
            .is_some_and(|expiry| *expiry > now)
    }

    /// Move the expiry of an existing entry. No-op if absent.
    pub fn renew(&self, token: &str, new_expiry: DateTime<Utc>) {
        if let Some(mut expiry) = self.entries.get_mut(token) {
            *expiry = new_expiry;
        }
    }

    /// Expiry of `token`, if registered (expired or not).
    #[must_use]
    pub fn expiry(&self, token: &str) -> Option<DateTime<Utc>> {
        self.entries.get(token).map(|expiry| *expiry)
    }

    /// Remove `token`. No-op if absent.
    pub fn remove(&self, token: &str) {
        self.entries.remove(token);
    }

    /// Remove every entry with `expiry <= now`; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, expiry| {
            let live = *expiry > now;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// Number of entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
