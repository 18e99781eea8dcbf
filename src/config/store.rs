//! Shared configuration store.
//!
//! # Responsibilities
//! - Hold the effective `Settings` for the whole process
//! - Serve lock-free reads from request handlers
//! - Apply option merges atomically during start/restart
//!
//! # Design Decisions
//! - Snapshot semantics via arc-swap: readers get a consistent view,
//!   never a half-written one
//! - Writes happen only from the lifecycle paths, which already
//!   serialize on the server state lock
//! - No validation here; a bad port or cache path surfaces as a
//!   bind or filesystem error at start

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::{ServerOptions, Settings};

/// Process-wide configuration handle. Cheap to clone; all clones share
/// the same underlying settings.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    settings: Arc<ArcSwap<Settings>>,
}

impl ConfigStore {
    /// Create a store populated with defaults.
    pub fn new() -> Self {
        Self {
            settings: Arc::new(ArcSwap::from_pointee(Settings::default())),
        }
    }

    /// Current settings snapshot. May be stale relative to an in-flight
    /// restart, but always internally consistent.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// Merge options over the current settings and swap the snapshot.
    /// Returns the new effective settings.
    pub fn apply(&self, options: &ServerOptions) -> Settings {
        let next = self.snapshot().merged(options);
        self.settings.store(Arc::new(next.clone()));
        next
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::schema::DEFAULT_PORT;

    #[test]
    fn test_defaults() {
        let store = ConfigStore::new();
        let settings = store.snapshot();

        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.domain, "localhost");
        assert_eq!(settings.protocol, "http");
    }

    #[test]
    fn test_apply_overwrites_and_keeps_rest() {
        let store = ConfigStore::new();
        store.apply(&ServerOptions {
            port: Some(5001),
            domain: None,
            cache: Some(PathBuf::from("/tmp/t1")),
        });

        let settings = store.snapshot();
        assert_eq!(settings.port, 5001);
        assert_eq!(settings.cache, PathBuf::from("/tmp/t1"));
        assert_eq!(settings.domain, "localhost");

        // A later apply falls back to the previously configured values,
        // not the defaults.
        store.apply(&ServerOptions::default());
        assert_eq!(store.snapshot().port, 5001);
    }

    #[test]
    fn test_clones_share_state() {
        let store = ConfigStore::new();
        let reader = store.clone();

        store.apply(&ServerOptions {
            port: Some(9000),
            ..Default::default()
        });
        assert_eq!(reader.snapshot().port, 9000);
    }
}
