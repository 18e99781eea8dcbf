//! Configuration schema definitions.
//!
//! `ServerOptions` is what callers hand in (every field optional);
//! `Settings` is the fully-resolved configuration the rest of the
//! system reads. All types derive Serde traits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default URL domain.
pub const DEFAULT_DOMAIN: &str = "localhost";

/// Default URL protocol, reported by the info endpoint.
pub const DEFAULT_PROTOCOL: &str = "http";

/// Caller-supplied server options. Omitted fields fall back to the
/// currently configured value (defaults on first use).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerOptions {
    /// Listen port (default: 5000).
    pub port: Option<u16>,

    /// URL domain (default: "localhost").
    pub domain: Option<String>,

    /// Cache directory scanned for tileset files (default: ~/mbtiles).
    pub cache: Option<PathBuf>,
}

/// Effective server configuration. Fully populated before the listener
/// binds; read concurrently by request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub port: u16,
    pub domain: String,
    pub cache: PathBuf,
    pub protocol: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            domain: DEFAULT_DOMAIN.to_string(),
            cache: default_cache_dir(),
            protocol: DEFAULT_PROTOCOL.to_string(),
        }
    }
}

impl Settings {
    /// Merge caller options over these settings, field by field.
    pub fn merged(&self, options: &ServerOptions) -> Self {
        Self {
            port: options.port.unwrap_or(self.port),
            domain: options.domain.clone().unwrap_or_else(|| self.domain.clone()),
            cache: options.cache.clone().unwrap_or_else(|| self.cache.clone()),
            protocol: self.protocol.clone(),
        }
    }

    /// Convert back into fully-specified options, used when a restart
    /// must replay the previously active configuration.
    pub fn to_options(&self) -> ServerOptions {
        ServerOptions {
            port: Some(self.port),
            domain: Some(self.domain.clone()),
            cache: Some(self.cache.clone()),
        }
    }
}

/// Cache directory default: `~/mbtiles`, or `/tmp/mbtiles` when $HOME
/// is unset.
fn default_cache_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("mbtiles")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_partial_options() {
        let settings = Settings::default();
        let merged = settings.merged(&ServerOptions {
            port: Some(5001),
            domain: None,
            cache: None,
        });

        assert_eq!(merged.port, 5001);
        assert_eq!(merged.domain, DEFAULT_DOMAIN);
        assert_eq!(merged.cache, settings.cache);
        assert_eq!(merged.protocol, DEFAULT_PROTOCOL);
    }

    #[test]
    fn test_options_round_trip_preserve_settings() {
        let settings = Settings {
            port: 5001,
            domain: "tiles.example.com".into(),
            cache: PathBuf::from("/tmp/t1"),
            protocol: DEFAULT_PROTOCOL.into(),
        };

        let replayed = Settings::default().merged(&settings.to_options());
        assert_eq!(replayed, settings);
    }
}
