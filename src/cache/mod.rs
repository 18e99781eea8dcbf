//! Cache directory management.
//!
//! The cache directory holds the tileset files served by the tile
//! routes. It is created on start if missing, enumerated by the info
//! endpoint, and watched for changes that trigger a server restart.

pub mod watcher;

use std::ffi::OsStr;
use std::io;
use std::path::Path;

pub use watcher::CacheWatcher;

/// File extension identifying tileset files in the cache directory.
pub const TILESET_EXTENSION: &str = "mbtiles";

/// Create the cache directory and any missing parents. Succeeds if the
/// directory already exists.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// List tileset filenames in the cache directory, non-recursively,
/// sorted by name.
///
/// This feeds a diagnostic endpoint, so an unreadable directory
/// degrades to an empty list instead of an error.
pub fn list_tilesets(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(path = %dir.display(), %error, "cache directory unreadable");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| Path::new(name).extension() == Some(OsStr::new(TILESET_EXTENSION)))
        .collect();

    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("world.mbtiles"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        // A directory with a matching name is not a tileset file.
        std::fs::create_dir(dir.path().join("nested.mbtiles")).unwrap();

        assert_eq!(list_tilesets(dir.path()), vec!["world.mbtiles"]);
    }

    #[test]
    fn test_list_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mbtiles"), b"").unwrap();
        std::fs::write(dir.path().join("a.mbtiles"), b"").unwrap();
        std::fs::write(dir.path().join("c.mbtiles"), b"").unwrap();

        assert_eq!(list_tilesets(dir.path()), vec!["a.mbtiles", "b.mbtiles", "c.mbtiles"]);

        // Unchanged directory lists identically on repeated calls.
        assert_eq!(list_tilesets(dir.path()), list_tilesets(dir.path()));
    }

    #[test]
    fn test_missing_dir_degrades_to_empty() {
        assert!(list_tilesets(Path::new("/nonexistent/mbtiles-cache")).is_empty());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("a").join("b");

        ensure_dir(&cache).unwrap();
        assert!(cache.is_dir());
        ensure_dir(&cache).unwrap();
    }
}
