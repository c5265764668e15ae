//! Durable snapshot storage for resolved favorite entries.
//!
//! The snapshot is a single JSON array of catalog entries in a fixed
//! file under the data directory. It always reflects the last
//! successfully resolved favorites state, so an offline session shows
//! exactly what was last confirmed.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::CatalogEntry;

/// File name of the favorites snapshot inside the data directory.
const SNAPSHOT_FILE: &str = "favorites.json";

/// Errors that can occur during snapshot storage operations.
#[derive(Debug)]
pub enum CacheError {
    /// Filesystem error at the given path.
    IoError(PathBuf, io::Error),
    /// Snapshot file could not be parsed.
    ParseError(PathBuf, serde_json::Error),
    /// Snapshot could not be serialized.
    SerializeError(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::IoError(path, e) => {
                write!(f, "Cache I/O error at '{}': {}", path.display(), e)
            }
            CacheError::ParseError(path, e) => {
                write!(f, "Failed to parse snapshot '{}': {}", path.display(), e)
            }
            CacheError::SerializeError(e) => write!(f, "Failed to serialize snapshot: {}", e),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::IoError(_, e) => Some(e),
            CacheError::ParseError(_, e) => Some(e),
            CacheError::SerializeError(e) => Some(e),
        }
    }
}

/// Storage adapter for the favorites snapshot.
#[derive(Debug, Clone)]
pub struct FavoritesCache {
    data_dir: PathBuf,
}

impl FavoritesCache {
    /// Creates a cache rooted at the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the full path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Checks whether a snapshot exists on disk.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Overwrites the snapshot with the given entries.
    pub fn save(&self, entries: &[CatalogEntry]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| CacheError::IoError(self.data_dir.clone(), e))?;

        let json = serde_json::to_vec_pretty(entries).map_err(CacheError::SerializeError)?;

        let path = self.path();
        fs::write(&path, json).map_err(|e| CacheError::IoError(path, e))
    }

    /// Loads the snapshot.
    ///
    /// A missing file is not an error: it reads as an empty snapshot.
    pub fn load(&self) -> Result<Vec<CatalogEntry>, CacheError> {
        let path = self.path();

        match fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| CacheError::ParseError(path, e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(CacheError::IoError(path, e)),
        }
    }

    /// Removes the snapshot file if present.
    pub fn clear(&self) -> Result<(), CacheError> {
        let path = self.path();

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::IoError(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (FavoritesCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = FavoritesCache::new(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    fn sample_entries() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new(1, "bulbasaur").with_types(vec!["grass".into(), "poison".into()]),
            CatalogEntry::new(25, "pikachu").with_types(vec!["electric".into()]),
        ]
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (cache, _temp) = test_cache();
        assert!(!cache.exists());
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (cache, _temp) = test_cache();
        let entries = sample_entries();

        cache.save(&entries).unwrap();
        assert!(cache.exists());

        let loaded = cache.load().unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_save_overwrites_prior_snapshot() {
        let (cache, _temp) = test_cache();

        cache.save(&sample_entries()).unwrap();
        cache.save(&[CatalogEntry::new(4, "charmander")]).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 4);
    }

    #[test]
    fn test_save_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FavoritesCache::new(temp_dir.path().join("nested").join("dir"));

        cache.save(&sample_entries()).unwrap();
        assert_eq!(cache.load().unwrap().len(), 2);
    }

    #[test]
    fn test_clear() {
        let (cache, _temp) = test_cache();

        cache.save(&sample_entries()).unwrap();
        cache.clear().unwrap();
        assert!(!cache.exists());
        assert!(cache.load().unwrap().is_empty());

        // Clearing an already-empty cache is fine.
        cache.clear().unwrap();
    }

    #[test]
    fn test_snapshot_is_plain_json_array() {
        let (cache, _temp) = test_cache();
        cache.save(&sample_entries()).unwrap();

        let raw = std::fs::read_to_string(cache.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_load_corrupt_snapshot_errors() {
        let (cache, _temp) = test_cache();
        std::fs::write(cache.path(), b"not json").unwrap();

        let result = cache.load();
        assert!(matches!(result, Err(CacheError::ParseError(_, _))));
    }
}
