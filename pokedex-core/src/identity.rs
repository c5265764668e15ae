//! User identity and the durable favorite-id set.
//!
//! The sync engine consumes the `IdentitySource` trait; `LocalIdentity`
//! is the file-backed implementation shipped with the CLI. A remote
//! (account-backed) implementation can replace it without touching the
//! engine.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur during identity operations.
#[derive(Debug)]
pub enum IdentityError {
    /// No user is signed in.
    NoIdentity,
    /// Filesystem error at the given path.
    IoError(PathBuf, io::Error),
    /// Identity file could not be parsed.
    ParseError(PathBuf, serde_json::Error),
    /// Identity state could not be serialized.
    SerializeError(serde_json::Error),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::NoIdentity => write!(f, "No user identity present"),
            IdentityError::IoError(path, e) => {
                write!(f, "Identity I/O error at '{}': {}", path.display(), e)
            }
            IdentityError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse identity file '{}': {}",
                    path.display(),
                    e
                )
            }
            IdentityError::SerializeError(e) => write!(f, "Failed to serialize identity: {}", e),
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentityError::IoError(_, e) => Some(e),
            IdentityError::ParseError(_, e) => Some(e),
            IdentityError::SerializeError(e) => Some(e),
            IdentityError::NoIdentity => None,
        }
    }
}

/// The current user and their durable favorite-id set.
#[allow(async_fn_in_trait)]
pub trait IdentitySource {
    /// The signed-in user's id, if any.
    fn user_id(&self) -> Option<&str>;

    /// The user's current favorite ids.
    async fn favorite_ids(&self) -> Result<BTreeSet<u32>, IdentityError>;

    /// Adds an id to the favorite set. Returns true if the set changed.
    async fn add_favorite(&mut self, id: u32) -> Result<bool, IdentityError>;

    /// Removes an id from the favorite set. Returns true if the set changed.
    async fn remove_favorite(&mut self, id: u32) -> Result<bool, IdentityError>;
}

/// On-disk layout of a user's favorites file.
#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    user: String,
    favorite_ids: BTreeSet<u32>,
    updated_at: DateTime<Utc>,
}

/// File-backed identity source.
///
/// Favorites are stored per user as `favorites-<user>.json` in the
/// data directory. Mutations persist before they report success, so
/// the in-memory set never runs ahead of disk.
#[derive(Debug)]
pub struct LocalIdentity {
    data_dir: PathBuf,
    user: String,
    favorites: BTreeSet<u32>,
}

impl LocalIdentity {
    /// Loads (or starts empty) the favorites set for the given user.
    pub fn load(data_dir: PathBuf, user: impl Into<String>) -> Result<Self, IdentityError> {
        let user = user.into();
        let path = favorites_path(&data_dir, &user);

        let favorites = match fs::read(&path) {
            Ok(bytes) => {
                let file: FavoritesFile = serde_json::from_slice(&bytes)
                    .map_err(|e| IdentityError::ParseError(path, e))?;
                file.favorite_ids
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(IdentityError::IoError(path, e)),
        };

        Ok(Self {
            data_dir,
            user,
            favorites,
        })
    }

    /// Returns the path of this user's favorites file.
    pub fn path(&self) -> PathBuf {
        favorites_path(&self.data_dir, &self.user)
    }

    fn persist(&self) -> Result<(), IdentityError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| IdentityError::IoError(self.data_dir.clone(), e))?;

        let file = FavoritesFile {
            user: self.user.clone(),
            favorite_ids: self.favorites.clone(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_vec_pretty(&file).map_err(IdentityError::SerializeError)?;

        let path = self.path();
        fs::write(&path, json).map_err(|e| IdentityError::IoError(path, e))
    }
}

fn favorites_path(data_dir: &PathBuf, user: &str) -> PathBuf {
    data_dir.join(format!("favorites-{}.json", user))
}

impl IdentitySource for LocalIdentity {
    fn user_id(&self) -> Option<&str> {
        Some(&self.user)
    }

    async fn favorite_ids(&self) -> Result<BTreeSet<u32>, IdentityError> {
        Ok(self.favorites.clone())
    }

    async fn add_favorite(&mut self, id: u32) -> Result<bool, IdentityError> {
        if !self.favorites.insert(id) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.favorites.remove(&id);
            return Err(e);
        }
        Ok(true)
    }

    async fn remove_favorite(&mut self, id: u32) -> Result<bool, IdentityError> {
        if !self.favorites.remove(&id) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.favorites.insert(id);
            return Err(e);
        }
        Ok(true)
    }
}
