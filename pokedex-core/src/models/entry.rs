use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when deriving an entry id from a listing URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryIdError {
    #[error("listing url '{0}' has no numeric trailing segment")]
    MissingId(String),
    #[error("entry id derived from '{0}' must be positive")]
    ZeroId(String),
}

/// A lightweight catalog listing record.
///
/// Entries with the same `id` refer to the same entity regardless of
/// which list they came from. `types` may be empty until the entry's
/// detail has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl CatalogEntry {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self
    }

    /// Builds an entry from a listing record's name and canonical URL.
    ///
    /// The id is the URL's trailing path segment, e.g.
    /// `https://pokeapi.co/api/v2/pokemon/25/` yields id 25.
    pub fn from_listing(name: impl Into<String>, url: &str) -> Result<Self, EntryIdError> {
        let id = parse_id_from_url(url)?;
        Ok(Self::new(id, name))
    }
}

/// Parses the numeric trailing path segment of a canonical listing URL.
pub fn parse_id_from_url(url: &str) -> Result<u32, EntryIdError> {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed
        .rsplit('/')
        .next()
        .ok_or_else(|| EntryIdError::MissingId(url.to_string()))?;

    let id: u32 = segment
        .parse()
        .map_err(|_| EntryIdError::MissingId(url.to_string()))?;

    if id == 0 {
        return Err(EntryIdError::ZeroId(url.to_string()));
    }

    Ok(id)
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:03} {}", self.id, self.name)?;
        if !self.types.is_empty() {
            write!(f, " ({})", self.types.join(", "))?;
        }
        Ok(())
    }
}
