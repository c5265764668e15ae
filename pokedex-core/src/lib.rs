//! Pokedex Core Library
//!
//! Catalog synchronization and favorites reconciliation for Pokedex
//! applications: the sync engine, the remote catalog client, the local
//! favorites snapshot, identity, and connectivity.

pub mod api;
pub mod cache;
pub mod connectivity;
pub mod engine;
pub mod identity;
pub mod models;

pub use api::{ApiError, CatalogClient, CatalogPage, CatalogSource};
pub use cache::{CacheError, FavoritesCache};
pub use connectivity::ConnectivityMonitor;
pub use engine::{
    merge_favorites, CatalogSyncEngine, EngineState, PageWindow, SearchState, SyncStatus,
    MAX_SEARCH_RESULTS, PAGE_SIZE,
};
pub use identity::{IdentityError, IdentitySource, LocalIdentity};
pub use models::{parse_id_from_url, CatalogEntry, EntryIdError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
