//! Catalog synchronization and favorites-reconciliation engine.
//!
//! The engine owns all mutable state (page window, search, favorites
//! view, offline mode) and folds the four external sources — remote
//! catalog, identity, local snapshot cache, connectivity — into one
//! consistent read model. Commands run to completion before the next
//! state transition is applied; there is exactly one logical owner of
//! the state, so no locking is needed.

mod state;

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::api::CatalogSource;
use crate::cache::FavoritesCache;
use crate::identity::IdentitySource;
use crate::models::CatalogEntry;

pub use state::{
    merge_favorites, EngineState, PageWindow, SearchState, SyncStatus, MAX_SEARCH_RESULTS,
    PAGE_SIZE,
};

/// Width of the per-id detail-fetch fan-out during favorites rebuild.
const REBUILD_CONCURRENCY: usize = 4;

/// Error message surfaced when a fetch is requested while offline.
const NO_CONNECTION: &str = "no connection";

/// The catalog sync engine.
///
/// Generic over the catalog and identity sources so tests can drive it
/// with in-memory fakes. Presentation consumes the read model via
/// [`EngineState::display_set`] and listens on [`subscribe`] for a
/// revision bump after every state mutation.
///
/// [`subscribe`]: CatalogSyncEngine::subscribe
pub struct CatalogSyncEngine<A, I> {
    api: A,
    identity: I,
    cache: FavoritesCache,
    state: EngineState,
    revision: watch::Sender<u64>,
}

impl<A: CatalogSource, I: IdentitySource> CatalogSyncEngine<A, I> {
    pub fn new(api: A, identity: I, cache: FavoritesCache) -> Self {
        let (revision, _rx) = watch::channel(0);
        Self {
            api,
            identity,
            cache,
            state: EngineState::default(),
            revision,
        }
    }

    /// Read access to the full engine state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The derived read model for presentation.
    pub fn display_set(&self) -> Vec<CatalogEntry> {
        self.state.display_set()
    }

    pub fn status(&self) -> &SyncStatus {
        &self.state.status
    }

    pub fn is_offline(&self) -> bool {
        self.state.offline
    }

    /// Change-notification hook: the revision counter bumps after every
    /// state mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn notify(&mut self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Startup bootstrap: records connectivity, mirrors the favorite-id
    /// set, then either loads the offline snapshot or fetches the first
    /// page and reconciles favorites against the server.
    pub async fn initialize(&mut self, online: bool) {
        self.state.offline = !online;

        match self.identity.favorite_ids().await {
            Ok(ids) => self.state.favorite_ids = ids,
            Err(e) => tracing::warn!("Failed to load favorite ids: {}", e),
        }

        if self.state.offline {
            self.state.favorites_only = true;
            self.load_offline_snapshot();
            self.notify();
        } else {
            self.fetch_first_page().await;
            self.rebuild_favorites().await;
        }
    }

    // ==================== Pagination ====================

    /// Fetches a fresh first page, replacing the current window.
    ///
    /// Offline: no network attempt; status becomes `Error` and
    /// favorites-only mode is forced on so the display never silently
    /// shows an empty non-favorites list. On a failed fetch the window
    /// stays cleared: the user asked for a fresh load, so the prior
    /// page is not preserved.
    pub async fn fetch_first_page(&mut self) {
        if self.state.offline {
            self.state.status = SyncStatus::Error(NO_CONNECTION.to_string());
            self.state.favorites_only = true;
            self.notify();
            return;
        }

        self.state.page.reset();
        self.state.status = SyncStatus::Loading;
        self.notify();

        match self.api.fetch_page(0, PAGE_SIZE).await {
            Ok(page) => {
                self.state.page.entries = page.entries;
                self.state.page.has_more = page.has_more;
                self.state.page.offset = PAGE_SIZE;
                self.state.status = SyncStatus::Idle;
            }
            Err(e) => {
                tracing::warn!("First page fetch failed: {}", e);
                self.state.status = SyncStatus::Error(e.to_string());
            }
        }
        self.notify();
    }

    /// Appends the next page to the window.
    ///
    /// Silent no-op when a load is already in flight, when the server
    /// has no more pages, or while search is active (search results are
    /// not paginated). A failed fetch returns the status to `Idle`
    /// rather than `Error`: the current list is still valid and the
    /// retry is implicit in continued scrolling.
    pub async fn load_more(&mut self) {
        if self.state.status == SyncStatus::LoadingMore
            || !self.state.page.has_more
            || self.state.search.is_active()
        {
            return;
        }

        self.state.status = SyncStatus::LoadingMore;
        self.notify();

        match self.api.fetch_page(self.state.page.offset, PAGE_SIZE).await {
            Ok(page) => {
                self.state.page.entries.extend(page.entries);
                self.state.page.offset += PAGE_SIZE;
                self.state.page.has_more = page.has_more;
            }
            Err(e) => {
                tracing::debug!("load_more failed, retry via scroll: {}", e);
            }
        }
        self.state.status = SyncStatus::Idle;
        self.notify();
    }

    // ==================== Search ====================

    /// Runs a two-stage search: an exact-match probe (query as name or
    /// id) first, then a substring scan over the memoized name index.
    ///
    /// An empty query clears the search and restores the paginated
    /// view. Status becomes `Error` only if both stages fail.
    pub async fn search(&mut self, query: &str) {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.clear_search();
            return;
        }

        self.state.search.query = query.clone();
        self.state.status = SyncStatus::Loading;
        self.notify();

        // Stage 1: exact-match probe. One round trip for the common
        // case of a full known name or id.
        match self.api.fetch_detail(&query).await {
            Ok(entry) => {
                self.state.search.results = vec![entry];
                self.state.status = SyncStatus::Idle;
                self.notify();
                return;
            }
            Err(e) => {
                if !e.is_not_found() {
                    tracing::debug!("Exact-match probe failed: {}", e);
                }
            }
        }

        // Stage 2: substring scan over the full name index.
        match self.api.fetch_name_index().await {
            Ok(index) => {
                self.state.search.results = index
                    .into_iter()
                    .filter(|entry| entry.name.to_lowercase().contains(&query))
                    .take(MAX_SEARCH_RESULTS)
                    .collect();
                self.state.status = SyncStatus::Idle;
            }
            Err(e) => {
                tracing::warn!("Search failed for '{}': {}", query, e);
                self.state.status = SyncStatus::Error(e.to_string());
            }
        }
        self.notify();
    }

    /// Unconditionally resets the search state. Idempotent.
    pub fn clear_search(&mut self) {
        self.state.search.clear();
        self.notify();
    }

    // ==================== Favorites ====================

    /// Flips the manual favorites-only display filter.
    pub fn toggle_favorites_only(&mut self) {
        self.state.favorites_only = !self.state.favorites_only;
        self.notify();
    }

    /// Adds or removes the id from the user's favorites, whichever is
    /// the opposite of its current membership.
    ///
    /// The remote mutation runs first; there is no optimistic update,
    /// so a failed write never flickers the view. Returns true on
    /// success (after a full favorites rebuild), false otherwise.
    pub async fn toggle_favorite(&mut self, id: u32) -> bool {
        if self.identity.user_id().is_none() {
            tracing::warn!("toggle_favorite({}) without identity", id);
            return false;
        }

        let current = match self.identity.favorite_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Failed to read favorite ids: {}", e);
                return false;
            }
        };

        let result = if current.contains(&id) {
            self.identity.remove_favorite(id).await
        } else {
            self.identity.add_favorite(id).await
        };

        match result {
            Ok(_) => {
                self.rebuild_favorites().await;
                true
            }
            Err(e) => {
                tracing::warn!("toggle_favorite({}) failed: {}", id, e);
                false
            }
        }
    }

    /// Rebuilds the resolved-favorites cache and persists the snapshot.
    ///
    /// Favorite ids already present in the page window are not fetched
    /// again. The remaining ids are resolved with a bounded fan-out;
    /// individual failures are skipped, so partial resolution is fine.
    /// The persisted snapshot is the union of the page window's
    /// favorite entries and the resolved cache: the last successfully
    /// resolved state, never the attempted one.
    pub async fn rebuild_favorites(&mut self) {
        let favorite_ids = match self.identity.favorite_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Favorites rebuild skipped: {}", e);
                return;
            }
        };
        self.state.favorite_ids = favorite_ids;

        // While offline the snapshot path owns `resolved`: no detail
        // fetch can succeed, and persisting the empty result would
        // overwrite the last successfully resolved snapshot with the
        // attempted state. Only the id mirror above is refreshed.
        if self.state.offline {
            self.notify();
            return;
        }

        let loaded_ids: BTreeSet<u32> = self.state.page.entries.iter().map(|e| e.id).collect();
        let unresolved: Vec<u32> = self
            .state
            .favorite_ids
            .difference(&loaded_ids)
            .copied()
            .collect();

        let resolved = {
            let api = &self.api;
            let fetches = stream::iter(unresolved)
                .map(move |id| async move { (id, api.fetch_detail(&id.to_string()).await) })
                .buffer_unordered(REBUILD_CONCURRENCY);
            futures::pin_mut!(fetches);

            // Results are folded sequentially; the fan-out only
            // overlaps the network waits.
            let mut resolved = BTreeMap::new();
            while let Some((id, result)) = fetches.next().await {
                match result {
                    Ok(entry) => {
                        resolved.insert(id, entry);
                    }
                    Err(e) => tracing::warn!("Favorite {} left unresolved: {}", id, e),
                }
            }
            resolved
        };
        self.state.resolved = resolved;

        let snapshot = merge_favorites(
            &self.state.page.entries,
            &self.state.resolved,
            &self.state.favorite_ids,
        );
        if let Err(e) = self.cache.save(&snapshot) {
            tracing::warn!("Failed to persist favorites snapshot: {}", e);
        }

        self.notify();
    }

    /// Reads the persisted snapshot straight into the resolved cache.
    /// No network calls.
    fn load_offline_snapshot(&mut self) {
        match self.cache.load() {
            Ok(entries) => {
                self.state.resolved = entries.into_iter().map(|e| (e.id, e)).collect();
            }
            Err(e) => {
                tracing::warn!("Failed to load favorites snapshot: {}", e);
                self.state.resolved.clear();
            }
        }
    }

    // ==================== Connectivity ====================

    /// Applies an online/offline transition.
    ///
    /// Going offline forces favorites-only mode on (it is never turned
    /// off automatically) and loads the snapshot. Coming back online
    /// fetches the first page if none was ever loaded, and always
    /// reconciles favorites with the server.
    pub async fn set_connectivity(&mut self, online: bool) {
        let was_online = !self.state.offline;
        if online == was_online {
            return;
        }

        if !online {
            self.state.offline = true;
            self.state.favorites_only = true;
            self.load_offline_snapshot();
            self.notify();
        } else {
            self.state.offline = false;
            self.notify();
            if self.state.page.entries.is_empty() {
                self.fetch_first_page().await;
            }
            self.rebuild_favorites().await;
        }
    }
}
