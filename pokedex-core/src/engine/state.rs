//! Explicit engine state and the pure display-set merge.
//!
//! All mutable state owned by the sync engine lives in `EngineState`;
//! the engine's command methods are the only writers. The outward read
//! model (`display_set`) is computed on demand, never stored.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::CatalogEntry;

/// Number of entries requested per listing page.
pub const PAGE_SIZE: u32 = 20;

/// Maximum number of search results kept.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Engine loading/error status.
///
/// Orthogonal to the `offline` flag: the engine can be offline and
/// idle at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Loading,
    LoadingMore,
    Error(String),
}

impl SyncStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }
}

/// Pagination cursor state for the catalog listing.
///
/// `offset` always equals the count of entries fetched via paging;
/// entries injected by favorites reconciliation never count.
#[derive(Debug, Clone, Default)]
pub struct PageWindow {
    pub offset: u32,
    pub has_more: bool,
    pub entries: Vec<CatalogEntry>,
}

impl PageWindow {
    /// Resets the window for a fresh top-level fetch.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.has_more = false;
        self.entries.clear();
    }
}

/// Query-based search state.
///
/// Search is active iff the (trimmed) query is non-empty; an inactive
/// search always has empty results.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<CatalogEntry>,
}

impl SearchState {
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
    }
}

/// All mutable state owned by the sync engine.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub status: SyncStatus,
    pub offline: bool,
    pub favorites_only: bool,
    pub page: PageWindow,
    pub search: SearchState,
    /// The user's favorite ids, mirrored from the identity source.
    pub favorite_ids: BTreeSet<u32>,
    /// Favorite entries not present in the page window, resolved by
    /// individual detail fetches (or the offline snapshot).
    pub resolved: BTreeMap<u32, CatalogEntry>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Idle,
            offline: false,
            favorites_only: false,
            page: PageWindow::default(),
            search: SearchState::default(),
            favorite_ids: BTreeSet::new(),
            resolved: BTreeMap::new(),
        }
    }
}

impl EngineState {
    /// The single derived read model exposed to presentation.
    ///
    /// Search results win over everything; otherwise favorites-only
    /// mode shows the deduplicated favorites merge; otherwise the page
    /// window is authoritative.
    pub fn display_set(&self) -> Vec<CatalogEntry> {
        if self.search.is_active() {
            return self.search.results.clone();
        }
        if self.favorites_only {
            return merge_favorites(&self.page.entries, &self.resolved, &self.favorite_ids);
        }
        self.page.entries.clone()
    }
}

/// Merges loaded entries and the resolved cache into the favorites
/// view: at most one entry per id, page-window entries first and
/// authoritative, catalog order preserved within each source.
pub fn merge_favorites(
    loaded: &[CatalogEntry],
    resolved: &BTreeMap<u32, CatalogEntry>,
    favorite_ids: &BTreeSet<u32>,
) -> Vec<CatalogEntry> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    for entry in loaded {
        if favorite_ids.contains(&entry.id) && seen.insert(entry.id) {
            out.push(entry.clone());
        }
    }
    for (id, entry) in resolved {
        if favorite_ids.contains(id) && seen.insert(*id) {
            out.push(entry.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, name: &str) -> CatalogEntry {
        CatalogEntry::new(id, name)
    }

    // ==================== Merge Tests ====================

    #[test]
    fn test_merge_empty_favorites_is_empty() {
        let loaded = vec![entry(1, "bulbasaur"), entry(2, "ivysaur")];
        let merged = merge_favorites(&loaded, &BTreeMap::new(), &BTreeSet::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_loaded_entries_win_over_resolved() {
        let loaded = vec![entry(1, "bulbasaur"), entry(2, "ivysaur"), entry(25, "pikachu")];
        let resolved = BTreeMap::from([
            (1, entry(1, "stale-name")),
            (25, entry(25, "also-stale")),
        ]);
        let favorites = BTreeSet::from([1, 25]);

        let merged = merge_favorites(&loaded, &resolved, &favorites);

        let ids: Vec<u32> = merged.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 25]);
        // Page-window entries take precedence over the resolved cache.
        assert_eq!(merged[0].name, "bulbasaur");
        assert_eq!(merged[1].name, "pikachu");
    }

    #[test]
    fn test_merge_resolved_fills_unloaded_favorites() {
        let loaded = vec![entry(1, "bulbasaur")];
        let resolved = BTreeMap::from([(150, entry(150, "mewtwo"))]);
        let favorites = BTreeSet::from([1, 150]);

        let merged = merge_favorites(&loaded, &resolved, &favorites);
        let ids: Vec<u32> = merged.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 150]);
    }

    #[test]
    fn test_merge_ignores_non_favorite_resolved_entries() {
        let resolved = BTreeMap::from([(7, entry(7, "squirtle"))]);
        let favorites = BTreeSet::from([25]);

        let merged = merge_favorites(&[], &resolved, &favorites);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_never_duplicates_ids() {
        let loaded = vec![entry(25, "pikachu"), entry(25, "pikachu")];
        let resolved = BTreeMap::from([(25, entry(25, "pikachu"))]);
        let favorites = BTreeSet::from([25]);

        let merged = merge_favorites(&loaded, &resolved, &favorites);
        assert_eq!(merged.len(), 1);
    }

    // ==================== Display Set Tests ====================

    #[test]
    fn test_display_set_defaults_to_page_window() {
        let mut state = EngineState::default();
        state.page.entries = vec![entry(1, "bulbasaur"), entry(2, "ivysaur")];

        assert_eq!(state.display_set(), state.page.entries);
    }

    #[test]
    fn test_display_set_search_wins() {
        let mut state = EngineState::default();
        state.page.entries = vec![entry(1, "bulbasaur")];
        state.favorites_only = true;
        state.favorite_ids = BTreeSet::from([1]);
        state.search.query = "pika".to_string();
        state.search.results = vec![entry(25, "pikachu")];

        let display = state.display_set();
        assert_eq!(display.len(), 1);
        assert_eq!(display[0].id, 25);
    }

    #[test]
    fn test_display_set_favorites_only() {
        let mut state = EngineState::default();
        state.favorites_only = true;
        state.page.entries = vec![entry(1, "bulbasaur"), entry(2, "ivysaur"), entry(25, "pikachu")];
        state.favorite_ids = BTreeSet::from([1, 25]);
        state.resolved = BTreeMap::from([(1, entry(1, "junk"))]);

        let ids: Vec<u32> = state.display_set().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 25]);
    }

    #[test]
    fn test_display_set_no_duplicate_ids_in_any_mode() {
        let mut state = EngineState::default();
        state.page.entries = vec![entry(1, "bulbasaur"), entry(25, "pikachu")];
        state.favorite_ids = BTreeSet::from([1, 25, 150]);
        state.resolved = BTreeMap::from([
            (1, entry(1, "bulbasaur")),
            (25, entry(25, "pikachu")),
            (150, entry(150, "mewtwo")),
        ]);

        for favorites_only in [false, true] {
            for offline in [false, true] {
                state.favorites_only = favorites_only;
                state.offline = offline;

                let display = state.display_set();
                let mut ids: Vec<u32> = display.iter().map(|e| e.id).collect();
                ids.sort_unstable();
                ids.dedup();
                assert_eq!(ids.len(), display.len());
            }
        }
    }

    // ==================== State Invariant Tests ====================

    #[test]
    fn test_page_window_reset() {
        let mut window = PageWindow {
            offset: 40,
            has_more: true,
            entries: vec![entry(1, "bulbasaur")],
        };
        window.reset();
        assert_eq!(window.offset, 0);
        assert!(!window.has_more);
        assert!(window.entries.is_empty());
    }

    #[test]
    fn test_search_state_inactive_when_query_empty() {
        let mut search = SearchState::default();
        assert!(!search.is_active());

        search.query = "pika".to_string();
        assert!(search.is_active());

        search.clear();
        assert!(!search.is_active());
        assert!(search.results.is_empty());
    }
}
