//! Local persistence for the favorites snapshot.

mod store;

pub use store::{CacheError, FavoritesCache};
