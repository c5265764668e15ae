//! Shared value types for the catalog.

mod entry;

pub use entry::{parse_id_from_url, CatalogEntry, EntryIdError};
