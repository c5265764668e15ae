//! Remote catalog access: REST client and wire types.

mod client;
mod types;

pub use client::{ApiError, CatalogClient, CatalogPage, CatalogSource};
pub use types::{DetailResponse, ListingResource, NamedRef, PageResponse, TypeSlot};
