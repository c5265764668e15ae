//! Wire types for the catalog REST API.

use serde::Deserialize;

use crate::models::{CatalogEntry, EntryIdError};

/// One page of the paginated listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PageResponse {
    /// Total number of entries in the catalog.
    pub count: u32,
    /// URL of the next page, absent on the last page.
    pub next: Option<String>,
    pub results: Vec<ListingResource>,
}

/// A `{name, url}` record from the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListingResource {
    pub name: String,
    pub url: String,
}

impl ListingResource {
    pub fn into_entry(self) -> Result<CatalogEntry, EntryIdError> {
        CatalogEntry::from_listing(self.name, &self.url)
    }
}

/// Full detail record for a single entry.
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

/// A type tag with its display position.
#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedRef,
}

#[derive(Debug, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

impl DetailResponse {
    /// Converts the detail record into a `CatalogEntry` with type tags
    /// ordered by slot.
    pub fn into_entry(self) -> CatalogEntry {
        let mut slots = self.types;
        slots.sort_by_key(|s| s.slot);
        let types = slots.into_iter().map(|s| s.kind.name).collect();
        CatalogEntry::new(self.id, self.name).with_types(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_parse() {
        let json = r#"{
            "count": 1302,
            "next": "https://pokeapi.co/api/v2/pokemon?offset=20&limit=20",
            "previous": null,
            "results": [
                {"name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/"},
                {"name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/"}
            ]
        }"#;

        let page: PageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, 1302);
        assert!(page.next.is_some());
        assert_eq!(page.results.len(), 2);

        let entry = page.results.into_iter().next().unwrap().into_entry().unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.name, "bulbasaur");
    }

    #[test]
    fn test_detail_response_types_ordered_by_slot() {
        let json = r#"{
            "id": 6,
            "name": "charizard",
            "types": [
                {"slot": 2, "type": {"name": "flying", "url": "https://pokeapi.co/api/v2/type/3/"}},
                {"slot": 1, "type": {"name": "fire", "url": "https://pokeapi.co/api/v2/type/10/"}}
            ]
        }"#;

        let detail: DetailResponse = serde_json::from_str(json).unwrap();
        let entry = detail.into_entry();
        assert_eq!(entry.id, 6);
        assert_eq!(entry.types, vec!["fire".to_string(), "flying".to_string()]);
    }

    #[test]
    fn test_detail_response_no_types() {
        let json = r#"{"id": 132, "name": "ditto"}"#;
        let detail: DetailResponse = serde_json::from_str(json).unwrap();
        let entry = detail.into_entry();
        assert!(entry.types.is_empty());
    }
}
