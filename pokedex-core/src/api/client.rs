//! HTTP client for the paginated catalog API.
//!
//! The client is a pure network adapter: it fetches listing pages,
//! per-entry detail, and the full name index. The only state it keeps
//! is a one-time memoization of the name index, which is large and
//! never changes within a process lifetime.

use reqwest::StatusCode;
use tokio::sync::OnceCell;

use super::types::{DetailResponse, PageResponse};
use crate::models::CatalogEntry;

/// Errors that can occur during catalog API operations.
#[derive(Debug)]
pub enum ApiError {
    /// Transport-level failure (connection, timeout, TLS).
    HttpError(String),
    /// Server answered with a non-success status.
    StatusError(u16, String),
    /// The requested entry does not exist.
    NotFound(String),
    /// Response body could not be decoded.
    DecodeError(String),
}

impl ApiError {
    /// True for an exact-lookup miss, which callers treat as a routing
    /// signal rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::HttpError(e) => write!(f, "HTTP error: {}", e),
            ApiError::StatusError(status, url) => {
                write!(f, "Server returned status {} for {}", status, url)
            }
            ApiError::NotFound(query) => write!(f, "No catalog entry for '{}'", query),
            ApiError::DecodeError(e) => write!(f, "Failed to decode response: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// One fetched page of catalog entries.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    /// Total number of entries in the catalog.
    pub total_count: u32,
    /// Whether the server has more pages after this one.
    pub has_more: bool,
}

/// Read access to the remote catalog.
///
/// The sync engine consumes this trait so tests can drive it with an
/// in-memory catalog instead of the network.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    /// Fetches one page of the listing.
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<CatalogPage, ApiError>;

    /// Fetches one entry's full detail by numeric id or exact name.
    async fn fetch_detail(&self, id_or_name: &str) -> Result<CatalogEntry, ApiError>;

    /// Fetches the full name index, memoized for the source's lifetime.
    async fn fetch_name_index(&self) -> Result<Vec<CatalogEntry>, ApiError>;
}

/// Listing page size requested when building the full name index.
const NAME_INDEX_LIMIT: u32 = 20000;

/// Catalog API client backed by reqwest.
#[derive(Debug)]
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
    name_index: OnceCell<Vec<CatalogEntry>>,
}

impl CatalogClient {
    /// Creates a client for the given API base URL, e.g.
    /// `https://pokeapi.co/api/v2`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
            name_index: OnceCell::new(),
        }
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn page_url(&self, offset: u32, limit: u32) -> String {
        format!(
            "{}/pokemon?offset={}&limit={}",
            self.base_url, offset, limit
        )
    }

    fn detail_url(&self, id_or_name: &str) -> String {
        format!(
            "{}/pokemon/{}",
            self.base_url,
            urlencoding::encode(id_or_name)
        )
    }

    async fn get_page(&self, offset: u32, limit: u32) -> Result<CatalogPage, ApiError> {
        let url = self.page_url(offset, limit);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::StatusError(response.status().as_u16(), url));
        }

        let page: PageResponse = response
            .json()
            .await
            .map_err(|e| ApiError::DecodeError(e.to_string()))?;

        let has_more = page.next.is_some();
        let total_count = page.count;

        // Listing records without a parsable id are server nonsense;
        // skip them rather than failing the whole page.
        let mut entries = Vec::with_capacity(page.results.len());
        for resource in page.results {
            match resource.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping malformed listing record: {}", e),
            }
        }

        Ok(CatalogPage {
            entries,
            total_count,
            has_more,
        })
    }
}

impl CatalogSource for CatalogClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<CatalogPage, ApiError> {
        self.get_page(offset, limit).await
    }

    async fn fetch_detail(&self, id_or_name: &str) -> Result<CatalogEntry, ApiError> {
        let query = id_or_name.trim().to_lowercase();
        let url = self.detail_url(&query);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::HttpError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(query));
        }
        if !response.status().is_success() {
            return Err(ApiError::StatusError(response.status().as_u16(), url));
        }

        let detail: DetailResponse = response
            .json()
            .await
            .map_err(|e| ApiError::DecodeError(e.to_string()))?;

        if detail.id == 0 {
            return Err(ApiError::DecodeError(format!(
                "entry '{}' has id 0",
                detail.name
            )));
        }

        Ok(detail.into_entry())
    }

    async fn fetch_name_index(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        let index = self
            .name_index
            .get_or_try_init(|| async {
                let page = self.get_page(0, NAME_INDEX_LIMIT).await?;
                tracing::debug!("Name index fetched: {} entries", page.entries.len());
                Ok::<_, ApiError>(page.entries)
            })
            .await?;

        Ok(index.clone())
    }
}
