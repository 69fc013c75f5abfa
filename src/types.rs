use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw detail record as returned from the remote catalog
pub type RawDetailRecord = serde_json::Value;

/// One row of a list page: a name plus where to fetch its detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    pub url: String,
}

/// Body of `GET /{collection}?limit=&offset=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage {
    pub count: usize,
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<ListEntry>,
}

impl ListPage {
    pub fn has_next_page(&self) -> bool {
        self.next.is_some()
    }
}

/// Identifies a detail record: a numeric id or a location handed out by a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(u32),
    Url(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Url(url) => f.write_str(url),
        }
    }
}

impl From<&ListEntry> for Locator {
    fn from(entry: &ListEntry) -> Self {
        Locator::Url(entry.url.clone())
    }
}

/// The display record the cache stores and the views project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub name: String,
    /// Ordered image candidates: artwork, canonical, sprite, computed default
    pub image_refs: Vec<String>,
    /// First tag is the primary category
    pub categories: Vec<String>,
    pub metric: u32,
}

impl Entity {
    pub fn primary_category(&self) -> &str {
        self.categories.first().map(String::as_str).unwrap_or_default()
    }
}

/// Remote side of the catalog: list pages plus per-item detail records
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// `limit` must be non-zero
    async fn fetch_list_page(&self, limit: usize, offset: usize) -> Result<ListPage>;

    async fn fetch_detail(&self, locator: &Locator) -> Result<RawDetailRecord>;
}
