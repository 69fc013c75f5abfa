use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::types::{CatalogSource, ListPage, Locator, RawDetailRecord};
use reqwest::StatusCode;
use tracing::{debug, instrument};
use url::Url;

/// Thin HTTP wrapper over the remote catalog. One attempt per call; retry
/// policy belongs to the cache.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    collection_url: Url,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("catalog_cache/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, &config.api_base_url, &config.collection)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, collection: &str) -> Result<Self> {
        // A trailing slash makes `join` append instead of replacing the last segment
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let collection_url = base.join(&format!("{}/", collection.trim_matches('/')))?;
        Ok(Self { client, collection_url })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn list_url(&self, limit: usize, offset: usize) -> Url {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }

    fn detail_url(&self, locator: &Locator) -> Result<Url> {
        match locator {
            Locator::Id(id) => Ok(self.collection_url.join(&id.to_string())?),
            Locator::Url(location) => Ok(Url::parse(location)?),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!("HTTP GET request to: {}", url);
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("{} at {}", what, url)));
        }
        if !status.is_success() {
            return Err(CatalogError::RemoteUnavailable {
                status: Some(status.as_u16()),
                message: format!(
                    "Failed to fetch {}: {} {}",
                    what,
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ),
            });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::MalformedRecord(format!("{} at {}: {}", what, url, e)))
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn fetch_list_page(&self, limit: usize, offset: usize) -> Result<ListPage> {
        if limit == 0 {
            return Err(CatalogError::InvalidArgument(
                "list page limit must be greater than zero".into(),
            ));
        }
        let url = self.list_url(limit, offset);
        let page: ListPage = match self.get_json(url, "catalog list").await {
            Ok(page) => page,
            // A missing collection or an unreadable list is a batch-level failure
            Err(CatalogError::NotFound(message)) | Err(CatalogError::MalformedRecord(message)) => {
                return Err(CatalogError::RemoteUnavailable { status: None, message })
            }
            Err(e) => return Err(e),
        };
        debug!(
            "List page: {} rows, count={}, has_next={}",
            page.results.len(),
            page.count,
            page.has_next_page()
        );
        Ok(page)
    }

    #[instrument(skip(self, locator), fields(locator = %locator))]
    async fn fetch_detail(&self, locator: &Locator) -> Result<RawDetailRecord> {
        let url = self.detail_url(locator)?;
        self.get_json(url, "catalog detail").await
    }
}
