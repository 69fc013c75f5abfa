//! Image fallback over an entity's ordered candidate list.
//!
//! Each candidate is probed in turn; a probe that does not answer within the
//! configured wait counts as a failure, exactly like an error response.

use crate::error::{CatalogError, Result};
use std::time::Duration;
use tracing::debug;

#[async_trait::async_trait]
pub trait ImageProbe: Send + Sync {
    /// Ok when the image at `url` can be loaded
    async fn probe(&self, url: &str) -> Result<()>;
}

/// Probes with an HTTP HEAD request
pub struct HttpImageProbe {
    client: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait::async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> Result<()> {
        let resp = self.client.head(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(CatalogError::NotFound(url.to_string()))
        } else {
            Err(CatalogError::RemoteUnavailable {
                status: Some(status.as_u16()),
                message: format!("image probe failed for {}", url),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loaded(String),
    Unavailable,
}

pub struct ImageResolver<P: ImageProbe> {
    probe: P,
    wait: Duration,
}

impl<P: ImageProbe> ImageResolver<P> {
    pub fn new(probe: P, wait: Duration) -> Self {
        Self { probe, wait }
    }

    /// First candidate that loads within the wait, else `Unavailable`
    pub async fn resolve(&self, candidates: &[String]) -> ImageState {
        for url in candidates {
            match tokio::time::timeout(self.wait, self.probe.probe(url)).await {
                Ok(Ok(())) => return ImageState::Loaded(url.clone()),
                Ok(Err(e)) => debug!("Image candidate {} failed: {}", url, e),
                Err(_) => debug!("Image candidate {} timed out after {:?}", url, self.wait),
            }
        }
        ImageState::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// url -> (delay, succeeds)
    struct ScriptedProbe {
        script: HashMap<String, (Duration, bool)>,
    }

    #[async_trait::async_trait]
    impl ImageProbe for ScriptedProbe {
        async fn probe(&self, url: &str) -> Result<()> {
            let (delay, ok) = self.script.get(url).copied().unwrap_or((Duration::ZERO, false));
            tokio::time::sleep(delay).await;
            if ok {
                Ok(())
            } else {
                Err(CatalogError::NotFound(url.to_string()))
            }
        }
    }

    fn probe(entries: &[(&str, u64, bool)]) -> ScriptedProbe {
        ScriptedProbe {
            script: entries
                .iter()
                .map(|(url, ms, ok)| (url.to_string(), (Duration::from_millis(*ms), *ok)))
                .collect(),
        }
    }

    fn candidates(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_loading_candidate_wins() {
        let resolver = ImageResolver::new(
            probe(&[("artwork", 0, false), ("home", 0, true), ("sprite", 0, true)]),
            Duration::from_millis(100),
        );
        let state = resolver.resolve(&candidates(&["artwork", "home", "sprite"])).await;
        assert_eq!(state, ImageState::Loaded("home".to_string()));
    }

    #[tokio::test]
    async fn test_slow_candidate_degrades_like_a_failure() {
        let resolver = ImageResolver::new(
            probe(&[("artwork", 10_000, true), ("sprite", 5, true)]),
            Duration::from_millis(100),
        );
        let state = resolver.resolve(&candidates(&["artwork", "sprite"])).await;
        assert_eq!(state, ImageState::Loaded("sprite".to_string()));
    }

    #[tokio::test]
    async fn test_all_candidates_failing_is_unavailable() {
        let resolver = ImageResolver::new(
            probe(&[("artwork", 0, false), ("default", 10_000, true)]),
            Duration::from_millis(100),
        );
        assert_eq!(
            resolver.resolve(&candidates(&["artwork", "default"])).await,
            ImageState::Unavailable
        );
        assert_eq!(resolver.resolve(&[]).await, ImageState::Unavailable);
    }
}
