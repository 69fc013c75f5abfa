use crate::constants::*;
use crate::error::{CatalogError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Tunables for the catalog client, acquisition cache and views.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base_url: String,
    pub collection: String,
    pub batch_size: usize,
    pub prefetch_threshold: usize,
    pub max_entities: usize,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub image_timeout_ms: u64,
    pub detail_failure_tolerance: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            max_entities: DEFAULT_MAX_ENTITIES,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            image_timeout_ms: DEFAULT_IMAGE_TIMEOUT_MS,
            detail_failure_tolerance: DEFAULT_DETAIL_FAILURE_TOLERANCE,
        }
    }
}

impl CatalogConfig {
    /// Load `catalog.toml` from the working directory, then apply env overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// A missing file yields defaults; an unreadable or invalid one is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let config_content = fs::read_to_string(path).map_err(|e| {
                let path = path.display();
                CatalogError::Config(format!("Failed to read config file '{}': {}", path, e))
            })?;
            toml::from_str(&config_content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            CatalogConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var(API_BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.api_base_url = base_url;
            }
        }
        if let Some(batch_size) = parse_env_usize(BATCH_SIZE_ENV)? {
            self.batch_size = batch_size;
        }
        if let Some(page_size) = parse_env_usize(PAGE_SIZE_ENV)? {
            self.page_size = page_size;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CatalogError::InvalidArgument(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(CatalogError::InvalidArgument("page_size must be greater than zero".into()));
        }
        if !(0.0..=1.0).contains(&self.detail_failure_tolerance) {
            return Err(CatalogError::InvalidArgument(format!(
                "detail_failure_tolerance must be within [0, 1], got {}",
                self.detail_failure_tolerance
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}

fn parse_env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| CatalogError::Config(format!("{} must be an integer: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.page_size, 16);
        assert_eq!(config.prefetch_threshold, 5);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.collection, "pokemon");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "prefetch_threshold = 3\nmax_entities = 151").unwrap();

        let config = CatalogConfig::load_from(&path).unwrap();
        assert_eq!(config.prefetch_threshold, 3);
        assert_eq!(config.max_entities, 151);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let config = CatalogConfig { page_size: 0, ..CatalogConfig::default() };
        assert!(matches!(config.validate(), Err(CatalogError::InvalidArgument(_))));
    }

    #[test]
    fn test_tolerance_out_of_range_is_rejected() {
        let config = CatalogConfig { detail_failure_tolerance: 1.5, ..CatalogConfig::default() };
        assert!(config.validate().is_err());
    }
}
