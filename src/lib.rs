pub mod apis;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod logging;
pub mod transform;
pub mod types;
pub mod view;

pub use cache::{CacheSettings, CacheSnapshot, CatalogCache, LoadOutcome};
pub use error::{CatalogError, ErrorKind, Result};
pub use types::{CatalogSource, Entity, ListEntry, ListPage, Locator};
