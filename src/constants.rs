/// Defaults shared by configuration, the acquisition cache and the views.
/// The PokeAPI layout is the reference catalog these defaults are tuned for.
pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_COLLECTION: &str = "pokemon";

/// Env var naming the catalog API base URL
pub const API_BASE_URL_ENV: &str = "CATALOG_API_BASE_URL";
pub const BATCH_SIZE_ENV: &str = "CATALOG_BATCH_SIZE";
pub const PAGE_SIZE_ENV: &str = "CATALOG_PAGE_SIZE";

pub const DEFAULT_CONFIG_PATH: &str = "catalog.toml";

pub const DEFAULT_BATCH_SIZE: usize = 20;
// Remaining unconsumed items at which the next batch is requested
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 5;
// PokeAPI lists roughly this many entries
pub const DEFAULT_MAX_ENTITIES: usize = 1010;
pub const DEFAULT_PAGE_SIZE: usize = 16;
pub const DEFAULT_PRELOAD: usize = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_DETAIL_FAILURE_TOLERANCE: f64 = 0.5;

pub const METRIC_MULTIPLIER: f64 = 1.5;
pub const METRIC_CEILING: u32 = 1000;

/// Last-resort artwork location, keyed by entity id
pub const DEFAULT_ARTWORK_URL_PREFIX: &str = concat!(
    "https://raw.githubusercontent.com/PokeAPI/sprites/master",
    "/sprites/pokemon/other/official-artwork"
);

// Filter-state keys (the reference store is the address-bar query string)
pub const SEARCH_KEY: &str = "search";
pub const SORT_KEY_KEY: &str = "sortBy";
pub const SORT_ORDER_KEY: &str = "sortOrder";
pub const PAGE_KEY: &str = "page";

/// Build the computed default image URL for an entity id
pub fn default_artwork_url(id: u32) -> String {
    format!("{}/{}.png", DEFAULT_ARTWORK_URL_PREFIX, id)
}
