//! Persisted browse state (search term, sort, page) behind a swappable
//! string key-value store.

use super::{Criteria, SortDirection, SortKey};
use crate::constants::{PAGE_KEY, SEARCH_KEY, SORT_KEY_KEY, SORT_ORDER_KEY};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use url::form_urlencoded;

pub trait FilterStore {
    fn read(&self, key: &str) -> Option<String>;

    /// `None` removes the key
    fn write(&mut self, key: &str, value: Option<&str>);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFilterStore {
    values: HashMap<String, String>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterStore for MemoryFilterStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.values.insert(key.to_string(), value.to_string());
            }
            None => {
                self.values.remove(key);
            }
        }
    }
}

/// Query-string medium, e.g. `search=pika&sortBy=metric&page=2`
#[derive(Debug, Clone, Default)]
pub struct QueryStringStore {
    pairs: BTreeMap<String, String>,
}

impl QueryStringStore {
    pub fn parse(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl FilterStore for QueryStringStore {
    fn read(&self, key: &str) -> Option<String> {
        self.pairs.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.pairs.insert(key.to_string(), value.to_string());
            }
            None => {
                self.pairs.remove(key);
            }
        }
    }
}

/// Reads and writes browse state through a [`FilterStore`]. Default values
/// are never written: setting a default removes its key.
#[derive(Debug)]
pub struct FilterState<S: FilterStore> {
    store: S,
}

impl<S: FilterStore> FilterState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn search(&self) -> String {
        self.store.read(SEARCH_KEY).unwrap_or_default()
    }

    /// Unknown stored values fall back to the default
    pub fn sort_key(&self) -> SortKey {
        self.store
            .read(SORT_KEY_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.store
            .read(SORT_ORDER_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// 1-based; missing or unparseable values mean page 1
    pub fn page(&self) -> usize {
        self.store
            .read(PAGE_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    pub fn criteria(&self) -> Criteria {
        Criteria::new(self.search(), self.sort_key(), self.sort_direction())
    }

    pub fn set_search(&mut self, search: &str) {
        let value = Some(search).filter(|s| !s.is_empty());
        self.store.write(SEARCH_KEY, value);
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        let value = Some(sort_key.as_str()).filter(|_| sort_key != SortKey::default());
        self.store.write(SORT_KEY_KEY, value);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        let value = Some(direction.as_str()).filter(|_| direction != SortDirection::default());
        self.store.write(SORT_ORDER_KEY, value);
    }

    pub fn set_sort(&mut self, sort_key: SortKey, direction: SortDirection) {
        self.set_sort_key(sort_key);
        self.set_sort_direction(direction);
    }

    pub fn go_to_page(&mut self, page: usize) {
        if page <= 1 {
            self.store.write(PAGE_KEY, None);
        } else {
            let page = page.to_string();
            self.store.write(PAGE_KEY, Some(page.as_str()));
        }
    }

    pub fn clear(&mut self) {
        debug!("Clearing browse filters");
        for key in [SEARCH_KEY, SORT_KEY_KEY, SORT_ORDER_KEY, PAGE_KEY] {
            self.store.write(key, None);
        }
    }
}
