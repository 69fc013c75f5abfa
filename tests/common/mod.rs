#![allow(dead_code)]

use catalog_cache::error::{CatalogError, Result};
use catalog_cache::types::{CatalogSource, ListEntry, ListPage, Locator, RawDetailRecord};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory stand-in for the remote catalog, ids `1..=total` in list order
#[derive(Default)]
pub struct FakeSource {
    pub total: usize,
    /// Detail lookups answering NotFound
    pub missing: HashSet<u32>,
    /// Detail records lacking their category tags
    pub malformed: HashSet<u32>,
    /// Detail lookups answering 503
    pub unavailable: HashSet<u32>,
    /// Detail lookups answering 503 once, then succeeding
    pub flaky: Mutex<HashSet<u32>>,
    /// Every list page starts at offset 0, as if the remote ignored the offset
    pub frozen: bool,
    pub list_delay: Duration,
    /// Later ids answer sooner, so completion order is the reverse of list order
    pub reverse_detail_timing: bool,
    pub list_failures: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn with_missing(mut self, ids: &[u32]) -> Self {
        self.missing.extend(ids);
        self
    }

    pub fn with_malformed(mut self, ids: &[u32]) -> Self {
        self.malformed.extend(ids);
        self
    }

    pub fn with_unavailable(mut self, ids: &[u32]) -> Self {
        self.unavailable.extend(ids);
        self
    }

    pub fn with_flaky(self, ids: &[u32]) -> Self {
        self.flaky.lock().unwrap().extend(ids);
        self
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_reverse_detail_timing(mut self) -> Self {
        self.reverse_detail_timing = true;
        self
    }

    /// The next `n` list calls fail with 503
    pub fn fail_next_list_calls(&self, n: usize) {
        self.list_failures.store(n, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

pub fn record(id: u32) -> Value {
    let category = if id % 2 == 0 { "water" } else { "fire" };
    json!({
        "id": id,
        "name": format!("mon-{}", id),
        "sprites": {
            "front_default": format!("https://img.example/sprite/{}.png", id),
            "other": {
                "official-artwork": { "front_default": null },
                "home": { "front_default": null }
            }
        },
        "types": [{ "slot": 1, "type": { "name": category } }],
        "stats": [{ "base_stat": id, "stat": { "name": "hp" } }]
    })
}

fn unavailable(what: &str) -> CatalogError {
    CatalogError::RemoteUnavailable {
        status: Some(503),
        message: format!("{} unavailable", what),
    }
}

#[async_trait::async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_list_page(&self, limit: usize, offset: usize) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        let pending = self.list_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.list_failures.store(pending - 1, Ordering::SeqCst);
            return Err(unavailable("list"));
        }
        if limit == 0 {
            return Err(CatalogError::InvalidArgument("limit".into()));
        }

        let start = if self.frozen { 0 } else { offset.min(self.total) };
        let end = (start + limit).min(self.total);
        let results = (start..end)
            .map(|index| {
                let id = index + 1;
                ListEntry {
                    name: format!("mon-{}", id),
                    url: format!("fake://catalog/{}/", id),
                }
            })
            .collect();
        let next = (end < self.total)
            .then(|| format!("fake://catalog/?offset={}&limit={}", end, limit));
        Ok(ListPage {
            count: self.total,
            next,
            previous: None,
            results,
        })
    }

    async fn fetch_detail(&self, locator: &Locator) -> Result<RawDetailRecord> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let id = match locator {
            Locator::Id(id) => *id,
            Locator::Url(url) => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .and_then(|segment| segment.parse().ok())
                .ok_or_else(|| CatalogError::InvalidArgument(url.clone()))?,
        };
        if self.reverse_detail_timing {
            let wait = (self.total as u64 + 1).saturating_sub(id as u64) * 2;
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        if self.unavailable.contains(&id) || self.flaky.lock().unwrap().remove(&id) {
            return Err(unavailable("detail"));
        }
        if self.missing.contains(&id) || id == 0 || id as usize > self.total {
            return Err(CatalogError::NotFound(format!("#{}", id)));
        }
        let mut raw = record(id);
        if self.malformed.contains(&id) {
            if let Some(object) = raw.as_object_mut() {
                object.remove("types");
            }
        }
        Ok(raw)
    }
}
